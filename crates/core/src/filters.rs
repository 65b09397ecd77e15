//! Search and filter predicates behind every list view.
//!
//! Search terms match case-insensitively as substrings; enum filters left
//! as `None` (or given as "all") do not constrain the result.

use crate::types::{
    Account, AccountStatus, AccountType, Customer, FinancialRecord, PaymentStatus, Platform,
    RecordType, RenewalStatus, UnknownVariant,
};
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Parse an optional query value where "all" (or empty) means no filter.
pub fn parse_choice<T: FromStr<Err = UnknownVariant>>(
    value: Option<&str>,
) -> Result<Option<T>, UnknownVariant> {
    match value.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(v) => v.parse().map(Some),
    }
}

/// True when `term` is blank or occurs in any of the given fields.
pub fn matches_search<'a, I>(term: Option<&str>, fields: I) -> bool
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let term = match term.map(str::trim) {
        None | Some("") => return true,
        Some(t) => t.to_lowercase(),
    };
    fields
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term))
}

#[derive(Debug, Clone, Default)]
pub struct PlatformFilter {
    pub search: Option<String>,
    pub active_only: bool,
}

impl PlatformFilter {
    pub fn matches(&self, platform: &Platform) -> bool {
        matches_search(
            self.search.as_deref(),
            [
                Some(platform.name.as_str()),
                platform.description.as_deref(),
                platform.category.as_deref(),
            ],
        ) && (!self.active_only || platform.is_active)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub search: Option<String>,
    pub status: Option<AccountStatus>,
    pub account_type: Option<AccountType>,
}

impl AccountFilter {
    pub fn matches(&self, account: &Account, platform: Option<&Platform>) -> bool {
        matches_search(
            self.search.as_deref(),
            [Some(account.email.as_str()), platform.map(|p| p.name.as_str())],
        ) && self.status.map_or(true, |s| account.status == s)
            && self.account_type.map_or(true, |t| account.account_type == t)
    }
}

/// Filter for the customer list of a single account.
#[derive(Debug, Clone, Default)]
pub struct AccountCustomerFilter {
    pub search: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub renewal_status: Option<RenewalStatus>,
}

impl AccountCustomerFilter {
    pub fn matches(&self, customer: &Customer) -> bool {
        matches_search(
            self.search.as_deref(),
            [
                Some(customer.customer_name.as_str()),
                customer.customer_email.as_deref(),
                customer.customer_phone.as_deref(),
            ],
        ) && self.payment_status.map_or(true, |s| customer.payment_status == s)
            && self.renewal_status.map_or(true, |s| customer.renewal_status == s)
    }
}

/// Filter for the customer list spanning all of an owner's accounts.
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub search: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub platform_id: Option<Uuid>,
}

impl CustomerFilter {
    pub fn matches(&self, customer: &Customer, account: &Account, platform: Option<&Platform>) -> bool {
        matches_search(
            self.search.as_deref(),
            [
                Some(customer.customer_name.as_str()),
                customer.customer_email.as_deref(),
                Some(account.email.as_str()),
                platform.map(|p| p.name.as_str()),
            ],
        ) && self.payment_status.map_or(true, |s| customer.payment_status == s)
            && self.platform_id.map_or(true, |id| platform.map(|p| p.id) == Some(id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub search: Option<String>,
    pub record_type: Option<RecordType>,
}

impl RecordFilter {
    pub fn matches(&self, record: &FinancialRecord) -> bool {
        matches_search(
            self.search.as_deref(),
            [
                Some(record.description.as_str()),
                record.category.as_deref(),
                record.notes.as_deref(),
            ],
        ) && self.record_type.map_or(true, |t| record.record_type == t)
    }
}

/// Look-back window of the income/expense ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRange {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "7days")]
    Last7Days,
    #[serde(rename = "30days")]
    Last30Days,
    #[serde(rename = "90days")]
    Last90Days,
    #[serde(rename = "1year")]
    LastYear,
}

impl DateRange {
    /// First date included by the window, `None` for an unbounded window.
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            DateRange::All => None,
            DateRange::Last7Days => today.checked_sub_days(Days::new(7)),
            DateRange::Last30Days => today.checked_sub_days(Days::new(30)),
            DateRange::Last90Days => today.checked_sub_days(Days::new(90)),
            DateRange::LastYear => today.checked_sub_months(Months::new(12)),
        }
    }
}

impl FromStr for DateRange {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(DateRange::All),
            "7days" => Ok(DateRange::Last7Days),
            "30days" => Ok(DateRange::Last30Days),
            "90days" => Ok(DateRange::Last90Days),
            "1year" => Ok(DateRange::LastYear),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Filter for the ledger spanning all of an owner's accounts.
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub search: Option<String>,
    pub record_type: Option<RecordType>,
    pub platform_id: Option<Uuid>,
    pub range: DateRange,
}

impl LedgerFilter {
    pub fn matches(
        &self,
        record: &FinancialRecord,
        account: &Account,
        platform: Option<&Platform>,
        today: NaiveDate,
    ) -> bool {
        matches_search(
            self.search.as_deref(),
            [
                Some(record.description.as_str()),
                record.category.as_deref(),
                record.notes.as_deref(),
                Some(account.email.as_str()),
                platform.map(|p| p.name.as_str()),
            ],
        ) && self.record_type.map_or(true, |t| record.record_type == t)
            && self.platform_id.map_or(true, |id| platform.map(|p| p.id) == Some(id))
            && self.range.start(today).map_or(true, |start| record.date >= start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IconType;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn platform(name: &str) -> Platform {
        Platform {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            icon_type: IconType::Emoji,
            icon_value: "📺".to_string(),
            color: "#E50914".to_string(),
            category: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn account(email: &str, status: AccountStatus) -> Account {
        Account {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            email: email.to_string(),
            platform_id: None,
            account_type: AccountType::Shared,
            max_customers: 4,
            purchase_date: date(2024, 1, 1),
            expiry_date: date(2024, 12, 31),
            total_amount: 1000.0,
            currency: "BDT".to_string(),
            status,
            login_instructions: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn record(description: &str, record_type: RecordType, on: NaiveDate) -> FinancialRecord {
        FinancialRecord {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            amount: 100.0,
            record_type,
            description: description.to_string(),
            date: on,
            category: Some("Renewal".to_string()),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn all_means_unfiltered() {
        assert_eq!(parse_choice::<PaymentStatus>(Some("all")), Ok(None));
        assert_eq!(parse_choice::<PaymentStatus>(None), Ok(None));
        assert_eq!(parse_choice::<PaymentStatus>(Some("due")), Ok(Some(PaymentStatus::Due)));
        assert!(parse_choice::<PaymentStatus>(Some("overdue")).is_err());
    }

    #[test]
    fn search_is_case_insensitive() {
        assert!(matches_search(Some("NET"), [Some("netflix@shop.com")]));
        assert!(matches_search(None, [None]));
        assert!(matches_search(Some("  "), [Some("x")]));
        assert!(!matches_search(Some("spotify"), [Some("netflix"), None]));
    }

    #[test]
    fn platform_search_covers_description_and_category() {
        let mut music = platform("Spotify");
        music.description = Some("Family plan".to_string());
        music.category = Some("Music".to_string());

        let by_category = PlatformFilter {
            search: Some("MUSIC".into()),
            ..Default::default()
        };
        assert!(by_category.matches(&music));
        let by_description = PlatformFilter {
            search: Some("family".into()),
            ..Default::default()
        };
        assert!(by_description.matches(&music));
        assert!(!by_description.matches(&platform("Netflix")));

        music.is_active = false;
        let active = PlatformFilter {
            active_only: true,
            ..Default::default()
        };
        assert!(!active.matches(&music));
        assert!(PlatformFilter::default().matches(&music));
    }

    #[test]
    fn account_filter_combines_search_and_enums() {
        let netflix = platform("Netflix");
        let acc = account("family@shop.com", AccountStatus::Active);

        let by_platform = AccountFilter {
            search: Some("netf".into()),
            ..Default::default()
        };
        assert!(by_platform.matches(&acc, Some(&netflix)));
        assert!(!by_platform.matches(&acc, None));

        let suspended = AccountFilter {
            status: Some(AccountStatus::Suspended),
            ..Default::default()
        };
        assert!(!suspended.matches(&acc, Some(&netflix)));

        let private = AccountFilter {
            account_type: Some(AccountType::Private),
            ..Default::default()
        };
        assert!(!private.matches(&acc, Some(&netflix)));
    }

    #[test]
    fn ledger_range_is_inclusive_of_start() {
        let today = date(2024, 6, 10);
        let acc = account("a@b.co", AccountStatus::Active);
        let filter = LedgerFilter {
            range: DateRange::Last7Days,
            ..Default::default()
        };
        assert!(filter.matches(&record("x", RecordType::Income, date(2024, 6, 3)), &acc, None, today));
        assert!(!filter.matches(&record("x", RecordType::Income, date(2024, 6, 2)), &acc, None, today));

        let year = LedgerFilter {
            range: DateRange::LastYear,
            record_type: Some(RecordType::Expense),
            ..Default::default()
        };
        assert!(year.matches(&record("x", RecordType::Expense, date(2023, 6, 10)), &acc, None, today));
        assert!(!year.matches(&record("x", RecordType::Income, date(2024, 6, 1)), &acc, None, today));
    }

    #[test]
    fn record_search_covers_category() {
        let filter = RecordFilter {
            search: Some("renew".into()),
            record_type: None,
        };
        assert!(filter.matches(&record("Monthly fee", RecordType::Income, date(2024, 1, 1))));
    }

    #[test]
    fn date_range_parses_query_values() {
        assert_eq!("30days".parse::<DateRange>(), Ok(DateRange::Last30Days));
        assert!("forever".parse::<DateRange>().is_err());
    }
}
