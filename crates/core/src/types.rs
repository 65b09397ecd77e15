use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A third-party service whose subscriptions are resold (streaming, VPN, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Platform {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon_type: IconType,
    pub icon_value: String,
    pub color: String,
    pub category: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchased subscription that is shared out to customers slot by slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub email: String,
    pub platform_id: Option<Uuid>,
    pub account_type: AccountType,
    pub max_customers: u32,
    pub purchase_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub total_amount: f64,
    pub currency: String,
    pub status: AccountStatus,
    pub login_instructions: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An end-renter occupying one slot of an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: Uuid,
    pub account_id: Uuid,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub purchase_date: NaiveDate,
    pub duration_days: u32,
    pub expiry_date: NaiveDate,
    pub amount_paid: f64,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub slot_number: u32,
    pub renewal_status: RenewalStatus,
    pub renewal_reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerNote {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub account_id: Uuid,
    pub note_text: String,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Income or expense line item booked against an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: f64,
    pub record_type: RecordType,
    pub description: String,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─── Enums ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Private,
    Shared,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Archived,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Due,
    Partial,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum RenewalStatus {
    #[default]
    Pending,
    Renewed,
    NotRenewed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum IconType {
    #[default]
    Emoji,
    Image,
    Text,
    Url,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Income,
    Expense,
}

/// Where an expiry date sits relative to "now" and the warning window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ExpiryPriority {
    Expired,
    ExpiringSoon,
    Active,
}

/// Badge shown for an account: expiry wins over the stored status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum DisplayStatus {
    Expired,
    ExpiringSoon,
    Active,
    Inactive,
    Suspended,
    Archived,
}

impl From<AccountStatus> for DisplayStatus {
    fn from(status: AccountStatus) -> Self {
        match status {
            AccountStatus::Active => DisplayStatus::Active,
            AccountStatus::Inactive => DisplayStatus::Inactive,
            AccountStatus::Suspended => DisplayStatus::Suspended,
            AccountStatus::Archived => DisplayStatus::Archived,
        }
    }
}

/// Error returned when a query string value names no known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! str_enum {
    ($ty:ty { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    other => Err(UnknownVariant(other.to_string())),
                }
            }
        }
    };
}

str_enum!(AccountType { Private => "private", Shared => "shared" });
str_enum!(AccountStatus {
    Active => "active",
    Inactive => "inactive",
    Suspended => "suspended",
    Archived => "archived",
});
str_enum!(PaymentStatus { Paid => "paid", Due => "due", Partial => "partial" });
str_enum!(RenewalStatus {
    Pending => "pending",
    Renewed => "renewed",
    NotRenewed => "notRenewed",
});
str_enum!(IconType { Emoji => "emoji", Image => "image", Text => "text", Url => "url" });
str_enum!(RecordType { Income => "income", Expense => "expense" });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_use_wire_names() {
        assert_eq!(
            serde_json::to_string(&RenewalStatus::NotRenewed).unwrap(),
            "\"notRenewed\""
        );
        assert_eq!(
            serde_json::to_string(&ExpiryPriority::ExpiringSoon).unwrap(),
            "\"expiringSoon\""
        );
        assert_eq!("partial".parse::<PaymentStatus>(), Ok(PaymentStatus::Partial));
        assert_eq!("notRenewed".parse::<RenewalStatus>(), Ok(RenewalStatus::NotRenewed));
        assert!("all".parse::<AccountType>().is_err());
    }

    #[test]
    fn stored_status_maps_to_badge() {
        assert_eq!(DisplayStatus::from(AccountStatus::Suspended), DisplayStatus::Suspended);
        assert_eq!(DisplayStatus::from(AccountStatus::Active), DisplayStatus::Active);
    }
}
