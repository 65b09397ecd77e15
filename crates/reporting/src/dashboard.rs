//! Owner dashboard: headline counters, six-month activity and platform mix.

use crate::statistics::customer_statistics;
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use reseller_core::expiry::{classify_expiry, days_until, expiry_instant};
use reseller_core::types::{Account, AccountStatus, Customer, ExpiryPriority, Platform};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Months covered by the activity series, current month included.
pub const ACTIVITY_MONTHS: u32 = 6;
const RECENT_ACCOUNTS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_accounts: u64,
    pub active_accounts: u64,
    pub total_revenue: f64,
    pub monthly_revenue: f64,
    pub expired_accounts: u64,
    pub expiring_soon_accounts: u64,
    pub total_customers: u64,
    pub paid_customers: u64,
    pub due_customers: u64,
    pub partial_payments: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyActivity {
    /// `YYYY-MM`
    pub month: String,
    /// Short label such as `May 24`.
    pub label: String,
    pub revenue: f64,
    pub customers: u64,
    pub accounts: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformShare {
    pub platform_id: Uuid,
    pub name: String,
    pub count: u64,
    pub revenue: f64,
    pub color: String,
}

/// An account that is expired or about to expire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountAlert {
    pub account_id: Uuid,
    pub email: String,
    pub platform_name: Option<String>,
    pub expiry_date: NaiveDate,
    pub priority: ExpiryPriority,
    pub days_until: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub monthly: Vec<MonthlyActivity>,
    pub platforms: Vec<PlatformShare>,
    pub recent_accounts: Vec<Account>,
    pub attention: Vec<AccountAlert>,
    pub generated_at: DateTime<Utc>,
}

/// Rows a dashboard is computed from. Accounts are expected newest first.
#[derive(Debug, Clone, Copy)]
pub struct DashboardInput<'a> {
    pub accounts: &'a [Account],
    pub customers: &'a [Customer],
    pub platforms: &'a [Platform],
}

pub fn build_dashboard(input: DashboardInput<'_>, now: DateTime<Utc>, warning_days: u32) -> Dashboard {
    let platform_names: HashMap<Uuid, &str> =
        input.platforms.iter().map(|p| (p.id, p.name.as_str())).collect();

    let mut attention: Vec<AccountAlert> = input
        .accounts
        .iter()
        .filter_map(|account| {
            let priority = classify_expiry(account.expiry_date, now, warning_days);
            (priority != ExpiryPriority::Active).then(|| AccountAlert {
                account_id: account.id,
                email: account.email.clone(),
                platform_name: account
                    .platform_id
                    .and_then(|id| platform_names.get(&id))
                    .map(|name| name.to_string()),
                expiry_date: account.expiry_date,
                priority,
                days_until: days_until(account.expiry_date, now),
            })
        })
        .collect();
    attention.sort_by_key(|alert| expiry_instant(alert.expiry_date));

    Dashboard {
        stats: dashboard_stats(input.accounts, input.customers, now, warning_days),
        monthly: monthly_activity(input.accounts, input.customers, now),
        platforms: platform_distribution(input.accounts, input.platforms),
        recent_accounts: input.accounts.iter().take(RECENT_ACCOUNTS).cloned().collect(),
        attention,
        generated_at: now,
    }
}

pub fn dashboard_stats(
    accounts: &[Account],
    customers: &[Customer],
    now: DateTime<Utc>,
    warning_days: u32,
) -> DashboardStats {
    let month_start = first_of_month(now.date_naive());
    let mut stats = accounts.iter().fold(DashboardStats::default(), |mut acc, account| {
        acc.total_accounts += 1;
        acc.total_revenue += account.total_amount;
        if account.status == AccountStatus::Active {
            acc.active_accounts += 1;
        }
        match classify_expiry(account.expiry_date, now, warning_days) {
            ExpiryPriority::Expired => acc.expired_accounts += 1,
            ExpiryPriority::ExpiringSoon => acc.expiring_soon_accounts += 1,
            ExpiryPriority::Active => {}
        }
        if account.created_at.date_naive() >= month_start {
            acc.monthly_revenue += account.total_amount;
        }
        acc
    });

    let payments = customer_statistics(customers);
    stats.total_customers = payments.total_customers;
    stats.paid_customers = payments.paid_customers;
    stats.due_customers = payments.due_customers;
    stats.partial_payments = payments.partial_customers;
    stats
}

/// Accounts and customers created per month over the last six months,
/// with account value booked as revenue in the month the account was created.
pub fn monthly_activity(accounts: &[Account], customers: &[Customer], now: DateTime<Utc>) -> Vec<MonthlyActivity> {
    let current = first_of_month(now.date_naive());
    let mut months: Vec<MonthlyActivity> = (0..ACTIVITY_MONTHS)
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .map(|start| MonthlyActivity {
            month: month_key(start),
            label: month_label(start),
            revenue: 0.0,
            customers: 0,
            accounts: 0,
        })
        .collect();

    let index: HashMap<String, usize> = months
        .iter()
        .enumerate()
        .map(|(i, m)| (m.month.clone(), i))
        .collect();

    for account in accounts {
        if let Some(&i) = index.get(&month_key(account.created_at.date_naive())) {
            months[i].accounts += 1;
            months[i].revenue += account.total_amount;
        }
    }
    for customer in customers {
        if let Some(&i) = index.get(&month_key(customer.created_at.date_naive())) {
            months[i].customers += 1;
        }
    }
    months
}

/// Account count and value per platform, in order of first appearance.
/// Accounts without a platform are skipped.
pub fn platform_distribution(accounts: &[Account], platforms: &[Platform]) -> Vec<PlatformShare> {
    let by_id: HashMap<Uuid, &Platform> = platforms.iter().map(|p| (p.id, p)).collect();
    let mut shares: Vec<PlatformShare> = Vec::new();

    for account in accounts {
        let Some(platform) = account.platform_id.and_then(|id| by_id.get(&id)) else {
            continue;
        };
        match shares.iter_mut().find(|s| s.platform_id == platform.id) {
            Some(share) => {
                share.count += 1;
                share.revenue += account.total_amount;
            }
            None => shares.push(PlatformShare {
                platform_id: platform.id,
                name: platform.name.clone(),
                count: 1,
                revenue: account.total_amount,
                color: platform.color.clone(),
            }),
        }
    }

    for (i, share) in shares.iter_mut().enumerate() {
        if share.color.is_empty() {
            share.color = format!("hsl({}, 70%, 50%)", i * 45);
        }
    }
    shares
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn month_label(date: NaiveDate) -> String {
    date.format("%b %y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use chrono::TimeZone;
    use reseller_core::types::{AccountType, PaymentStatus};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn stats_book_this_months_accounts_as_monthly_revenue() {
        let mut old = account(AccountType::Shared, 1000.0, date(2024, 12, 1));
        old.created_at = Utc.with_ymd_and_hms(2024, 4, 20, 0, 0, 0).unwrap();
        let mut new = account(AccountType::Private, 400.0, date(2024, 6, 12));
        new.created_at = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let customers = vec![
            customer(new.id, 1, PaymentStatus::Paid, 400.0),
            customer(old.id, 1, PaymentStatus::Partial, 100.0),
        ];

        let stats = dashboard_stats(&[old, new], &customers, now(), 7);
        assert_eq!(stats.total_accounts, 2);
        assert!((stats.total_revenue - 1400.0).abs() < f64::EPSILON);
        assert!((stats.monthly_revenue - 400.0).abs() < f64::EPSILON);
        assert_eq!(stats.expiring_soon_accounts, 1);
        assert_eq!(stats.paid_customers, 1);
        assert_eq!(stats.partial_payments, 1);
    }

    #[test]
    fn activity_covers_six_months_ending_now() {
        let mut march = account(AccountType::Shared, 900.0, date(2024, 12, 1));
        march.created_at = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let mut too_old = account(AccountType::Shared, 50.0, date(2024, 12, 1));
        too_old.created_at = Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap();
        let mut cust = customer(march.id, 1, PaymentStatus::Paid, 100.0);
        cust.created_at = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();

        let months = monthly_activity(&[march, too_old], &[cust], now());
        let keys: Vec<&str> = months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(keys, vec!["2024-01", "2024-02", "2024-03", "2024-04", "2024-05", "2024-06"]);
        assert_eq!(months[0].label, "Jan 24");
        assert_eq!(months[2].accounts, 1);
        assert!((months[2].revenue - 900.0).abs() < f64::EPSILON);
        assert_eq!(months[5].customers, 1);
        assert_eq!(months.iter().map(|m| m.accounts).sum::<u64>(), 1);
    }

    #[test]
    fn platform_distribution_groups_and_fills_colors() {
        let mut netflix = platform("Netflix");
        netflix.color = String::new();
        let spotify = platform("Spotify");

        let mut a = account(AccountType::Shared, 100.0, date(2024, 12, 1));
        a.platform_id = Some(spotify.id);
        let mut b = account(AccountType::Shared, 200.0, date(2024, 12, 1));
        b.platform_id = Some(netflix.id);
        let mut c = account(AccountType::Shared, 300.0, date(2024, 12, 1));
        c.platform_id = Some(netflix.id);
        let orphan = account(AccountType::Shared, 999.0, date(2024, 12, 1));

        let shares = platform_distribution(&[a, b, c, orphan], &[netflix.clone(), spotify.clone()]);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].name, "Spotify");
        assert_eq!(shares[1].count, 2);
        assert!((shares[1].revenue - 500.0).abs() < f64::EPSILON);
        assert_eq!(shares[1].color, "hsl(45, 70%, 50%)");
        assert_eq!(shares[0].color, spotify.color);
    }

    #[test]
    fn attention_lists_expired_first() {
        let soon = account(AccountType::Shared, 1.0, date(2024, 6, 14));
        let expired = account(AccountType::Shared, 1.0, date(2024, 5, 1));
        let fine = account(AccountType::Shared, 1.0, date(2025, 1, 1));

        let dashboard = build_dashboard(
            DashboardInput {
                accounts: &[soon.clone(), expired.clone(), fine],
                customers: &[],
                platforms: &[],
            },
            now(),
            7,
        );
        let ids: Vec<Uuid> = dashboard.attention.iter().map(|a| a.account_id).collect();
        assert_eq!(ids, vec![expired.id, soon.id]);
        assert_eq!(dashboard.attention[1].priority, ExpiryPriority::ExpiringSoon);
        assert_eq!(dashboard.attention[1].days_until, 4);
        assert_eq!(dashboard.recent_accounts.len(), 3);
    }
}
