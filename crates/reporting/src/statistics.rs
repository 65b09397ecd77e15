//! Summary cards shown above each list: counts and sums over fetched rows.

use chrono::{DateTime, Utc};
use reseller_core::expiry::classify_expiry;
use reseller_core::types::{
    Account, AccountStatus, AccountType, Customer, ExpiryPriority, FinancialRecord, PaymentStatus,
    RecordType,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountStatistics {
    pub total_accounts: u64,
    pub private_accounts: u64,
    pub shared_accounts: u64,
    pub active_accounts: u64,
    pub expired_accounts: u64,
    pub expiring_soon_accounts: u64,
    pub total_value: f64,
}

pub fn account_statistics<'a, I>(accounts: I, now: DateTime<Utc>, warning_days: u32) -> AccountStatistics
where
    I: IntoIterator<Item = &'a Account>,
{
    accounts.into_iter().fold(AccountStatistics::default(), |mut acc, account| {
        acc.total_accounts += 1;
        acc.total_value += account.total_amount;
        match account.account_type {
            AccountType::Private => acc.private_accounts += 1,
            AccountType::Shared => acc.shared_accounts += 1,
        }
        if account.status == AccountStatus::Active {
            acc.active_accounts += 1;
        }
        match classify_expiry(account.expiry_date, now, warning_days) {
            ExpiryPriority::Expired => acc.expired_accounts += 1,
            ExpiryPriority::ExpiringSoon => acc.expiring_soon_accounts += 1,
            ExpiryPriority::Active => {}
        }
        acc
    })
}

/// Payment breakdown of a set of customers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerStatistics {
    pub total_customers: u64,
    pub paid_customers: u64,
    pub due_customers: u64,
    pub partial_customers: u64,
    pub total_revenue: f64,
}

pub fn customer_statistics<'a, I>(customers: I) -> CustomerStatistics
where
    I: IntoIterator<Item = &'a Customer>,
{
    customers.into_iter().fold(CustomerStatistics::default(), |mut acc, customer| {
        acc.total_customers += 1;
        acc.total_revenue += customer.amount_paid;
        match customer.payment_status {
            PaymentStatus::Paid => acc.paid_customers += 1,
            PaymentStatus::Due => acc.due_customers += 1,
            PaymentStatus::Partial => acc.partial_customers += 1,
        }
        acc
    })
}

/// Income versus expenses of one account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
    pub record_count: u64,
}

pub fn financial_summary<'a, I>(records: I) -> FinancialSummary
where
    I: IntoIterator<Item = &'a FinancialRecord>,
{
    let mut summary = records.into_iter().fold(FinancialSummary::default(), |mut acc, record| {
        acc.record_count += 1;
        match record.record_type {
            RecordType::Income => acc.total_income += record.amount,
            RecordType::Expense => acc.total_expenses += record.amount,
        }
        acc
    });
    summary.net_profit = summary.total_income - summary.total_expenses;
    summary
}

/// Totals across every account's income and expense records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerStatistics {
    pub total_records: u64,
    pub total_income: f64,
    pub total_expenses: f64,
    pub income_records: u64,
    pub expense_records: u64,
    pub net_profit: f64,
    pub avg_transaction_amount: f64,
}

pub fn ledger_statistics<'a, I>(records: I) -> LedgerStatistics
where
    I: IntoIterator<Item = &'a FinancialRecord>,
{
    let mut stats = records.into_iter().fold(LedgerStatistics::default(), |mut acc, record| {
        acc.total_records += 1;
        match record.record_type {
            RecordType::Income => {
                acc.total_income += record.amount;
                acc.income_records += 1;
            }
            RecordType::Expense => {
                acc.total_expenses += record.amount;
                acc.expense_records += 1;
            }
        }
        acc
    });
    stats.net_profit = stats.total_income - stats.total_expenses;
    stats.avg_transaction_amount = if stats.total_records > 0 {
        (stats.total_income + stats.total_expenses) / stats.total_records as f64
    } else {
        0.0
    };
    stats
}
