//! Reseller analytics: list statistics, the owner dashboard, revenue reports
//! and their CSV export. Everything here is a pure function over rows the
//! caller already fetched.

pub mod dashboard;
pub mod export;
pub mod report;
pub mod statistics;

pub use dashboard::{build_dashboard, Dashboard, DashboardInput};
pub use export::{export_csv, export_file_name};
pub use report::{build_report, Report, ReportInput, ReportRange};
pub use statistics::{
    account_statistics, customer_statistics, financial_summary, ledger_statistics,
    AccountStatistics, CustomerStatistics, FinancialSummary, LedgerStatistics,
};

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, Utc};
    use reseller_core::types::{
        Account, AccountStatus, AccountType, Customer, FinancialRecord, IconType, PaymentStatus,
        Platform, RecordType, RenewalStatus,
    };
    use uuid::Uuid;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn platform(name: &str) -> Platform {
        let now = Utc::now();
        Platform {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            name: name.to_string(),
            description: None,
            icon_type: IconType::Emoji,
            icon_value: "📺".to_string(),
            color: "#E50914".to_string(),
            category: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn account(account_type: AccountType, total_amount: f64, expiry_date: NaiveDate) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            email: format!("{}@example.com", Uuid::new_v4().simple()),
            platform_id: None,
            account_type,
            max_customers: 5,
            purchase_date: date(2024, 1, 1),
            expiry_date,
            total_amount,
            currency: "BDT".to_string(),
            status: AccountStatus::Active,
            login_instructions: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn customer(account_id: Uuid, slot_number: u32, payment_status: PaymentStatus, amount_paid: f64) -> Customer {
        let now = Utc::now();
        Customer {
            id: Uuid::new_v4(),
            account_id,
            customer_name: format!("Customer {slot_number}"),
            customer_email: None,
            customer_phone: None,
            purchase_date: date(2024, 1, 1),
            duration_days: 30,
            expiry_date: date(2024, 1, 31),
            amount_paid,
            payment_status,
            notes: None,
            slot_number,
            renewal_status: RenewalStatus::Pending,
            renewal_reminder_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn record(
        account_id: Uuid,
        record_type: RecordType,
        amount: f64,
        date: NaiveDate,
        category: Option<&str>,
    ) -> FinancialRecord {
        let now = Utc::now();
        FinancialRecord {
            id: Uuid::new_v4(),
            account_id,
            amount,
            record_type,
            description: "entry".to_string(),
            date,
            category: category.map(str::to_string),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}
