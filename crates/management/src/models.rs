//! Management API types: preferences, audit log, request bodies, query
//! strings and list/detail responses.

use chrono::{DateTime, NaiveDate, Utc};
use reseller_core::filters::{
    parse_choice, AccountCustomerFilter, AccountFilter, CustomerFilter, DateRange, LedgerFilter,
    PlatformFilter, RecordFilter,
};
use reseller_core::types::{
    Account, AccountStatus, AccountType, Customer, DisplayStatus, ExpiryPriority, FinancialRecord,
    IconType, PaymentStatus, Platform, RecordType, RenewalStatus, UnknownVariant,
};
use reseller_core::{FieldError, ResellerError, ResellerResult, ValidationErrors};
use reseller_reporting::{
    AccountStatistics, CustomerStatistics, FinancialSummary, LedgerStatistics,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Preferences ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub new_account: bool,
    #[serde(default = "default_true")]
    pub new_customer: bool,
    #[serde(default = "default_true")]
    pub payment_reminders: bool,
    #[serde(default = "default_true")]
    pub expiring_account_alerts: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    #[default]
    Days,
    Months,
    Years,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationSettings {
    #[serde(default = "default_duration")]
    pub default_duration: u32,
    #[serde(default = "default_custom_durations")]
    pub custom_durations: Vec<u32>,
    #[serde(default)]
    pub duration_unit: DurationUnit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "12")]
    TwelveHour,
    #[serde(rename = "24")]
    TwentyFourHour,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default = "default_currency")]
    pub default_currency: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default)]
    pub time_format: TimeFormat,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub theme: Theme,
}

/// Everything on the settings page, stored per owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub durations: DurationSettings,
    #[serde(default)]
    pub user: UserPreferences,
}

fn default_true() -> bool {
    true
}
fn default_duration() -> u32 {
    30
}
fn default_custom_durations() -> Vec<u32> {
    vec![7, 30, 90, 365]
}
fn default_currency() -> String {
    "BDT".to_string()
}
fn default_date_format() -> String {
    "MM/DD/YYYY".to_string()
}
fn default_language() -> String {
    "en".to_string()
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            new_account: true,
            new_customer: true,
            payment_reminders: true,
            expiring_account_alerts: true,
        }
    }
}

impl Default for DurationSettings {
    fn default() -> Self {
        Self {
            default_duration: default_duration(),
            custom_durations: default_custom_durations(),
            duration_unit: DurationUnit::default(),
        }
    }
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
            date_format: default_date_format(),
            time_format: TimeFormat::default(),
            language: default_language(),
            theme: Theme::default(),
        }
    }
}

impl Preferences {
    /// Reject zero durations; custom durations come back sorted and unique.
    pub fn normalized(mut self) -> ResellerResult<Self> {
        let mut errors = ValidationErrors::new();
        if self.durations.default_duration == 0 {
            errors.add("default_duration", "Default duration must be greater than 0");
        }
        if self.durations.custom_durations.contains(&0) {
            errors.add("custom_durations", "Durations must be greater than 0");
        }
        if self.user.default_currency.trim().is_empty() {
            errors.add("default_currency", "Currency is required");
        }
        errors.into_result()?;
        self.durations.custom_durations.sort_unstable();
        self.durations.custom_durations.dedup();
        Ok(self)
    }
}

// ─── Audit Log ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Toggle,
    Note,
    Reminder,
}

// ─── API Request types ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreatePlatformRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub icon_type: IconType,
    pub icon_value: String,
    pub color: String,
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlatformRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon_type: Option<IconType>,
    pub icon_value: Option<String>,
    pub color: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub platform_id: Option<Uuid>,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default = "default_max_customers")]
    pub max_customers: u32,
    pub purchase_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub total_amount: f64,
    pub currency: Option<String>,
    #[serde(default)]
    pub status: AccountStatus,
    pub login_instructions: Option<String>,
    pub notes: Option<String>,
}

fn default_max_customers() -> u32 {
    1
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAccountRequest {
    pub email: Option<String>,
    pub platform_id: Option<Uuid>,
    pub account_type: Option<AccountType>,
    pub max_customers: Option<u32>,
    pub purchase_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub total_amount: Option<f64>,
    pub currency: Option<String>,
    pub status: Option<AccountStatus>,
    pub login_instructions: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub purchase_date: NaiveDate,
    /// Falls back to the configured default duration.
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub amount_paid: f64,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    /// First free slot when absent.
    pub slot_number: Option<u32>,
    #[serde(default)]
    pub renewal_status: RenewalStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomerRequest {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub duration_days: Option<u32>,
    pub expiry_date: Option<NaiveDate>,
    pub amount_paid: Option<f64>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
    pub slot_number: Option<u32>,
    pub renewal_status: Option<RenewalStatus>,
    pub renewal_reminder_sent: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub note_text: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub amount: f64,
    pub record_type: RecordType,
    pub description: String,
    /// Today when absent.
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecordRequest {
    pub amount: Option<f64>,
    pub record_type: Option<RecordType>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

// ─── Query strings ─────────────────────────────────────────────────────────

fn choice<T: std::str::FromStr<Err = UnknownVariant>>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
) -> Option<T> {
    match parse_choice(value) {
        Ok(v) => v,
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}

fn platform_choice(errors: &mut ValidationErrors, value: Option<&str>) -> Option<Uuid> {
    match value.map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(v) => match Uuid::parse_str(v) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add("platform_id", format!("unknown value '{v}'"));
                None
            }
        },
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PlatformQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub active_only: bool,
}

impl PlatformQuery {
    pub fn into_filter(self) -> PlatformFilter {
        PlatformFilter {
            search: self.search,
            active_only: self.active_only,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub account_type: Option<String>,
}

impl AccountQuery {
    pub fn into_filter(self) -> ResellerResult<AccountFilter> {
        let mut errors = ValidationErrors::new();
        let status = choice(&mut errors, "status", self.status.as_deref());
        let account_type = choice(&mut errors, "account_type", self.account_type.as_deref());
        errors.into_result()?;
        Ok(AccountFilter {
            search: self.search,
            status,
            account_type,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountCustomerQuery {
    pub search: Option<String>,
    pub payment_status: Option<String>,
    pub renewal_status: Option<String>,
}

impl AccountCustomerQuery {
    pub fn into_filter(self) -> ResellerResult<AccountCustomerFilter> {
        let mut errors = ValidationErrors::new();
        let payment_status = choice(&mut errors, "payment_status", self.payment_status.as_deref());
        let renewal_status = choice(&mut errors, "renewal_status", self.renewal_status.as_deref());
        errors.into_result()?;
        Ok(AccountCustomerFilter {
            search: self.search,
            payment_status,
            renewal_status,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    pub search: Option<String>,
    pub payment_status: Option<String>,
    pub platform_id: Option<String>,
}

impl CustomerQuery {
    pub fn into_filter(self) -> ResellerResult<CustomerFilter> {
        let mut errors = ValidationErrors::new();
        let payment_status = choice(&mut errors, "payment_status", self.payment_status.as_deref());
        let platform_id = platform_choice(&mut errors, self.platform_id.as_deref());
        errors.into_result()?;
        Ok(CustomerFilter {
            search: self.search,
            payment_status,
            platform_id,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    pub search: Option<String>,
    pub record_type: Option<String>,
}

impl RecordQuery {
    pub fn into_filter(self) -> ResellerResult<RecordFilter> {
        let mut errors = ValidationErrors::new();
        let record_type = choice(&mut errors, "record_type", self.record_type.as_deref());
        errors.into_result()?;
        Ok(RecordFilter {
            search: self.search,
            record_type,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    pub search: Option<String>,
    pub record_type: Option<String>,
    pub platform_id: Option<String>,
    pub range: Option<String>,
}

impl LedgerQuery {
    pub fn into_filter(self) -> ResellerResult<LedgerFilter> {
        let mut errors = ValidationErrors::new();
        let record_type = choice(&mut errors, "record_type", self.record_type.as_deref());
        let platform_id = platform_choice(&mut errors, self.platform_id.as_deref());
        let range = match self.range.as_deref().map(str::trim) {
            None | Some("") => DateRange::All,
            Some(v) => v.parse().unwrap_or_else(|e: UnknownVariant| {
                errors.add("range", e.to_string());
                DateRange::All
            }),
        };
        errors.into_result()?;
        Ok(LedgerFilter {
            search: self.search,
            record_type,
            platform_id,
            range,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub range: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

// ─── API Response types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    #[serde(flatten)]
    pub account: Account,
    pub platform: Option<Platform>,
    pub customer_count: u64,
    pub display_status: DisplayStatus,
}

#[derive(Debug, Serialize)]
pub struct AccountListResponse {
    pub accounts: Vec<AccountView>,
    pub statistics: AccountStatistics,
}

#[derive(Debug, Serialize)]
pub struct AccountDetail {
    #[serde(flatten)]
    pub account: Account,
    pub platform: Option<Platform>,
    pub customer_count: u64,
    pub payment_breakdown: CustomerStatistics,
    pub available_slots: Vec<u32>,
    pub display_status: DisplayStatus,
    pub days_until_expiry: i64,
}

#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub account_id: Uuid,
    pub max_customers: u32,
    pub used: Vec<u32>,
    pub available: Vec<u32>,
}

#[derive(Debug, Serialize)]
pub struct LoginInstructions {
    pub account_id: Uuid,
    pub email: String,
    pub platform_name: Option<String>,
    pub login_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerView {
    #[serde(flatten)]
    pub customer: Customer,
    pub expiry_priority: ExpiryPriority,
    pub days_until_expiry: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerWithAccount {
    #[serde(flatten)]
    pub customer: Customer,
    pub account_email: String,
    pub platform_id: Option<Uuid>,
    pub platform_name: Option<String>,
    pub expiry_priority: ExpiryPriority,
}

#[derive(Debug, Serialize)]
pub struct CustomerListResponse {
    pub customers: Vec<CustomerWithAccount>,
    pub statistics: CustomerStatistics,
}

#[derive(Debug, Serialize)]
pub struct RecordListResponse {
    pub records: Vec<FinancialRecord>,
    pub summary: FinancialSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    #[serde(flatten)]
    pub record: FinancialRecord,
    pub account_email: String,
    pub platform_id: Option<Uuid>,
    pub platform_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub records: Vec<LedgerEntry>,
    pub statistics: LedgerStatistics,
}

#[derive(Debug, Serialize)]
pub struct NotificationTestResponse {
    pub sent: bool,
    pub notifier: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn from_error(code: &str, err: &ResellerError) -> Self {
        let fields = match err {
            ResellerError::Validation(errors) => Some(errors.fields().to_vec()),
            _ => None,
        };
        Self {
            error: code.to_string(),
            message: err.to_string(),
            fields,
        }
    }
}
