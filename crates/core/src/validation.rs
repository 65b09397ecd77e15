//! Form rules applied before any record is written.
//!
//! Every rule is evaluated and all failures are reported together, so a
//! client can flag each offending field at once.

use crate::error::{ResellerResult, ValidationErrors};
use crate::types::IconType;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

static EMAIL_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

/// Loose address check: some `x@y.z` run of non-whitespace anywhere in the input.
pub fn is_valid_email(input: &str) -> bool {
    EMAIL_PATTERN
        .get_or_init(|| Regex::new(r"\S+@\S+\.\S+").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(input))
}

/// `#RGB` or `#RRGGBB`.
pub fn is_valid_hex_color(input: &str) -> bool {
    match input.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

pub fn is_valid_url(input: &str) -> bool {
    url::Url::parse(input).is_ok()
}

#[derive(Debug, Clone)]
pub struct AccountForm<'a> {
    pub email: &'a str,
    pub platform_id: Option<Uuid>,
    pub purchase_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub total_amount: f64,
    pub max_customers: u32,
}

impl AccountForm<'_> {
    pub fn validate(&self) -> ResellerResult<()> {
        let mut errors = ValidationErrors::new();
        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(self.email) {
            errors.add("email", "Email is invalid");
        }
        if self.platform_id.is_none() {
            errors.add("platform_id", "Platform is required");
        }
        if self.expiry_date <= self.purchase_date {
            errors.add("expiry_date", "Expiry date must be after purchase date");
        }
        if self.total_amount <= 0.0 {
            errors.add("total_amount", "Amount must be greater than 0");
        }
        if self.max_customers == 0 {
            errors.add("max_customers", "Max customers must be greater than 0");
        }
        errors.into_result()
    }
}

/// Customer fields shared by the create and edit forms. Create supplies a
/// duration, edit supplies an explicit expiry date.
#[derive(Debug, Clone)]
pub struct CustomerForm<'a> {
    pub customer_name: &'a str,
    pub customer_email: Option<&'a str>,
    pub purchase_date: NaiveDate,
    pub duration_days: Option<u32>,
    pub expiry_date: Option<NaiveDate>,
    pub amount_paid: f64,
}

impl CustomerForm<'_> {
    pub fn validate(&self) -> ResellerResult<()> {
        let mut errors = ValidationErrors::new();
        if self.customer_name.trim().is_empty() {
            errors.add("customer_name", "Customer name is required");
        }
        if let Some(email) = self.customer_email.filter(|e| !e.is_empty()) {
            if !is_valid_email(email) {
                errors.add("customer_email", "Email is invalid");
            }
        }
        if self.duration_days == Some(0) {
            errors.add("duration_days", "Duration must be greater than 0");
        }
        if self.amount_paid < 0.0 {
            errors.add("amount_paid", "Amount cannot be negative");
        }
        if let Some(expiry) = self.expiry_date {
            if expiry <= self.purchase_date {
                errors.add("expiry_date", "Expiry date must be after purchase date");
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone)]
pub struct PlatformForm<'a> {
    pub name: &'a str,
    pub icon_type: IconType,
    pub icon_value: &'a str,
    pub color: &'a str,
}

impl PlatformForm<'_> {
    pub fn validate(&self) -> ResellerResult<()> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.add("name", "Platform name is required");
        }
        if self.icon_value.trim().is_empty() {
            errors.add("icon_value", "Icon value is required");
        } else if self.icon_type == IconType::Url && !is_valid_url(self.icon_value) {
            errors.add("icon_value", "Please enter a valid URL");
        }
        if !is_valid_hex_color(self.color) {
            errors.add("color", "Please enter a valid hex color");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone)]
pub struct RecordForm<'a> {
    pub description: &'a str,
    pub amount: f64,
}

impl RecordForm<'_> {
    pub fn validate(&self) -> ResellerResult<()> {
        let mut errors = ValidationErrors::new();
        if self.description.trim().is_empty() {
            errors.add("description", "Description is required");
        }
        if self.amount <= 0.0 {
            errors.add("amount", "Amount must be greater than 0");
        }
        errors.into_result()
    }
}

/// Trim a note and reject it when nothing is left.
pub fn validate_note(text: &str) -> ResellerResult<String> {
    let trimmed = text.trim();
    let mut errors = ValidationErrors::new();
    if trimmed.is_empty() {
        errors.add("note_text", "Note text is required");
    }
    errors.into_result()?;
    Ok(trimmed.to_string())
}
