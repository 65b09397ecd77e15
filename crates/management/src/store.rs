//! Tenant-scoped in-memory store backed by DashMap.
//!
//! Every operation takes the caller's owner id. Rows that belong to another
//! owner are reported as not found, never as forbidden.

use crate::models::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use reseller_core::expiry::{
    account_display_status, classify_expiry, customer_expiry, days_until,
};
use reseller_core::filters::{
    AccountCustomerFilter, AccountFilter, CustomerFilter, LedgerFilter, PlatformFilter, RecordFilter,
};
use reseller_core::slots::{available_slots, check_slot, first_available_slot, SlotRejection};
use reseller_core::types::{Account, Customer, CustomerNote, FinancialRecord, Platform};
use reseller_core::validation::{
    validate_note, AccountForm, CustomerForm, PlatformForm, RecordForm,
};
use reseller_core::{AppConfig, ResellerError, ResellerResult, ValidationErrors};
use reseller_reporting::{
    account_statistics, customer_statistics, financial_summary, ledger_statistics,
};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// Knobs the store needs from the application configuration.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub account_warning_days: u32,
    pub customer_warning_days: u32,
    pub default_currency: String,
    pub default_duration_days: u32,
    pub audit_max_entries: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl StoreSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            account_warning_days: config.expiry.account_warning_days,
            customer_warning_days: config.expiry.customer_warning_days,
            default_currency: config.defaults.currency.clone(),
            default_duration_days: config.defaults.duration_days,
            audit_max_entries: config.storage.audit_max_entries,
        }
    }
}

/// Everything one owner can see, cloned out of the store. Accounts are
/// newest first.
#[derive(Debug, Clone, Default)]
pub struct OwnerData {
    pub platforms: Vec<Platform>,
    pub accounts: Vec<Account>,
    pub customers: Vec<Customer>,
    pub records: Vec<FinancialRecord>,
}

impl OwnerData {
    pub fn platform(&self, id: Option<Uuid>) -> Option<&Platform> {
        id.and_then(|id| self.platforms.iter().find(|p| p.id == id))
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }
}

pub struct ResellerStore {
    pub(crate) settings: StoreSettings,
    pub(crate) platforms: DashMap<Uuid, Platform>,
    pub(crate) accounts: DashMap<Uuid, Account>,
    pub(crate) customers: DashMap<Uuid, Customer>,
    pub(crate) notes: DashMap<Uuid, CustomerNote>,
    pub(crate) records: DashMap<Uuid, FinancialRecord>,
    pub(crate) preferences: DashMap<Uuid, Preferences>,
    pub(crate) audit_log: DashMap<Uuid, AuditLogEntry>,
}

impl Default for ResellerStore {
    fn default() -> Self {
        Self::new(StoreSettings::default())
    }
}

impl ResellerStore {
    pub fn new(settings: StoreSettings) -> Self {
        info!(
            account_warning_days = settings.account_warning_days,
            customer_warning_days = settings.customer_warning_days,
            "Reseller store initialized (in-memory)"
        );
        Self {
            settings,
            platforms: DashMap::new(),
            accounts: DashMap::new(),
            customers: DashMap::new(),
            notes: DashMap::new(),
            records: DashMap::new(),
            preferences: DashMap::new(),
            audit_log: DashMap::new(),
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    // ─── Platforms ─────────────────────────────────────────────────────────

    /// Owner's platforms matching the filter, sorted by name.
    pub fn list_platforms(&self, owner: Uuid, filter: &PlatformFilter) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self
            .platforms
            .iter()
            .filter(|r| r.owner_id == owner && filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        platforms.sort_by_key(|p| p.name.to_lowercase());
        platforms
    }

    pub fn get_platform(&self, owner: Uuid, id: Uuid) -> ResellerResult<Platform> {
        self.platforms
            .get(&id)
            .filter(|r| r.owner_id == owner)
            .map(|r| r.value().clone())
            .ok_or_else(|| ResellerError::not_found("platform", id))
    }

    pub fn create_platform(&self, owner: Uuid, req: CreatePlatformRequest) -> ResellerResult<Platform> {
        PlatformForm {
            name: &req.name,
            icon_type: req.icon_type,
            icon_value: &req.icon_value,
            color: &req.color,
        }
        .validate()?;

        let now = Utc::now();
        let platform = Platform {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: req.name.trim().to_string(),
            description: req.description,
            icon_type: req.icon_type,
            icon_value: req.icon_value.trim().to_string(),
            color: req.color,
            category: req.category,
            is_active: req.is_active,
            created_at: now,
            updated_at: now,
        };
        self.platforms.insert(platform.id, platform.clone());
        self.log_audit(owner, AuditAction::Create, "platform", platform.id, serde_json::json!({"name": &platform.name}));
        Ok(platform)
    }

    pub fn update_platform(&self, owner: Uuid, id: Uuid, req: UpdatePlatformRequest) -> ResellerResult<Platform> {
        let mut platform = self.get_platform(owner, id)?;
        if let Some(name) = req.name { platform.name = name.trim().to_string(); }
        if let Some(description) = req.description { platform.description = Some(description); }
        if let Some(icon_type) = req.icon_type { platform.icon_type = icon_type; }
        if let Some(icon_value) = req.icon_value { platform.icon_value = icon_value.trim().to_string(); }
        if let Some(color) = req.color { platform.color = color; }
        if let Some(category) = req.category { platform.category = Some(category); }
        if let Some(is_active) = req.is_active { platform.is_active = is_active; }

        PlatformForm {
            name: &platform.name,
            icon_type: platform.icon_type,
            icon_value: &platform.icon_value,
            color: &platform.color,
        }
        .validate()?;

        platform.updated_at = Utc::now();
        self.platforms.insert(id, platform.clone());
        self.log_audit(owner, AuditAction::Update, "platform", id, serde_json::json!({}));
        Ok(platform)
    }

    pub fn toggle_platform(&self, owner: Uuid, id: Uuid) -> ResellerResult<Platform> {
        let mut entry = self
            .platforms
            .get_mut(&id)
            .filter(|r| r.owner_id == owner)
            .ok_or_else(|| ResellerError::not_found("platform", id))?;
        entry.is_active = !entry.is_active;
        entry.updated_at = Utc::now();
        let platform = entry.value().clone();
        drop(entry);
        self.log_audit(owner, AuditAction::Toggle, "platform", id, serde_json::json!({"is_active": platform.is_active}));
        Ok(platform)
    }

    /// Refused while any of the owner's accounts still points at the platform.
    pub fn delete_platform(&self, owner: Uuid, id: Uuid) -> ResellerResult<()> {
        self.get_platform(owner, id)?;
        let in_use = self
            .accounts
            .iter()
            .filter(|r| r.owner_id == owner && r.platform_id == Some(id))
            .count();
        if in_use > 0 {
            return Err(ResellerError::Conflict(format!(
                "Platform is used by {in_use} account(s)"
            )));
        }
        self.platforms.remove(&id);
        self.log_audit(owner, AuditAction::Delete, "platform", id, serde_json::json!({}));
        Ok(())
    }

    // ─── Accounts ──────────────────────────────────────────────────────────

    pub fn get_account(&self, owner: Uuid, id: Uuid) -> ResellerResult<Account> {
        self.accounts
            .get(&id)
            .filter(|r| r.owner_id == owner)
            .map(|r| r.value().clone())
            .ok_or_else(|| ResellerError::not_found("account", id))
    }

    fn account_customers(&self, account_id: Uuid) -> Vec<Customer> {
        self.customers
            .iter()
            .filter(|r| r.account_id == account_id)
            .map(|r| r.value().clone())
            .collect()
    }

    fn used_slots(&self, account_id: Uuid, except: Option<Uuid>) -> Vec<u32> {
        self.customers
            .iter()
            .filter(|r| r.account_id == account_id && Some(r.id) != except)
            .map(|r| r.slot_number)
            .collect()
    }

    fn platform_map(&self, owner: Uuid) -> HashMap<Uuid, Platform> {
        self.platforms
            .iter()
            .filter(|r| r.owner_id == owner)
            .map(|r| (r.id, r.value().clone()))
            .collect()
    }

    /// Filtered accounts, newest first. Statistics cover every account of
    /// the owner whatever the filter.
    pub fn list_accounts(&self, owner: Uuid, filter: &AccountFilter, now: DateTime<Utc>) -> AccountListResponse {
        let platforms = self.platform_map(owner);
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for customer in self.customers.iter() {
            *counts.entry(customer.account_id).or_insert(0) += 1;
        }

        let owned: Vec<Account> = self
            .accounts
            .iter()
            .filter(|r| r.owner_id == owner)
            .map(|r| r.value().clone())
            .collect();
        let warning_days = self.settings.account_warning_days;
        let statistics = account_statistics(&owned, now, warning_days);

        let mut accounts: Vec<Account> = owned
            .into_iter()
            .filter(|a| filter.matches(a, a.platform_id.and_then(|id| platforms.get(&id))))
            .collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let accounts = accounts
            .into_iter()
            .map(|account| AccountView {
                platform: account.platform_id.and_then(|id| platforms.get(&id).cloned()),
                customer_count: counts.get(&account.id).copied().unwrap_or(0),
                display_status: account_display_status(account.status, account.expiry_date, now, warning_days),
                account,
            })
            .collect();
        AccountListResponse { accounts, statistics }
    }

    pub fn account_detail(&self, owner: Uuid, id: Uuid, now: DateTime<Utc>) -> ResellerResult<AccountDetail> {
        let account = self.get_account(owner, id)?;
        let platform = account.platform_id.and_then(|pid| self.get_platform(owner, pid).ok());
        let customers = self.account_customers(id);
        let available = available_slots(account.max_customers, customers.iter().map(|c| c.slot_number));
        Ok(AccountDetail {
            platform,
            customer_count: customers.len() as u64,
            payment_breakdown: customer_statistics(&customers),
            available_slots: available,
            display_status: account_display_status(
                account.status,
                account.expiry_date,
                now,
                self.settings.account_warning_days,
            ),
            days_until_expiry: days_until(account.expiry_date, now),
            account,
        })
    }

    fn check_platform_owned(&self, owner: Uuid, platform_id: Option<Uuid>) -> ResellerResult<()> {
        match platform_id {
            Some(pid) if self.get_platform(owner, pid).is_err() => {
                let mut errors = ValidationErrors::new();
                errors.add("platform_id", "Selected platform does not exist");
                errors.into_result()
            }
            _ => Ok(()),
        }
    }

    fn check_email_unique(&self, owner: Uuid, email: &str, except: Option<Uuid>) -> ResellerResult<()> {
        let taken = self
            .accounts
            .iter()
            .any(|r| r.owner_id == owner && r.email == email && Some(r.id) != except);
        if taken {
            return Err(ResellerError::Conflict(format!(
                "An account with email {email} already exists"
            )));
        }
        Ok(())
    }

    pub fn create_account(&self, owner: Uuid, req: CreateAccountRequest) -> ResellerResult<Account> {
        AccountForm {
            email: &req.email,
            platform_id: req.platform_id,
            purchase_date: req.purchase_date,
            expiry_date: req.expiry_date,
            total_amount: req.total_amount,
            max_customers: req.max_customers,
        }
        .validate()?;
        self.check_platform_owned(owner, req.platform_id)?;

        let email = req.email.trim().to_lowercase();
        self.check_email_unique(owner, &email, None)?;

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            owner_id: owner,
            email,
            platform_id: req.platform_id,
            account_type: req.account_type,
            max_customers: req.max_customers,
            purchase_date: req.purchase_date,
            expiry_date: req.expiry_date,
            total_amount: req.total_amount,
            currency: req
                .currency
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| self.settings.default_currency.clone()),
            status: req.status,
            login_instructions: req.login_instructions,
            notes: req.notes,
            created_at: now,
            updated_at: now,
        };
        self.accounts.insert(account.id, account.clone());
        self.log_audit(owner, AuditAction::Create, "account", account.id, serde_json::json!({"email": &account.email}));
        Ok(account)
    }

    pub fn update_account(&self, owner: Uuid, id: Uuid, req: UpdateAccountRequest) -> ResellerResult<Account> {
        let mut account = self.get_account(owner, id)?;
        if let Some(email) = req.email { account.email = email.trim().to_lowercase(); }
        if let Some(platform_id) = req.platform_id { account.platform_id = Some(platform_id); }
        if let Some(account_type) = req.account_type { account.account_type = account_type; }
        if let Some(max) = req.max_customers { account.max_customers = max; }
        if let Some(date) = req.purchase_date { account.purchase_date = date; }
        if let Some(date) = req.expiry_date { account.expiry_date = date; }
        if let Some(amount) = req.total_amount { account.total_amount = amount; }
        if let Some(currency) = req.currency { account.currency = currency; }
        if let Some(status) = req.status { account.status = status; }
        if let Some(text) = req.login_instructions { account.login_instructions = Some(text); }
        if let Some(notes) = req.notes { account.notes = Some(notes); }

        AccountForm {
            email: &account.email,
            platform_id: account.platform_id,
            purchase_date: account.purchase_date,
            expiry_date: account.expiry_date,
            total_amount: account.total_amount,
            max_customers: account.max_customers,
        }
        .validate()?;
        self.check_platform_owned(owner, account.platform_id)?;
        self.check_email_unique(owner, &account.email, Some(id))?;

        // Holding the entry serializes this capacity check against slot changes.
        let mut entry = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| ResellerError::not_found("account", id))?;
        if let Some(highest) = self.used_slots(id, None).into_iter().max() {
            if highest > account.max_customers {
                let mut errors = ValidationErrors::new();
                errors.add(
                    "max_customers",
                    format!("Slot {highest} is occupied; capacity cannot drop below it"),
                );
                return Err(ResellerError::Validation(errors));
            }
        }
        account.updated_at = Utc::now();
        *entry = account.clone();
        drop(entry);

        self.log_audit(owner, AuditAction::Update, "account", id, serde_json::json!({}));
        Ok(account)
    }

    /// Removes the account with its customers, their notes and its records.
    pub fn delete_account(&self, owner: Uuid, id: Uuid) -> ResellerResult<()> {
        self.get_account(owner, id)?;
        self.accounts.remove(&id);
        self.customers.retain(|_, c| c.account_id != id);
        self.notes.retain(|_, n| n.account_id != id);
        self.records.retain(|_, r| r.account_id != id);
        self.log_audit(owner, AuditAction::Delete, "account", id, serde_json::json!({}));
        Ok(())
    }

    pub fn login_instructions(&self, owner: Uuid, id: Uuid) -> ResellerResult<LoginInstructions> {
        let account = self.get_account(owner, id)?;
        let platform_name = account
            .platform_id
            .and_then(|pid| self.get_platform(owner, pid).ok())
            .map(|p| p.name);
        Ok(LoginInstructions {
            account_id: account.id,
            email: account.email,
            platform_name,
            login_instructions: account.login_instructions,
        })
    }

    pub fn account_slots(&self, owner: Uuid, id: Uuid) -> ResellerResult<SlotsResponse> {
        let account = self.get_account(owner, id)?;
        let mut used = self.used_slots(id, None);
        used.sort_unstable();
        Ok(SlotsResponse {
            account_id: id,
            max_customers: account.max_customers,
            available: available_slots(account.max_customers, used.iter().copied()),
            used,
        })
    }

    // ─── Customers ─────────────────────────────────────────────────────────

    /// Customers of one account in slot order.
    pub fn list_account_customers(
        &self,
        owner: Uuid,
        account_id: Uuid,
        filter: &AccountCustomerFilter,
        now: DateTime<Utc>,
    ) -> ResellerResult<Vec<CustomerView>> {
        self.get_account(owner, account_id)?;
        let mut customers: Vec<Customer> = self
            .account_customers(account_id)
            .into_iter()
            .filter(|c| filter.matches(c))
            .collect();
        customers.sort_by_key(|c| c.slot_number);
        let warning_days = self.settings.customer_warning_days;
        Ok(customers
            .into_iter()
            .map(|customer| CustomerView {
                expiry_priority: classify_expiry(customer.expiry_date, now, warning_days),
                days_until_expiry: days_until(customer.expiry_date, now),
                customer,
            })
            .collect())
    }

    /// Customers across all of the owner's accounts, newest first.
    /// Statistics cover every customer of the owner.
    pub fn list_customers(&self, owner: Uuid, filter: &CustomerFilter, now: DateTime<Utc>) -> CustomerListResponse {
        let platforms = self.platform_map(owner);
        let accounts: HashMap<Uuid, Account> = self
            .accounts
            .iter()
            .filter(|r| r.owner_id == owner)
            .map(|r| (r.id, r.value().clone()))
            .collect();

        let owned: Vec<Customer> = self
            .customers
            .iter()
            .filter(|r| accounts.contains_key(&r.account_id))
            .map(|r| r.value().clone())
            .collect();
        let statistics = customer_statistics(&owned);

        let mut rows: Vec<CustomerWithAccount> = owned
            .into_iter()
            .filter_map(|customer| {
                let account = accounts.get(&customer.account_id)?;
                let platform = account.platform_id.and_then(|id| platforms.get(&id));
                filter.matches(&customer, account, platform).then(|| CustomerWithAccount {
                    expiry_priority: classify_expiry(customer.expiry_date, now, self.settings.customer_warning_days),
                    account_email: account.email.clone(),
                    platform_id: platform.map(|p| p.id),
                    platform_name: platform.map(|p| p.name.clone()),
                    customer,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.customer.created_at.cmp(&a.customer.created_at));

        CustomerListResponse { customers: rows, statistics }
    }

    pub fn get_customer(&self, owner: Uuid, account_id: Uuid, customer_id: Uuid) -> ResellerResult<Customer> {
        self.get_account(owner, account_id)?;
        self.customers
            .get(&customer_id)
            .filter(|r| r.account_id == account_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| ResellerError::not_found("customer", customer_id))
    }

    fn slot_error(slot: u32, rejection: SlotRejection) -> ResellerError {
        match rejection {
            SlotRejection::OutOfRange { max_customers } => {
                let mut errors = ValidationErrors::new();
                errors.add(
                    "slot_number",
                    format!("Slot must be between 1 and {max_customers}"),
                );
                ResellerError::Validation(errors)
            }
            SlotRejection::Taken => ResellerError::Conflict(format!("Slot {slot} is already taken")),
        }
    }

    pub fn create_customer(&self, owner: Uuid, account_id: Uuid, req: CreateCustomerRequest) -> ResellerResult<Customer> {
        self.get_account(owner, account_id)?;
        let duration = req.duration_days.unwrap_or(self.settings.default_duration_days);
        CustomerForm {
            customer_name: &req.customer_name,
            customer_email: req.customer_email.as_deref(),
            purchase_date: req.purchase_date,
            duration_days: Some(duration),
            expiry_date: None,
            amount_paid: req.amount_paid,
        }
        .validate()?;
        let expiry_date = customer_expiry(req.purchase_date, duration).ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.add("duration_days", "Duration is out of range");
            ResellerError::Validation(errors)
        })?;

        // Holding the account entry serializes slot assignment on it.
        let entry = self
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| ResellerError::not_found("account", account_id))?;
        let used = self.used_slots(account_id, None);
        let slot_number = match req.slot_number {
            Some(slot) => {
                check_slot(entry.max_customers, used, slot).map_err(|r| Self::slot_error(slot, r))?;
                slot
            }
            None => first_available_slot(entry.max_customers, used)
                .ok_or(ResellerError::NoAvailableSlots(account_id))?,
        };

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            account_id,
            customer_name: req.customer_name.trim().to_string(),
            customer_email: req.customer_email.filter(|e| !e.trim().is_empty()),
            customer_phone: req.customer_phone.filter(|p| !p.trim().is_empty()),
            purchase_date: req.purchase_date,
            duration_days: duration,
            expiry_date,
            amount_paid: req.amount_paid,
            payment_status: req.payment_status,
            notes: req.notes,
            slot_number,
            renewal_status: req.renewal_status,
            renewal_reminder_sent: false,
            created_at: now,
            updated_at: now,
        };
        self.customers.insert(customer.id, customer.clone());
        drop(entry);

        self.log_audit(
            owner,
            AuditAction::Create,
            "customer",
            customer.id,
            serde_json::json!({"name": &customer.customer_name, "slot": slot_number}),
        );
        Ok(customer)
    }

    /// Partial update. A new purchase date or duration recomputes the expiry
    /// unless an explicit expiry date is given.
    pub fn update_customer(
        &self,
        owner: Uuid,
        account_id: Uuid,
        customer_id: Uuid,
        req: UpdateCustomerRequest,
    ) -> ResellerResult<Customer> {
        let mut customer = self.get_customer(owner, account_id, customer_id)?;
        let reschedule = req.purchase_date.is_some() || req.duration_days.is_some();
        if let Some(name) = req.customer_name { customer.customer_name = name.trim().to_string(); }
        if let Some(email) = req.customer_email { customer.customer_email = Some(email).filter(|e| !e.trim().is_empty()); }
        if let Some(phone) = req.customer_phone { customer.customer_phone = Some(phone).filter(|p| !p.trim().is_empty()); }
        if let Some(date) = req.purchase_date { customer.purchase_date = date; }
        if let Some(days) = req.duration_days { customer.duration_days = days; }
        if let Some(amount) = req.amount_paid { customer.amount_paid = amount; }
        if let Some(status) = req.payment_status { customer.payment_status = status; }
        if let Some(notes) = req.notes { customer.notes = Some(notes); }
        if let Some(status) = req.renewal_status { customer.renewal_status = status; }
        if let Some(sent) = req.renewal_reminder_sent { customer.renewal_reminder_sent = sent; }

        match req.expiry_date {
            Some(date) => customer.expiry_date = date,
            None if reschedule => {
                if let Some(date) = customer_expiry(customer.purchase_date, customer.duration_days) {
                    customer.expiry_date = date;
                }
            }
            None => {}
        }

        CustomerForm {
            customer_name: &customer.customer_name,
            customer_email: customer.customer_email.as_deref(),
            purchase_date: customer.purchase_date,
            duration_days: req.duration_days,
            expiry_date: Some(customer.expiry_date),
            amount_paid: customer.amount_paid,
        }
        .validate()?;

        let entry = self
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| ResellerError::not_found("account", account_id))?;
        if let Some(slot) = req.slot_number.filter(|s| *s != customer.slot_number) {
            check_slot(entry.max_customers, self.used_slots(account_id, Some(customer_id)), slot)
                .map_err(|r| Self::slot_error(slot, r))?;
            customer.slot_number = slot;
        }
        customer.updated_at = Utc::now();
        self.customers.insert(customer_id, customer.clone());
        drop(entry);

        self.log_audit(owner, AuditAction::Update, "customer", customer_id, serde_json::json!({}));
        Ok(customer)
    }

    /// Removes the customer and its notes.
    pub fn delete_customer(&self, owner: Uuid, account_id: Uuid, customer_id: Uuid) -> ResellerResult<()> {
        self.get_customer(owner, account_id, customer_id)?;
        self.customers.remove(&customer_id);
        self.notes.retain(|_, n| n.customer_id != customer_id);
        self.log_audit(owner, AuditAction::Delete, "customer", customer_id, serde_json::json!({}));
        Ok(())
    }

    pub fn mark_renewal_reminder_sent(&self, owner: Uuid, account_id: Uuid, customer_id: Uuid) -> ResellerResult<()> {
        self.get_customer(owner, account_id, customer_id)?;
        if let Some(mut customer) = self.customers.get_mut(&customer_id) {
            customer.renewal_reminder_sent = true;
            customer.updated_at = Utc::now();
        }
        self.log_audit(owner, AuditAction::Reminder, "customer", customer_id, serde_json::json!({"renewal_reminder_sent": true}));
        Ok(())
    }

    // ─── Notes ─────────────────────────────────────────────────────────────

    /// Notes of a customer, newest first.
    pub fn list_notes(&self, owner: Uuid, account_id: Uuid, customer_id: Uuid) -> ResellerResult<Vec<CustomerNote>> {
        self.get_customer(owner, account_id, customer_id)?;
        let mut notes: Vec<CustomerNote> = self
            .notes
            .iter()
            .filter(|r| r.customer_id == customer_id)
            .map(|r| r.value().clone())
            .collect();
        notes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(notes)
    }

    pub fn add_note(
        &self,
        owner: Uuid,
        account_id: Uuid,
        customer_id: Uuid,
        req: CreateNoteRequest,
    ) -> ResellerResult<CustomerNote> {
        self.get_customer(owner, account_id, customer_id)?;
        let note_text = validate_note(&req.note_text)?;
        let now = Utc::now();
        let note = CustomerNote {
            id: Uuid::new_v4(),
            customer_id,
            account_id,
            note_text,
            timestamp: now,
            created_at: now,
            updated_at: now,
        };
        self.notes.insert(note.id, note.clone());
        self.log_audit(owner, AuditAction::Note, "customer", customer_id, serde_json::json!({"note_id": note.id}));
        Ok(note)
    }

    pub fn delete_note(&self, owner: Uuid, account_id: Uuid, customer_id: Uuid, note_id: Uuid) -> ResellerResult<()> {
        self.get_customer(owner, account_id, customer_id)?;
        self.notes
            .remove_if(&note_id, |_, n| n.customer_id == customer_id)
            .ok_or_else(|| ResellerError::not_found("note", note_id))?;
        self.log_audit(owner, AuditAction::Delete, "note", note_id, serde_json::json!({"customer_id": customer_id}));
        Ok(())
    }

    // ─── Financial records ─────────────────────────────────────────────────

    /// Filtered records of one account, latest date first. The summary
    /// covers every record of the account.
    pub fn list_records(&self, owner: Uuid, account_id: Uuid, filter: &RecordFilter) -> ResellerResult<RecordListResponse> {
        self.get_account(owner, account_id)?;
        let all: Vec<FinancialRecord> = self
            .records
            .iter()
            .filter(|r| r.account_id == account_id)
            .map(|r| r.value().clone())
            .collect();
        let summary = financial_summary(&all);

        let mut records: Vec<FinancialRecord> = all.into_iter().filter(|r| filter.matches(r)).collect();
        records.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(RecordListResponse { records, summary })
    }

    /// Filtered records across all of the owner's accounts. Statistics cover
    /// every record of the owner.
    pub fn ledger(&self, owner: Uuid, filter: &LedgerFilter, now: DateTime<Utc>) -> LedgerResponse {
        let today = now.date_naive();
        let platforms = self.platform_map(owner);
        let accounts: HashMap<Uuid, Account> = self
            .accounts
            .iter()
            .filter(|r| r.owner_id == owner)
            .map(|r| (r.id, r.value().clone()))
            .collect();

        let owned: Vec<FinancialRecord> = self
            .records
            .iter()
            .filter(|r| accounts.contains_key(&r.account_id))
            .map(|r| r.value().clone())
            .collect();
        let statistics = ledger_statistics(&owned);

        let mut entries: Vec<LedgerEntry> = owned
            .into_iter()
            .filter_map(|record| {
                let account = accounts.get(&record.account_id)?;
                let platform = account.platform_id.and_then(|id| platforms.get(&id));
                filter.matches(&record, account, platform, today).then(|| LedgerEntry {
                    account_email: account.email.clone(),
                    platform_id: platform.map(|p| p.id),
                    platform_name: platform.map(|p| p.name.clone()),
                    record,
                })
            })
            .collect();
        entries.sort_by(|a, b| b.record.date.cmp(&a.record.date).then(b.record.created_at.cmp(&a.record.created_at)));

        LedgerResponse { records: entries, statistics }
    }

    pub fn get_record(&self, owner: Uuid, account_id: Uuid, record_id: Uuid) -> ResellerResult<FinancialRecord> {
        self.get_account(owner, account_id)?;
        self.records
            .get(&record_id)
            .filter(|r| r.account_id == account_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| ResellerError::not_found("financial record", record_id))
    }

    pub fn create_record(&self, owner: Uuid, account_id: Uuid, req: CreateRecordRequest) -> ResellerResult<FinancialRecord> {
        self.get_account(owner, account_id)?;
        RecordForm {
            description: &req.description,
            amount: req.amount,
        }
        .validate()?;

        let now = Utc::now();
        let record = FinancialRecord {
            id: Uuid::new_v4(),
            account_id,
            amount: req.amount,
            record_type: req.record_type,
            description: req.description.trim().to_string(),
            date: req.date.unwrap_or_else(|| now.date_naive()),
            category: req.category.filter(|c| !c.trim().is_empty()),
            notes: req.notes,
            created_at: now,
            updated_at: now,
        };
        self.records.insert(record.id, record.clone());
        self.log_audit(
            owner,
            AuditAction::Create,
            "financial_record",
            record.id,
            serde_json::json!({"type": record.record_type, "amount": record.amount}),
        );
        Ok(record)
    }

    pub fn update_record(
        &self,
        owner: Uuid,
        account_id: Uuid,
        record_id: Uuid,
        req: UpdateRecordRequest,
    ) -> ResellerResult<FinancialRecord> {
        let mut record = self.get_record(owner, account_id, record_id)?;
        if let Some(amount) = req.amount { record.amount = amount; }
        if let Some(record_type) = req.record_type { record.record_type = record_type; }
        if let Some(description) = req.description { record.description = description.trim().to_string(); }
        if let Some(date) = req.date { record.date = date; }
        if let Some(category) = req.category { record.category = Some(category).filter(|c| !c.trim().is_empty()); }
        if let Some(notes) = req.notes { record.notes = Some(notes); }

        RecordForm {
            description: &record.description,
            amount: record.amount,
        }
        .validate()?;

        record.updated_at = Utc::now();
        self.records.insert(record_id, record.clone());
        self.log_audit(owner, AuditAction::Update, "financial_record", record_id, serde_json::json!({}));
        Ok(record)
    }

    pub fn delete_record(&self, owner: Uuid, account_id: Uuid, record_id: Uuid) -> ResellerResult<()> {
        self.get_record(owner, account_id, record_id)?;
        self.records.remove(&record_id);
        self.log_audit(owner, AuditAction::Delete, "financial_record", record_id, serde_json::json!({}));
        Ok(())
    }

    // ─── Preferences ───────────────────────────────────────────────────────

    pub fn get_preferences(&self, owner: Uuid) -> Preferences {
        self.preferences
            .get(&owner)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    pub fn save_preferences(&self, owner: Uuid, prefs: Preferences) -> ResellerResult<Preferences> {
        let prefs = prefs.normalized()?;
        self.preferences.insert(owner, prefs.clone());
        self.log_audit(owner, AuditAction::Update, "preferences", owner, serde_json::json!({}));
        Ok(prefs)
    }

    // ─── Reporting inputs ──────────────────────────────────────────────────

    /// Owners that have at least one platform or account.
    pub fn owners(&self) -> Vec<Uuid> {
        let mut owners: Vec<Uuid> = self
            .accounts
            .iter()
            .map(|r| r.owner_id)
            .chain(self.platforms.iter().map(|r| r.owner_id))
            .collect();
        owners.sort_unstable();
        owners.dedup();
        owners
    }

    pub fn owner_data(&self, owner: Uuid) -> OwnerData {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|r| r.owner_id == owner)
            .map(|r| r.value().clone())
            .collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let account_ids: std::collections::HashSet<Uuid> = accounts.iter().map(|a| a.id).collect();

        OwnerData {
            platforms: self.list_platforms(owner, &PlatformFilter::default()),
            customers: self
                .customers
                .iter()
                .filter(|r| account_ids.contains(&r.account_id))
                .map(|r| r.value().clone())
                .collect(),
            records: self
                .records
                .iter()
                .filter(|r| account_ids.contains(&r.account_id))
                .map(|r| r.value().clone())
                .collect(),
            accounts,
        }
    }

    // ─── Audit Log ─────────────────────────────────────────────────────────

    /// Owner's audit entries, newest first.
    pub fn get_audit_log(&self, owner: Uuid, limit: Option<usize>) -> Vec<AuditLogEntry> {
        let mut entries: Vec<AuditLogEntry> = self
            .audit_log
            .iter()
            .filter(|r| r.owner_id == owner)
            .map(|r| r.value().clone())
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }

    fn log_audit(&self, owner: Uuid, action: AuditAction, resource_type: &str, resource_id: Uuid, details: serde_json::Value) {
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            owner_id: owner,
            action,
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            details,
            timestamp: Utc::now(),
        };
        self.audit_log.insert(entry.id, entry);
        self.trim_audit_log(owner);
    }

    /// Drops the owner's oldest entries beyond `audit_max_entries`.
    fn trim_audit_log(&self, owner: Uuid) {
        let max = self.settings.audit_max_entries;
        let mut owned: Vec<(DateTime<Utc>, Uuid)> = self
            .audit_log
            .iter()
            .filter(|r| r.owner_id == owner)
            .map(|r| (r.timestamp, r.id))
            .collect();
        if owned.len() <= max {
            return;
        }
        owned.sort_unstable();
        let excess = owned.len() - max;
        for (_, id) in &owned[..excess] {
            self.audit_log.remove(id);
        }
    }
}
