use serde::Deserialize;
use std::path::Path;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `RESELLER_ADMIN__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub expiry: ExpiryConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Third-party push notification REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_push_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub rest_api_key: String,
    #[serde(default = "default_push_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpiryConfig {
    #[serde(default = "default_account_warning_days")]
    pub account_warning_days: u32,
    #[serde(default = "default_customer_warning_days")]
    pub customer_warning_days: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_reminders_enabled")]
    pub enabled: bool,
    #[serde(default = "default_reminder_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// JSON snapshot of the store. Unset keeps everything in memory only.
    #[serde(default)]
    pub snapshot_path: Option<String>,
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
    /// Audit entries kept per owner; older ones are dropped first.
    #[serde(default = "default_audit_max_entries")]
    pub audit_max_entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_duration_days")]
    pub duration_days: u32,
}

// Default functions
fn default_node_id() -> String {
    "reseller-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_push_api_url() -> String {
    "https://api.onesignal.com/notifications".to_string()
}
fn default_push_timeout_ms() -> u64 {
    5000
}
fn default_account_warning_days() -> u32 {
    7
}
fn default_customer_warning_days() -> u32 {
    30
}
fn default_reminders_enabled() -> bool {
    true
}
fn default_reminder_interval_secs() -> u64 {
    86_400
}
fn default_flush_interval_secs() -> u64 {
    60
}
fn default_audit_max_entries() -> usize {
    1000
}
fn default_currency() -> String {
    "BDT".to_string()
}
fn default_currency_symbol() -> String {
    "৳".to_string()
}
fn default_duration_days() -> u32 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: default_push_api_url(),
            app_id: String::new(),
            rest_api_key: String::new(),
            timeout_ms: default_push_timeout_ms(),
        }
    }
}

impl PushConfig {
    /// Push is only attempted when switched on and both credentials are present.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.app_id.is_empty() && !self.rest_api_key.is_empty()
    }
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            account_warning_days: default_account_warning_days(),
            customer_warning_days: default_customer_warning_days(),
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: default_reminders_enabled(),
            interval_secs: default_reminder_interval_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            flush_interval_secs: default_flush_interval_secs(),
            audit_max_entries: default_audit_max_entries(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            currency_symbol: default_currency_symbol(),
            duration_days: default_duration_days(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            push: PushConfig::default(),
            expiry: ExpiryConfig::default(),
            reminders: ReminderConfig::default(),
            storage: StorageConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables only.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from an optional file, then environment variables on top.
    pub fn load_from(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("RESELLER_ADMIN")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        tracing::debug!(file = ?file, "configuration sources loaded");
        config.try_deserialize()
    }
}
