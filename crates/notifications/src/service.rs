//! Business notifications. Each one is fire-and-forget: a failed delivery is
//! logged and counted, and the caller only sees `false`.

use crate::push::{NoopNotifier, NotificationPayload, Notifier, PushClient};
use chrono::NaiveDate;
use reseller_core::AppConfig;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
    currency_symbol: String,
}

impl NotificationService {
    pub fn new(notifier: Arc<dyn Notifier>, currency_symbol: impl Into<String>) -> Self {
        Self {
            notifier,
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Real push client when push is configured, otherwise a no-op sink.
    pub fn from_config(config: &AppConfig) -> Self {
        let notifier: Arc<dyn Notifier> = if config.push.is_usable() {
            match PushClient::new(&config.push) {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    warn!(error = %e, "push client unavailable, notifications disabled");
                    Arc::new(NoopNotifier)
                }
            }
        } else {
            Arc::new(NoopNotifier)
        };
        info!(notifier = notifier.name(), "notification service ready");
        Self::new(notifier, config.defaults.currency_symbol.clone())
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopNotifier), "")
    }

    pub fn notifier_name(&self) -> &'static str {
        self.notifier.name()
    }

    pub async fn dispatch(&self, payload: NotificationPayload) -> bool {
        let kind = payload.kind().unwrap_or("unknown").to_string();
        match self.notifier.send(&payload).await {
            Ok(()) => {
                metrics::counter!("notifications.sent", "type" => kind.clone()).increment(1);
                info!(kind = %kind, heading = %payload.headings.en, "notification sent");
                true
            }
            Err(e) => {
                metrics::counter!("notifications.failed", "type" => kind.clone()).increment(1);
                warn!(kind = %kind, error = %e, "notification failed");
                false
            }
        }
    }

    pub async fn notify_new_account(&self, account_email: &str, platform_name: &str) -> bool {
        self.dispatch(
            NotificationPayload::broadcast(
                "new_account",
                "New Account Created",
                format!("A new {platform_name} account has been created!"),
            )
            .with_data("userEmail", account_email)
            .with_data("platformName", platform_name),
        )
        .await
    }

    pub async fn notify_new_customer(&self, customer_name: &str, platform_name: &str) -> bool {
        self.dispatch(
            NotificationPayload::broadcast(
                "new_customer",
                "New Customer Added",
                format!("{customer_name} has been added to {platform_name} account"),
            )
            .with_data("customerName", customer_name)
            .with_data("platformName", platform_name),
        )
        .await
    }

    pub async fn notify_payment_due(&self, customer_name: &str, amount: f64) -> bool {
        self.dispatch(
            NotificationPayload::broadcast(
                "payment_due",
                "Payment Due Reminder",
                format!(
                    "{customer_name} has a payment of {}{} due today",
                    self.currency_symbol,
                    format_amount(amount)
                ),
            )
            .with_data("customerName", customer_name)
            .with_data("amount", amount),
        )
        .await
    }

    pub async fn notify_account_expiring(&self, platform_name: &str, expiry_date: NaiveDate) -> bool {
        let date = expiry_date.format("%Y-%m-%d").to_string();
        self.dispatch(
            NotificationPayload::broadcast(
                "account_expiring",
                "Account Expiring Soon",
                format!("Your {platform_name} account expires on {date}"),
            )
            .with_data("platformName", platform_name)
            .with_data("expiryDate", date.as_str()),
        )
        .await
    }

    pub async fn notify_renewal_due(&self, customer_name: &str, platform_name: &str, expiry_date: NaiveDate) -> bool {
        let date = expiry_date.format("%Y-%m-%d").to_string();
        self.dispatch(
            NotificationPayload::broadcast(
                "renewal_due",
                "Renewal Reminder",
                format!("{customer_name}'s {platform_name} subscription expires on {date}"),
            )
            .with_data("customerName", customer_name)
            .with_data("platformName", platform_name)
            .with_data("expiryDate", date.as_str()),
        )
        .await
    }

    pub async fn send_test(&self) -> bool {
        self.dispatch(NotificationPayload::broadcast(
            "test",
            "Test Notification",
            "This is a test notification from your reseller dashboard",
        ))
        .await
    }
}

/// Whole amounts print without decimals, others with up to two.
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        let s = format!("{amount:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::MemoryNotifier;
    use async_trait::async_trait;
    use reseller_core::{ResellerError, ResellerResult};

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _payload: &NotificationPayload) -> ResellerResult<()> {
            Err(ResellerError::Notification("boom".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn business_texts_match_templates() {
        let sink = Arc::new(MemoryNotifier::new());
        let service = NotificationService::new(sink.clone(), "৳");

        assert!(service.notify_new_account("a@b.co", "Netflix").await);
        assert!(service.notify_new_customer("Rahim", "Spotify").await);
        assert!(service.notify_payment_due("Karim", 300.0).await);
        assert!(
            service
                .notify_account_expiring("Netflix", NaiveDate::from_ymd_opt(2024, 7, 1).unwrap())
                .await
        );

        let sent = sink.sent().await;
        assert_eq!(sent[0].contents.en, "A new Netflix account has been created!");
        assert_eq!(sent[1].headings.en, "New Customer Added");
        assert_eq!(sent[1].contents.en, "Rahim has been added to Spotify account");
        assert_eq!(sent[2].contents.en, "Karim has a payment of ৳300 due today");
        assert_eq!(sent[3].contents.en, "Your Netflix account expires on 2024-07-01");
        assert_eq!(sent[3].kind(), Some("account_expiring"));
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let service = NotificationService::new(Arc::new(FailingNotifier), "$");
        assert!(!service.send_test().await);
    }

    #[test]
    fn unconfigured_push_falls_back_to_noop() {
        let service = NotificationService::from_config(&AppConfig::default());
        assert_eq!(service.notifier_name(), "noop");
    }

    #[test]
    fn amounts_drop_trailing_zeros() {
        assert_eq!(format_amount(300.0), "300");
        assert_eq!(format_amount(12.5), "12.5");
        assert_eq!(format_amount(9.99), "9.99");
    }
}
