//! Scheduled reminder sweep: payment-due notices, expiring-account alerts
//! and one-time renewal notices, each gated by the owner's settings.

use crate::store::ResellerStore;
use chrono::{DateTime, Utc};
use reseller_core::expiry::classify_expiry;
use reseller_core::types::{ExpiryPriority, PaymentStatus, RenewalStatus};
use reseller_notifications::NotificationService;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub owners: usize,
    pub payment_due: usize,
    pub accounts_expiring: usize,
    pub renewals: usize,
    pub failed: usize,
}

pub async fn run_reminder_sweep(
    store: &ResellerStore,
    notifications: &NotificationService,
    now: DateTime<Utc>,
) -> SweepSummary {
    let settings = store.settings().clone();
    let mut summary = SweepSummary::default();

    for owner in store.owners() {
        summary.owners += 1;
        let prefs = store.get_preferences(owner).notifications;
        let data = store.owner_data(owner);
        let platform_name = |platform_id| {
            data.platform(platform_id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "Unknown".to_string())
        };

        if prefs.payment_reminders {
            for customer in data.customers.iter().filter(|c| c.payment_status == PaymentStatus::Due) {
                if notifications.notify_payment_due(&customer.customer_name, customer.amount_paid).await {
                    summary.payment_due += 1;
                } else {
                    summary.failed += 1;
                }
            }

            for customer in data.customers.iter().filter(|c| {
                c.renewal_status == RenewalStatus::Pending
                    && !c.renewal_reminder_sent
                    && classify_expiry(c.expiry_date, now, settings.customer_warning_days)
                        == ExpiryPriority::ExpiringSoon
            }) {
                let platform_id = data.account(customer.account_id).and_then(|a| a.platform_id);
                let sent = notifications
                    .notify_renewal_due(&customer.customer_name, &platform_name(platform_id), customer.expiry_date)
                    .await;
                if !sent {
                    summary.failed += 1;
                    continue;
                }
                match store.mark_renewal_reminder_sent(owner, customer.account_id, customer.id) {
                    Ok(()) => summary.renewals += 1,
                    Err(e) => warn!(customer_id = %customer.id, error = %e, "renewal flag not saved"),
                }
            }
        }

        if prefs.expiring_account_alerts {
            for account in data.accounts.iter().filter(|a| {
                classify_expiry(a.expiry_date, now, settings.account_warning_days) == ExpiryPriority::ExpiringSoon
            }) {
                if notifications
                    .notify_account_expiring(&platform_name(account.platform_id), account.expiry_date)
                    .await
                {
                    summary.accounts_expiring += 1;
                } else {
                    summary.failed += 1;
                }
            }
        }
    }

    metrics::counter!("reminders.sweeps").increment(1);
    info!(
        owners = summary.owners,
        payment_due = summary.payment_due,
        accounts_expiring = summary.accounts_expiring,
        renewals = summary.renewals,
        failed = summary.failed,
        "reminder sweep finished"
    );
    summary
}

/// Run the sweep every `every`, first run one interval after start.
pub fn spawn_reminder_task(
    store: Arc<ResellerStore>,
    notifications: NotificationService,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            run_reminder_sweep(&store, &notifications, Utc::now()).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Preferences, UpdateAccountRequest};
    use crate::store::tests::{account_req, customer_req, date, platform_req};
    use chrono::TimeZone;
    use reseller_notifications::MemoryNotifier;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn fixture() -> (ResellerStore, Uuid, Arc<MemoryNotifier>, NotificationService) {
        let store = ResellerStore::default();
        let owner = Uuid::new_v4();
        let platform = store.create_platform(owner, platform_req("Netflix")).unwrap();
        let account = store.create_account(owner, account_req("family@example.com", platform.id, 3)).unwrap();
        store
            .update_account(
                owner,
                account.id,
                UpdateAccountRequest {
                    expiry_date: Some(date(2024, 6, 14)),
                    ..Default::default()
                },
            )
            .unwrap();

        // expires 2024-07-01: inside the 30 day customer window
        store.create_customer(owner, account.id, customer_req("Paid", None)).unwrap();
        let mut due = customer_req("Due", None);
        due.payment_status = PaymentStatus::Due;
        due.amount_paid = 150.0;
        store.create_customer(owner, account.id, due).unwrap();

        let sink = Arc::new(MemoryNotifier::new());
        let service = NotificationService::new(sink.clone(), "৳");
        (store, owner, sink, service)
    }

    #[tokio::test]
    async fn sweep_sends_each_kind_once() {
        let (store, _, sink, service) = fixture();

        let first = run_reminder_sweep(&store, &service, now()).await;
        assert_eq!(first.payment_due, 1);
        assert_eq!(first.accounts_expiring, 1);
        assert_eq!(first.renewals, 2);

        let sent = sink.sent().await;
        assert!(sent.iter().any(|p| p.contents.en == "Due has a payment of ৳150 due today"));
        assert!(sent.iter().any(|p| p.contents.en == "Your Netflix account expires on 2024-06-14"));

        let second = run_reminder_sweep(&store, &service, now()).await;
        assert_eq!(second.renewals, 0);
        assert_eq!(second.payment_due, 1);
    }

    #[tokio::test]
    async fn sweep_honours_owner_toggles() {
        let (store, owner, sink, service) = fixture();
        let mut prefs = Preferences::default();
        prefs.notifications.payment_reminders = false;
        prefs.notifications.expiring_account_alerts = false;
        store.save_preferences(owner, prefs).unwrap();

        let summary = run_reminder_sweep(&store, &service, now()).await;
        assert_eq!(summary, SweepSummary { owners: 1, ..Default::default() });
        assert!(sink.sent().await.is_empty());
    }
}
