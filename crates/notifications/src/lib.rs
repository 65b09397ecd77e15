//! Push notifications for reseller events: account and customer creation,
//! payment reminders and expiry warnings.

pub mod push;
pub mod service;

pub use push::{MemoryNotifier, NoopNotifier, NotificationPayload, Notifier, PushClient};
pub use service::NotificationService;
