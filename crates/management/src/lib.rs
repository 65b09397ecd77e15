//! Reseller management backend: platforms, shared accounts, customers and
//! their slots, notes, income/expense records, settings and the audit log.
//!
//! Data lives in DashMap tables and can be persisted as a JSON snapshot.

pub mod auth;
pub mod handlers;
pub mod models;
pub mod reminders;
pub mod router;
pub mod snapshot;
pub mod store;

pub use handlers::ManagementState;
pub use reminders::{run_reminder_sweep, spawn_reminder_task};
pub use router::management_router;
pub use snapshot::{spawn_flush_task, Snapshot};
pub use store::{ResellerStore, StoreSettings};
