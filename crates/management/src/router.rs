//! Reseller API router, mounted under /api/v1.

use crate::handlers::{self, ManagementState};
use axum::routing::{get, post};
use axum::Router;

/// Build the router with all endpoints. Merge it into the server's app.
pub fn management_router(state: ManagementState) -> Router {
    Router::new()
        // Platforms
        .route("/api/v1/platforms", get(handlers::list_platforms).post(handlers::create_platform))
        .route("/api/v1/platforms/:id", get(handlers::get_platform).put(handlers::update_platform).delete(handlers::delete_platform))
        .route("/api/v1/platforms/:id/toggle", post(handlers::toggle_platform))
        // Accounts
        .route("/api/v1/accounts", get(handlers::list_accounts).post(handlers::create_account))
        .route("/api/v1/accounts/:id", get(handlers::get_account).put(handlers::update_account).delete(handlers::delete_account))
        .route("/api/v1/accounts/:id/login-instructions", get(handlers::login_instructions))
        .route("/api/v1/accounts/:id/slots", get(handlers::account_slots))
        // Customers
        .route("/api/v1/accounts/:id/customers", get(handlers::list_account_customers).post(handlers::create_customer))
        .route("/api/v1/accounts/:id/customers/:customer_id", get(handlers::get_customer).put(handlers::update_customer).delete(handlers::delete_customer))
        .route("/api/v1/accounts/:id/customers/:customer_id/notes", get(handlers::list_notes).post(handlers::add_note))
        .route("/api/v1/accounts/:id/customers/:customer_id/notes/:note_id", axum::routing::delete(handlers::delete_note))
        .route("/api/v1/customers", get(handlers::list_customers))
        // Financial records
        .route("/api/v1/accounts/:id/financial", get(handlers::list_records).post(handlers::create_record))
        .route("/api/v1/accounts/:id/financial/:record_id", get(handlers::get_record).put(handlers::update_record).delete(handlers::delete_record))
        .route("/api/v1/expenses", get(handlers::ledger))
        // Dashboard & reports
        .route("/api/v1/dashboard", get(handlers::dashboard))
        .route("/api/v1/reports", get(handlers::report))
        .route("/api/v1/reports/export", get(handlers::export_report))
        // Settings
        .route("/api/v1/settings", get(handlers::get_settings).put(handlers::update_settings))
        .route("/api/v1/settings/notifications/test", post(handlers::test_notification))
        // Audit log
        .route("/api/v1/audit-log", get(handlers::audit_log))
        .with_state(state)
}
