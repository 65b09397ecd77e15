//! Axum REST handlers for the reseller API.

use crate::auth::Owner;
use crate::models::*;
use crate::store::ResellerStore;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use reseller_core::types::{Account, Customer, CustomerNote, FinancialRecord, Platform};
use reseller_core::{ResellerError, ValidationErrors};
use reseller_notifications::NotificationService;
use reseller_reporting::{
    build_dashboard, build_report, export_csv, export_file_name, Dashboard, DashboardInput, Report,
    ReportInput, ReportRange,
};
use std::sync::Arc;
use uuid::Uuid;

/// Shared handler state.
#[derive(Clone)]
pub struct ManagementState {
    pub store: Arc<ResellerStore>,
    pub notifications: NotificationService,
}

// ─── Errors ────────────────────────────────────────────────────────────────

/// Error returned by every handler; renders as [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError(pub ResellerError);

impl From<ResellerError> for ApiError {
    fn from(err: ResellerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            ResellerError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            ResellerError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_failed"),
            ResellerError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ResellerError::NoAvailableSlots(_) => (StatusCode::CONFLICT, "no_available_slots"),
            ResellerError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ResellerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
            ErrorResponse {
                error: code.to_string(),
                message: "Internal server error".to_string(),
                fields: None,
            }
        } else {
            ErrorResponse::from_error(code, &self.0)
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ResellerError::BadRequest(rejection.body_text()))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON body extractor whose rejections render as [`ErrorResponse`].
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

// ─── Platforms ─────────────────────────────────────────────────────────────

pub async fn list_platforms(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Query(query): Query<PlatformQuery>,
) -> Json<Vec<Platform>> {
    Json(state.store.list_platforms(owner, &query.into_filter()))
}

pub async fn get_platform(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Platform>> {
    Ok(Json(state.store.get_platform(owner, id)?))
}

pub async fn create_platform(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    ApiJson(req): ApiJson<CreatePlatformRequest>,
) -> ApiResult<(StatusCode, Json<Platform>)> {
    let platform = state.store.create_platform(owner, req)?;
    metrics::counter!("management.platforms.created").increment(1);
    Ok((StatusCode::CREATED, Json(platform)))
}

pub async fn update_platform(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdatePlatformRequest>,
) -> ApiResult<Json<Platform>> {
    Ok(Json(state.store.update_platform(owner, id, req)?))
}

pub async fn toggle_platform(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Platform>> {
    Ok(Json(state.store.toggle_platform(owner, id)?))
}

pub async fn delete_platform(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.store.delete_platform(owner, id)?;
    metrics::counter!("management.platforms.deleted").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

// ─── Accounts ──────────────────────────────────────────────────────────────

pub async fn list_accounts(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Query(query): Query<AccountQuery>,
) -> ApiResult<Json<AccountListResponse>> {
    let filter = query.into_filter()?;
    Ok(Json(state.store.list_accounts(owner, &filter, Utc::now())))
}

pub async fn get_account(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AccountDetail>> {
    Ok(Json(state.store.account_detail(owner, id, Utc::now())?))
}

pub async fn create_account(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    ApiJson(req): ApiJson<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    let account = state.store.create_account(owner, req)?;
    metrics::counter!("management.accounts.created").increment(1);

    if state.store.get_preferences(owner).notifications.new_account {
        let platform_name = platform_name(&state.store, owner, account.platform_id);
        let notifications = state.notifications.clone();
        let email = account.email.clone();
        tokio::spawn(async move {
            notifications.notify_new_account(&email, &platform_name).await;
        });
    }
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn update_account(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateAccountRequest>,
) -> ApiResult<Json<Account>> {
    Ok(Json(state.store.update_account(owner, id, req)?))
}

pub async fn delete_account(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.store.delete_account(owner, id)?;
    metrics::counter!("management.accounts.deleted").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn login_instructions(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LoginInstructions>> {
    Ok(Json(state.store.login_instructions(owner, id)?))
}

pub async fn account_slots(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SlotsResponse>> {
    Ok(Json(state.store.account_slots(owner, id)?))
}

fn platform_name(store: &ResellerStore, owner: Uuid, platform_id: Option<Uuid>) -> String {
    platform_id
        .and_then(|id| store.get_platform(owner, id).ok())
        .map(|p| p.name)
        .unwrap_or_else(|| "Unknown".to_string())
}

// ─── Customers ─────────────────────────────────────────────────────────────

pub async fn list_account_customers(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path(account_id): Path<Uuid>,
    Query(query): Query<AccountCustomerQuery>,
) -> ApiResult<Json<Vec<CustomerView>>> {
    let filter = query.into_filter()?;
    Ok(Json(state.store.list_account_customers(owner, account_id, &filter, Utc::now())?))
}

pub async fn list_customers(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Query(query): Query<CustomerQuery>,
) -> ApiResult<Json<CustomerListResponse>> {
    let filter = query.into_filter()?;
    Ok(Json(state.store.list_customers(owner, &filter, Utc::now())))
}

pub async fn get_customer(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path((account_id, customer_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.store.get_customer(owner, account_id, customer_id)?))
}

pub async fn create_customer(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path(account_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateCustomerRequest>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.store.create_customer(owner, account_id, req)?;
    metrics::counter!("management.customers.created").increment(1);

    if state.store.get_preferences(owner).notifications.new_customer {
        let account_platform = state.store.get_account(owner, account_id).ok().and_then(|a| a.platform_id);
        let platform_name = platform_name(&state.store, owner, account_platform);
        let notifications = state.notifications.clone();
        let name = customer.customer_name.clone();
        tokio::spawn(async move {
            notifications.notify_new_customer(&name, &platform_name).await;
        });
    }
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path((account_id, customer_id)): Path<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<UpdateCustomerRequest>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.store.update_customer(owner, account_id, customer_id, req)?))
}

pub async fn delete_customer(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path((account_id, customer_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state.store.delete_customer(owner, account_id, customer_id)?;
    metrics::counter!("management.customers.deleted").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

// ─── Notes ─────────────────────────────────────────────────────────────────

pub async fn list_notes(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path((account_id, customer_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<CustomerNote>>> {
    Ok(Json(state.store.list_notes(owner, account_id, customer_id)?))
}

pub async fn add_note(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path((account_id, customer_id)): Path<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<CustomerNote>)> {
    let note = state.store.add_note(owner, account_id, customer_id, req)?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn delete_note(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path((account_id, customer_id, note_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state.store.delete_note(owner, account_id, customer_id, note_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Financial records ─────────────────────────────────────────────────────

pub async fn list_records(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path(account_id): Path<Uuid>,
    Query(query): Query<RecordQuery>,
) -> ApiResult<Json<RecordListResponse>> {
    let filter = query.into_filter()?;
    Ok(Json(state.store.list_records(owner, account_id, &filter)?))
}

pub async fn get_record(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path((account_id, record_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<FinancialRecord>> {
    Ok(Json(state.store.get_record(owner, account_id, record_id)?))
}

pub async fn create_record(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path(account_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateRecordRequest>,
) -> ApiResult<(StatusCode, Json<FinancialRecord>)> {
    let record = state.store.create_record(owner, account_id, req)?;
    metrics::counter!("management.records.created", "type" => record.record_type.as_str()).increment(1);
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_record(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path((account_id, record_id)): Path<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<UpdateRecordRequest>,
) -> ApiResult<Json<FinancialRecord>> {
    Ok(Json(state.store.update_record(owner, account_id, record_id, req)?))
}

pub async fn delete_record(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Path((account_id, record_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state.store.delete_record(owner, account_id, record_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn ledger(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Query(query): Query<LedgerQuery>,
) -> ApiResult<Json<LedgerResponse>> {
    let filter = query.into_filter()?;
    Ok(Json(state.store.ledger(owner, &filter, Utc::now())))
}

// ─── Dashboard & reports ───────────────────────────────────────────────────

pub async fn dashboard(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
) -> Json<Dashboard> {
    let data = state.store.owner_data(owner);
    Json(build_dashboard(
        DashboardInput {
            accounts: &data.accounts,
            customers: &data.customers,
            platforms: &data.platforms,
        },
        Utc::now(),
        state.store.settings().account_warning_days,
    ))
}

fn parse_range(query: &ReportQuery) -> Result<ReportRange, ApiError> {
    match query.range.as_deref().map(str::trim) {
        None | Some("") => Ok(ReportRange::default()),
        Some(v) => v.parse().map_err(|e: reseller_core::types::UnknownVariant| {
            let mut errors = ValidationErrors::new();
            errors.add("range", e.to_string());
            ApiError(ResellerError::Validation(errors))
        }),
    }
}

fn owner_report(store: &ResellerStore, owner: Uuid, range: ReportRange) -> Report {
    let data = store.owner_data(owner);
    build_report(
        ReportInput {
            accounts: &data.accounts,
            customers: &data.customers,
            records: &data.records,
            platforms: &data.platforms,
        },
        range,
        Utc::now(),
    )
}

pub async fn report(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Report>> {
    let range = parse_range(&query)?;
    Ok(Json(owner_report(&state.store, owner, range)))
}

pub async fn export_report(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Response> {
    let range = parse_range(&query)?;
    let report = owner_report(&state.store, owner, range);
    let today = report.generated_at.date_naive();
    let disposition = format!("attachment; filename=\"{}\"", export_file_name(today));
    metrics::counter!("reporting.exports").increment(1);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export_csv(&report, today),
    )
        .into_response())
}

// ─── Settings ──────────────────────────────────────────────────────────────

pub async fn get_settings(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
) -> Json<Preferences> {
    Json(state.store.get_preferences(owner))
}

pub async fn update_settings(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    ApiJson(prefs): ApiJson<Preferences>,
) -> ApiResult<Json<Preferences>> {
    Ok(Json(state.store.save_preferences(owner, prefs)?))
}

/// Sent inline so the caller learns whether delivery worked.
pub async fn test_notification(
    State(state): State<ManagementState>,
    Owner(_owner): Owner,
) -> Json<NotificationTestResponse> {
    let sent = state.notifications.send_test().await;
    Json(NotificationTestResponse {
        sent,
        notifier: state.notifications.notifier_name(),
    })
}

// ─── Audit Log ─────────────────────────────────────────────────────────────

pub async fn audit_log(
    State(state): State<ManagementState>,
    Owner(owner): Owner,
    Query(query): Query<AuditQuery>,
) -> Json<Vec<AuditLogEntry>> {
    Json(state.store.get_audit_log(owner, query.limit))
}
