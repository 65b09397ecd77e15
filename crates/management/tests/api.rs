//! End-to-end tests of the REST surface, driving the router in-process.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use reseller_management::{management_router, ManagementState, ResellerStore};
use reseller_notifications::{MemoryNotifier, NotificationService};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

fn app() -> Router {
    app_with(NotificationService::disabled())
}

fn app_with(notifications: NotificationService) -> Router {
    management_router(ManagementState {
        store: Arc::new(ResellerStore::default()),
        notifications,
    })
}

async fn call(app: &Router, method: &str, uri: &str, owner: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(owner) = owner {
        builder = builder.header("x-user-id", owner.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn seed(app: &Router, owner: Uuid) -> (String, String) {
    let (status, platform) = call(
        app,
        "POST",
        "/api/v1/platforms",
        Some(owner),
        Some(json!({"name": "Netflix", "icon_value": "🎬", "color": "#E50914"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let platform_id = platform["id"].as_str().unwrap().to_string();

    let (status, account) = call(
        app,
        "POST",
        "/api/v1/accounts",
        Some(owner),
        Some(json!({
            "email": "Family@Example.com",
            "platform_id": platform_id,
            "account_type": "shared",
            "max_customers": 2,
            "purchase_date": "2024-01-01",
            "expiry_date": "2099-01-01",
            "total_amount": 1200.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (platform_id, account["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn requests_without_owner_are_unauthorized() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/v1/accounts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let request = Request::builder()
        .uri("/api/v1/accounts")
        .header("x-user-id", "not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn account_lifecycle_with_customers() {
    let app = app();
    let owner = Uuid::new_v4();
    let (_, account_id) = seed(&app, owner).await;

    let (status, list) = call(&app, "GET", "/api/v1/accounts?status=all&account_type=shared", Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["accounts"][0]["email"], "family@example.com");
    assert_eq!(list["accounts"][0]["platform"]["name"], "Netflix");
    assert_eq!(list["statistics"]["shared_accounts"], 1);

    let customers_uri = format!("/api/v1/accounts/{account_id}/customers");
    let (status, customer) = call(
        &app,
        "POST",
        &customers_uri,
        Some(owner),
        Some(json!({"customer_name": "Rahim", "purchase_date": "2024-06-01", "amount_paid": 300.0, "payment_status": "paid"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(customer["slot_number"], 1);
    assert_eq!(customer["expiry_date"], "2024-07-01");

    call(&app, "POST", &customers_uri, Some(owner), Some(json!({"customer_name": "Karim", "purchase_date": "2024-06-01"}))).await;
    let (status, body) = call(
        &app,
        "POST",
        &customers_uri,
        Some(owner),
        Some(json!({"customer_name": "Late", "purchase_date": "2024-06-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "no_available_slots");

    let (status, detail) = call(&app, "GET", &format!("/api/v1/accounts/{account_id}"), Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["customer_count"], 2);
    assert_eq!(detail["payment_breakdown"]["due_customers"], 1);

    let (status, filtered) = call(&app, "GET", &format!("{customers_uri}?payment_status=due"), Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filtered.as_array().unwrap().len(), 1);
    assert_eq!(filtered[0]["customer_name"], "Karim");

    let customer_id = customer["id"].as_str().unwrap();
    let notes_uri = format!("{customers_uri}/{customer_id}/notes");
    let (status, note) = call(&app, "POST", &notes_uri, Some(owner), Some(json!({"note_text": "  paid cash  "}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["note_text"], "paid cash");

    let (status, _) = call(&app, "DELETE", &format!("/api/v1/accounts/{account_id}"), Some(owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", &notes_uri, Some(owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_errors_list_fields() {
    let app = app();
    let owner = Uuid::new_v4();
    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/platforms",
        Some(owner),
        Some(json!({"name": "", "icon_type": "url", "icon_value": "not a url", "color": "red"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "icon_value", "color"]);

    let (status, _) = call(&app, "GET", "/api/v1/accounts?status=bogus", Some(owner), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn owners_cannot_see_each_other() {
    let app = app();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let (platform_id, account_id) = seed(&app, alice).await;

    let (status, _) = call(&app, "GET", &format!("/api/v1/accounts/{account_id}"), Some(bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "DELETE", &format!("/api/v1/platforms/{platform_id}"), Some(bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, list) = call(&app, "GET", "/api/v1/accounts", Some(bob), None).await;
    assert_eq!(list["accounts"].as_array().unwrap().len(), 0);

    let (status, _) = call(&app, "DELETE", &format!("/api/v1/platforms/{platform_id}"), Some(alice), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn records_feed_ledger_and_reports() {
    let app = app();
    let owner = Uuid::new_v4();
    let (_, account_id) = seed(&app, owner).await;
    let financial_uri = format!("/api/v1/accounts/{account_id}/financial");
    let today = chrono::Utc::now().date_naive().to_string();

    for (amount, kind, category) in [(500.0, "income", "Renewal"), (120.0, "expense", "Fees")] {
        let (status, _) = call(
            &app,
            "POST",
            &financial_uri,
            Some(owner),
            Some(json!({"amount": amount, "record_type": kind, "description": "entry", "date": today, "category": category})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, listed) = call(&app, "GET", &format!("{financial_uri}?record_type=income"), Some(owner), None).await;
    assert_eq!(listed["records"].as_array().unwrap().len(), 1);
    assert_eq!(listed["summary"]["total_income"], 500.0);

    let (_, ledger) = call(&app, "GET", "/api/v1/expenses?range=7days", Some(owner), None).await;
    assert_eq!(ledger["statistics"]["total_records"], 2);
    assert_eq!(ledger["statistics"]["net_profit"], 380.0);
    assert_eq!(ledger["records"][0]["platform_name"], "Netflix");

    let (status, report) = call(&app, "GET", "/api/v1/reports?range=3months", Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["range"], "3months");
    assert_eq!(report["revenue_by_category"][0]["category"], "Renewal");

    let (status, _) = call(&app, "GET", "/api/v1/reports?range=5years", Some(owner), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let request = Request::builder()
        .uri("/api/v1/reports/export")
        .header("x-user-id", owner.to_string())
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"].to_str().unwrap().starts_with("text/csv"));
    let csv = String::from_utf8(to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
    assert!(csv.starts_with("Report Generated:,"));
    assert!(csv.contains("Date Range:,12months"));
    assert!(csv.contains("Month,Income,Expenses,Profit"));

    let (status, dashboard) = call(&app, "GET", "/api/v1/dashboard", Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["stats"]["total_accounts"], 1);
    assert_eq!(dashboard["monthly"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn settings_round_trip() {
    let app = app();
    let owner = Uuid::new_v4();
    let (_, prefs) = call(&app, "GET", "/api/v1/settings", Some(owner), None).await;
    assert_eq!(prefs["durations"]["default_duration"], 30);
    assert_eq!(prefs["user"]["time_format"], "12");

    let (status, saved) = call(
        &app,
        "PUT",
        "/api/v1/settings",
        Some(owner),
        Some(json!({"notifications": {"new_account": false}, "durations": {"custom_durations": [60, 7, 7]}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["notifications"]["new_account"], false);
    assert_eq!(saved["notifications"]["new_customer"], true);
    assert_eq!(saved["durations"]["custom_durations"], json!([7, 60]));

    let (status, test) = call(&app, "POST", "/api/v1/settings/notifications/test", Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(test["sent"], true);
    assert_eq!(test["notifier"], "noop");

    let (_, log) = call(&app, "GET", "/api/v1/audit-log?limit=5", Some(owner), None).await;
    assert_eq!(log[0]["resource_type"], "preferences");
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let app = app();
    let owner = Uuid::new_v4();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/platforms")
        .header("x-user-id", owner.to_string())
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "bad_request");

    let (status, body) = call(&app, "POST", "/api/v1/platforms", Some(owner), Some(json!({"name": "Netflix"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].as_str().unwrap().contains("icon_value"));
}

#[tokio::test]
async fn platform_search_toggle_and_active_filter() {
    let app = app();
    let owner = Uuid::new_v4();
    let (platform_id, _) = seed(&app, owner).await;
    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/platforms",
        Some(owner),
        Some(json!({"name": "Spotify", "icon_value": "🎵", "color": "#1DB954", "category": "Music"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, found) = call(&app, "GET", "/api/v1/platforms?search=MUSIC", Some(owner), None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["name"], "Spotify");

    let (status, toggled) = call(&app, "POST", &format!("/api/v1/platforms/{platform_id}/toggle"), Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_active"], false);

    let (_, active) = call(&app, "GET", "/api/v1/platforms?active_only=true", Some(owner), None).await;
    assert_eq!(active.as_array().unwrap().len(), 1);
    assert_eq!(active[0]["name"], "Spotify");

    let (status, updated) = call(
        &app,
        "PUT",
        &format!("/api/v1/platforms/{platform_id}"),
        Some(owner),
        Some(json!({"description": "4K plan"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], "4K plan");
}

#[tokio::test]
async fn account_subresources_round_trip() {
    let app = app();
    let owner = Uuid::new_v4();
    let (_, account_id) = seed(&app, owner).await;

    let (status, login) = call(&app, "GET", &format!("/api/v1/accounts/{account_id}/login-instructions"), Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["platform_name"], "Netflix");

    let financial_uri = format!("/api/v1/accounts/{account_id}/financial");
    let (_, record) = call(
        &app,
        "POST",
        &financial_uri,
        Some(owner),
        Some(json!({"amount": 200.0, "record_type": "income", "description": "slot"})),
    )
    .await;
    let record_uri = format!("{financial_uri}/{}", record["id"].as_str().unwrap());
    let (status, updated) = call(&app, "PUT", &record_uri, Some(owner), Some(json!({"amount": 250.0}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["amount"], 250.0);
    let (status, _) = call(&app, "DELETE", &record_uri, Some(owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", &record_uri, Some(owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let customers_uri = format!("/api/v1/accounts/{account_id}/customers");
    let (_, customer) = call(
        &app,
        "POST",
        &customers_uri,
        Some(owner),
        Some(json!({"customer_name": "Rahim", "purchase_date": "2024-06-01"})),
    )
    .await;
    let notes_uri = format!("{customers_uri}/{}/notes", customer["id"].as_str().unwrap());
    let (_, note) = call(&app, "POST", &notes_uri, Some(owner), Some(json!({"note_text": "called"}))).await;
    let note_uri = format!("{notes_uri}/{}", note["id"].as_str().unwrap());
    let (status, _) = call(&app, "DELETE", &note_uri, Some(owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, notes) = call(&app, "GET", &notes_uri, Some(owner), None).await;
    assert!(notes.as_array().unwrap().is_empty());
}

async fn wait_for_sent(sink: &MemoryNotifier, count: usize) {
    for _ in 0..50 {
        if sink.sent().await.len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn creation_notifications_follow_preferences() {
    let sink = Arc::new(MemoryNotifier::new());
    let app = app_with(NotificationService::new(sink.clone(), "৳"));
    let owner = Uuid::new_v4();
    let (platform_id, account_id) = seed(&app, owner).await;
    wait_for_sent(&sink, 1).await;
    let sent = sink.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind(), Some("new_account"));

    let (status, _) = call(
        &app,
        "PUT",
        "/api/v1/settings",
        Some(owner),
        Some(json!({"notifications": {"new_account": false, "new_customer": false}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/accounts",
        Some(owner),
        Some(json!({
            "email": "second@example.com",
            "platform_id": platform_id,
            "max_customers": 1,
            "purchase_date": "2024-01-01",
            "expiry_date": "2099-01-01",
            "total_amount": 500.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/v1/accounts/{account_id}/customers"),
        Some(owner),
        Some(json!({"customer_name": "Rahim", "purchase_date": "2024-06-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sink.sent().await.len(), 1);
}
