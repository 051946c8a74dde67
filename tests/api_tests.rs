//! Router tests for the sweep trigger, health check and admin API.

#![cfg(feature = "sqlite")]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use license_portal::models::{LicenseType, NewAdminContact, NewClient, NewLicense, Package};
use license_portal::notifier::LogNotifier;
use license_portal::server::database::Database;
use license_portal::server::handlers::AppState;
use license_portal::server::logging::REQUEST_ID_HEADER;
use license_portal::server::routes::build_router;

/// Helper: in-memory database with the schema applied, plus app state.
async fn setup_test_app() -> AppState {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("db connect failed");
    let db = Database::SQLite(pool);
    db.run_migrations().await.expect("migrations failed");

    AppState::new(Arc::new(db), Arc::new(LogNotifier))
}

/// Helper to make a JSON request to the app.
async fn json_request(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let body_bytes = body
        .map(|v| serde_json::to_vec(&v).unwrap())
        .unwrap_or_default();

    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body_bytes))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

    (status, body)
}

async fn seed_client_with_license(state: &AppState, name: &str, expires_in: Duration) -> i64 {
    let contact = state
        .db
        .insert_admin_contact(NewAdminContact {
            username: format!("{name}-admin"),
            email: format!("{name}-admin@portal.test"),
        })
        .await
        .unwrap();
    let client = state
        .db
        .insert_client(NewClient {
            client_name: name.to_string(),
            poc_contact_name: "Contact".to_string(),
            poc_contact_email: format!("contact@{name}.test"),
            admin_poc_id: contact.id,
        })
        .await
        .unwrap();
    let now = Utc::now();
    state
        .db
        .insert_license(NewLicense {
            client_id: client.id,
            package: Package::JavascriptSdk,
            license_type: LicenseType::Production,
            created_datetime: now,
            expiration_datetime: now + expires_in,
        })
        .await
        .unwrap();
    client.id
}

#[tokio::test]
async fn health_reports_database() {
    let state = setup_test_app().await;
    let (status, body) = json_request(build_router(state), "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["db_type"], "sqlite");
}

#[tokio::test]
async fn responses_carry_request_id() {
    let state = setup_test_app().await;
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = build_router(state).oneshot(request).await.unwrap();
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn sweep_with_nothing_due_notifies_nobody() {
    let state = setup_test_app().await;
    let (status, body) =
        json_request(build_router(state), "POST", "/api/v1/notifications/sweep", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notified_clients"], 0);
    assert_eq!(body["message"], "0 client(s) notified.");
}

#[tokio::test]
async fn sweep_notifies_clients_with_imminent_licenses() {
    let state = setup_test_app().await;
    let due = seed_client_with_license(&state, "soon", Duration::days(2)).await;
    seed_client_with_license(&state, "later", Duration::days(200)).await;

    let (status, body) = json_request(
        build_router(state.clone()),
        "POST",
        "/api/v1/notifications/sweep",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notified_clients"], 1);
    assert_eq!(body["message"], "1 client(s) notified.");

    let summaries = state.db.list_notification_summaries(None).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].client_id, due);
}

#[tokio::test]
async fn sweep_storage_failure_is_a_server_error() {
    let state = setup_test_app().await;
    match &*state.db {
        Database::SQLite(pool) => {
            sqlx::query("DROP TABLE licenses")
                .execute(pool)
                .await
                .unwrap();
        }
        #[cfg(feature = "postgres")]
        Database::Postgres(_) => unreachable!(),
    }

    let (status, body) =
        json_request(build_router(state), "POST", "/api/v1/notifications/sweep", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("database error"));
}

#[tokio::test]
async fn sweep_rejects_get() {
    let state = setup_test_app().await;
    let (status, _) =
        json_request(build_router(state), "GET", "/api/v1/notifications/sweep", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[cfg(feature = "admin-api")]
mod admin {
    use super::*;

    async fn create_contact(state: &AppState) -> i64 {
        let (status, body) = json_request(
            build_router(state.clone()),
            "POST",
            "/api/v1/contacts",
            Some(json!({ "username": "ops", "email": "ops@portal.test" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }

    async fn create_client(state: &AppState, admin_poc_id: i64) -> i64 {
        let (status, body) = json_request(
            build_router(state.clone()),
            "POST",
            "/api/v1/clients",
            Some(json!({
                "client_name": "Initech",
                "poc_contact_name": "Bill Lumbergh",
                "poc_contact_email": "bill@initech.test",
                "admin_poc_id": admin_poc_id
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["admin_poc"]["email"], "ops@portal.test");
        body["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn create_client_and_issue_license_with_default_expiration() {
        let state = setup_test_app().await;
        let contact_id = create_contact(&state).await;
        let client_id = create_client(&state, contact_id).await;

        let (status, body) = json_request(
            build_router(state.clone()),
            "POST",
            &format!("/api/v1/clients/{client_id}/licenses"),
            Some(json!({ "package": "ios_sdk", "license_type": "evaluation" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["package"], "ios_sdk");

        let (status, body) = json_request(
            build_router(state.clone()),
            "GET",
            &format!("/api/v1/clients/{client_id}/licenses"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let licenses = body.as_array().unwrap();
        assert_eq!(licenses.len(), 1);

        let created: chrono::DateTime<Utc> =
            serde_json::from_value(licenses[0]["created_datetime"].clone()).unwrap();
        let expires: chrono::DateTime<Utc> =
            serde_json::from_value(licenses[0]["expiration_datetime"].clone()).unwrap();
        assert_eq!(expires - created, Duration::days(90));
    }

    #[tokio::test]
    async fn explicit_expiration_is_used() {
        let state = setup_test_app().await;
        let contact_id = create_contact(&state).await;
        let client_id = create_client(&state, contact_id).await;

        let (status, body) = json_request(
            build_router(state),
            "POST",
            &format!("/api/v1/clients/{client_id}/licenses"),
            Some(json!({
                "package": "android_sdk",
                "license_type": "production",
                "expiration_datetime": "2030-01-31T00:00:00Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["expiration_datetime"], "2030-01-31T00:00:00Z");
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let state = setup_test_app().await;
        let (status, body) = json_request(
            build_router(state),
            "POST",
            "/api/v1/contacts",
            Some(json!({ "username": "ops", "email": "not-an-email" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn client_with_unknown_admin_is_not_found() {
        let state = setup_test_app().await;
        let (status, _) = json_request(
            build_router(state),
            "POST",
            "/api/v1/clients",
            Some(json!({
                "client_name": "Orphan",
                "poc_contact_name": "Nobody",
                "poc_contact_email": "nobody@orphan.test",
                "admin_poc_id": 999
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn licenses_of_unknown_client_are_not_found() {
        let state = setup_test_app().await;
        let (status, _) =
            json_request(build_router(state), "GET", "/api/v1/clients/77/licenses", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_expiration_is_rejected() {
        let state = setup_test_app().await;
        let contact_id = create_contact(&state).await;
        let client_id = create_client(&state, contact_id).await;

        let (status, _) = json_request(
            build_router(state),
            "POST",
            &format!("/api/v1/clients/{client_id}/licenses"),
            Some(json!({
                "package": "ios_sdk",
                "license_type": "production",
                "expiration_datetime": "31/01/2030"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn notification_log_lists_sweep_results() {
        let state = setup_test_app().await;
        let client_id = seed_client_with_license(&state, "audited", Duration::days(1)).await;

        let (status, _) = json_request(
            build_router(state.clone()),
            "POST",
            "/api/v1/notifications/sweep",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = json_request(
            build_router(state),
            "GET",
            &format!("/api/v1/notifications?client_id={client_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["quantity_of_notified_licenses"], 1);
    }
}
