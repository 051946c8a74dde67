//! Admin API for contacts, clients and licenses.
//!
//! Requires the `admin-api` feature.
//!
//! # Endpoints
//!
//! - `POST /api/v1/contacts` - Create an admin contact
//! - `POST /api/v1/clients` - Create a client
//! - `GET /api/v1/clients/:client_id` - Get a client
//! - `POST /api/v1/clients/:client_id/licenses` - Issue a license
//! - `GET /api/v1/clients/:client_id/licenses` - List a client's licenses
//! - `GET /api/v1/notifications` - Notification audit log

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{PortalError, PortalResult};
use crate::models::{
    AdminContact, Client, License, LicenseType, NewAdminContact, NewClient, NewLicense,
    NotificationSummary, Package,
};
use crate::server::handlers::AppState;
use crate::server::validation::{
    validate_datetime, validate_email, validate_length, validate_not_empty,
};
use crate::store::LicenseStore;

const MAX_NAME_LENGTH: usize = 120;

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateContactRequest {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateClientRequest {
    pub client_name: String,
    pub poc_contact_name: String,
    pub poc_contact_email: String,
    pub admin_poc_id: i64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateLicenseRequest {
    pub package: Package,
    pub license_type: LicenseType,
    /// RFC 3339; defaults to now plus the configured expiration period
    #[serde(default)]
    pub expiration_datetime: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub client_id: Option<i64>,
}

/// Create an admin contact.
pub async fn create_contact_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateContactRequest>,
) -> PortalResult<(StatusCode, Json<AdminContact>)> {
    validate_not_empty(&payload.username, "username")?;
    validate_length(&payload.username, "username", 1, MAX_NAME_LENGTH)?;
    validate_email(&payload.email, "email")?;

    let contact = state
        .db
        .insert_admin_contact(NewAdminContact {
            username: payload.username.trim().to_string(),
            email: payload.email,
        })
        .await?;

    info!(contact_id = contact.id, "Admin contact created");
    Ok((StatusCode::CREATED, Json(contact)))
}

/// Create a client owned by an existing admin contact.
pub async fn create_client_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateClientRequest>,
) -> PortalResult<(StatusCode, Json<Client>)> {
    validate_not_empty(&payload.client_name, "client_name")?;
    validate_length(&payload.client_name, "client_name", 1, MAX_NAME_LENGTH)?;
    validate_not_empty(&payload.poc_contact_name, "poc_contact_name")?;
    validate_length(&payload.poc_contact_name, "poc_contact_name", 1, MAX_NAME_LENGTH)?;
    validate_email(&payload.poc_contact_email, "poc_contact_email")?;

    let client = state
        .db
        .insert_client(NewClient {
            client_name: payload.client_name.trim().to_string(),
            poc_contact_name: payload.poc_contact_name.trim().to_string(),
            poc_contact_email: payload.poc_contact_email,
            admin_poc_id: payload.admin_poc_id,
        })
        .await?;

    info!(client_id = client.id, client = %client, "Client created");
    Ok((StatusCode::CREATED, Json(client)))
}

async fn existing_client(state: &AppState, client_id: i64) -> PortalResult<Client> {
    state
        .db
        .get_client(client_id)
        .await?
        .ok_or_else(|| PortalError::NotFound(format!("client {client_id}")))
}

pub async fn get_client_handler(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
) -> PortalResult<Json<Client>> {
    Ok(Json(existing_client(&state, client_id).await?))
}

/// Issue a license to a client.
pub async fn create_license_handler(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
    Json(payload): Json<CreateLicenseRequest>,
) -> PortalResult<(StatusCode, Json<License>)> {
    existing_client(&state, client_id).await?;

    let expiration = payload
        .expiration_datetime
        .as_deref()
        .map(|value| validate_datetime(value, "expiration_datetime"))
        .transpose()?;

    let license = state
        .db
        .insert_license(NewLicense::issued(
            client_id,
            payload.package,
            payload.license_type,
            Utc::now(),
            expiration,
            state.default_expiration_days,
        )?)
        .await?;

    info!(
        license_id = license.id,
        client_id,
        expiration = ?license.expiration_datetime,
        "License issued"
    );
    Ok((StatusCode::CREATED, Json(license)))
}

pub async fn list_client_licenses_handler(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
) -> PortalResult<Json<Vec<License>>> {
    existing_client(&state, client_id).await?;
    Ok(Json(state.db.licenses_for_client(client_id).await?))
}

/// Notification audit log, newest first.
pub async fn list_notifications_handler(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> PortalResult<Json<Vec<NotificationSummary>>> {
    Ok(Json(
        state.db.list_notification_summaries(query.client_id).await?,
    ))
}
