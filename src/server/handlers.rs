use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::eligibility::WindowRules;
use crate::errors::{PortalError, PortalResult};
use crate::models::DEFAULT_LICENSE_EXPIRATION_DAYS;
use crate::notifier::Notifier;
use crate::server::database::Database;
use crate::server::logging::HealthResponse;
use crate::sweep::{run_notification_sweep, SweepReport};

/// Shared application state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub notifier: Arc<dyn Notifier>,
    pub rules: Arc<WindowRules>,
    /// Expiration applied to licenses created without one
    pub default_expiration_days: i64,
}

impl AppState {
    /// State with default window rules and expiration.
    pub fn new(db: Arc<Database>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            notifier,
            rules: Arc::new(WindowRules::default()),
            default_expiration_days: DEFAULT_LICENSE_EXPIRATION_DAYS,
        }
    }

    pub fn with_rules(mut self, rules: WindowRules) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    pub fn with_default_expiration_days(mut self, days: i64) -> Self {
        self.default_expiration_days = days;
        self
    }
}

/// Standard error response body for HTTP errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Lets handlers return `PortalResult<Json<T>>`.
impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = match self {
            PortalError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::NotifierError(_) => StatusCode::BAD_GATEWAY,
            PortalError::ConfigError(_) | PortalError::StorageError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Response of the sweep trigger.
#[derive(Debug, Serialize, Deserialize)]
pub struct SweepResponse {
    pub notified_clients: u32,
    pub message: String,
    pub skipped_clients: u32,
    pub failed_clients: u32,
}

impl From<SweepReport> for SweepResponse {
    fn from(report: SweepReport) -> Self {
        Self {
            notified_clients: report.notified_clients,
            message: report.message(),
            skipped_clients: report.skipped_clients,
            failed_clients: report.failed_clients,
        }
    }
}

/// Run a notification sweep as of now.
///
/// Invoking this twice on the same day sends duplicate notices; the caller
/// is expected to trigger it at most once per day.
pub async fn run_sweep_handler(State(state): State<AppState>) -> PortalResult<Json<SweepResponse>> {
    let now = Utc::now();
    info!("Notification sweep requested at {}", now);

    let report = run_notification_sweep(&*state.db, &*state.notifier, &state.rules, now).await?;

    Ok(Json(report.into()))
}

/// Service and database status.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.db.ping().await;
    Json(HealthResponse::healthy(connected, state.db.db_type()))
}
