use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::handlers::{health_handler, run_sweep_handler, AppState};
use crate::server::logging::request_logging_middleware;

#[cfg(feature = "admin-api")]
use crate::server::admin::{
    create_client_handler, create_contact_handler, create_license_handler, get_client_handler,
    list_client_licenses_handler, list_notifications_handler,
};

/// Build the application router.
///
/// # Routes
///
/// - `GET /health` - Service and database status
/// - `POST /api/v1/notifications/sweep` - Run a notification sweep now
///
/// ## Admin endpoints (requires `admin-api` feature)
/// - `POST /api/v1/contacts` - Create an admin contact
/// - `POST /api/v1/clients` - Create a client
/// - `GET /api/v1/clients/:client_id` - Get a client
/// - `POST /api/v1/clients/:client_id/licenses` - Issue a license
/// - `GET /api/v1/clients/:client_id/licenses` - List a client's licenses
/// - `GET /api/v1/notifications` - Notification audit log (`?client_id=` filter)
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/notifications/sweep", post(run_sweep_handler));

    #[cfg(feature = "admin-api")]
    let router = router
        .route("/api/v1/contacts", post(create_contact_handler))
        .route("/api/v1/clients", post(create_client_handler))
        .route("/api/v1/clients/:client_id", get(get_client_handler))
        .route(
            "/api/v1/clients/:client_id/licenses",
            post(create_license_handler).get(list_client_licenses_handler),
        )
        .route("/api/v1/notifications", get(list_notifications_handler));

    router
        .layer(middleware::from_fn(request_logging_middleware))
        .with_state(state)
}
