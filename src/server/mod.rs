// src/server/mod.rs

//! Server-side components.
//!
//! - `database`    → `LicenseStore` over SQLite/Postgres
//! - `handlers`    → sweep trigger, health check, shared state
//! - `routes`      → router builder
//! - `logging`     → tracing setup and request logging middleware
//! - `validation`  → request validation utilities
//! - `admin`       → CRUD endpoints (requires `admin-api` feature)

pub mod database;
pub mod handlers;
pub mod logging;
pub mod routes;
pub mod validation;

#[cfg(feature = "admin-api")]
pub mod admin;

pub use database::Database;
pub use handlers::{health_handler, run_sweep_handler, AppState, SweepResponse};
pub use logging::{init_tracing, request_logging_middleware};
pub use routes::build_router;

#[cfg(feature = "admin-api")]
pub use admin::{
    create_client_handler, create_contact_handler, create_license_handler, get_client_handler,
    list_client_licenses_handler, list_notifications_handler, CreateClientRequest,
    CreateContactRequest, CreateLicenseRequest,
};

pub use validation::{
    validate_datetime, validate_email, validate_length, validate_not_empty, ValidationError,
    ValidationResult,
};
