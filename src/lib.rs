//! License Portal - client license tracking with scheduled expiration notices.
//!
//! # Features
//!
//! - `server` - HTTP surface and SQL-backed store. Enabled by default.
//! - `sqlite` - SQLite database backend. Enabled by default.
//! - `postgres` - PostgreSQL database backend.
//! - `admin-api` - CRUD endpoints for contacts, clients and licenses.
//! - `background-jobs` - Cron-driven notification sweep.
//!
//! The notice rules ([`eligibility`]) and the sweep ([`sweep`]) need neither
//! a server nor a database: any [`store::LicenseStore`] and
//! [`notifier::Notifier`] will do.

pub mod config;
pub mod eligibility;
pub mod errors;
pub mod models;
pub mod notifier;
pub mod store;
pub mod sweep;

#[cfg(feature = "server")]
#[path = "server/mod.rs"]
pub mod server;

#[cfg(feature = "background-jobs")]
pub mod jobs;
