use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use license_portal::config::init_config;
use license_portal::eligibility::WindowRules;
use license_portal::errors::{PortalError, PortalResult};
use license_portal::notifier::notifier_from_config;
use license_portal::server::{build_router, init_tracing, AppState, Database};

#[cfg(feature = "background-jobs")]
use license_portal::jobs::{JobConfig, JobScheduler};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Server exited with error: {e}");
        eprintln!("license_portal_server: {e}");
        std::process::exit(1);
    }
}

async fn run() -> PortalResult<()> {
    let config = init_config()?;
    init_tracing(&config.logging);

    let db = Arc::new(Database::connect(&config.database).await?);
    db.run_migrations().await?;
    info!("Connected to {} database", db.db_type());

    let notifier = notifier_from_config(&config.notifier)?;
    let rules = WindowRules::from_config(&config.notifications)?;

    #[cfg(feature = "background-jobs")]
    let _scheduler = if config.jobs.sweep_enabled {
        let scheduler = JobScheduler::new(
            Arc::clone(&db),
            Arc::clone(&notifier),
            Arc::new(rules.clone()),
            JobConfig::from(&config.jobs),
        )
        .await
        .map_err(|e| PortalError::ConfigError(e.to_string()))?;
        scheduler
            .start()
            .await
            .map_err(|e| PortalError::ConfigError(e.to_string()))?;
        Some(scheduler)
    } else {
        None
    };

    let state = AppState::new(db, notifier)
        .with_rules(rules)
        .with_default_expiration_days(i64::from(config.notifications.default_expiration_days));
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| PortalError::ConfigError(format!("invalid server address: {e}")))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| PortalError::ConfigError(format!("failed to bind {addr}: {e}")))?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| PortalError::ConfigError(format!("server error: {e}")))
}
