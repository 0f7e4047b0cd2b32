//! User service
//!
//! HTTP user management with admin-only JWT login.
//! Reads configuration from TOML (`USER_SERVICE_CONFIG`, or
//! ~/.config/user-service/config.toml) and the signing secret from `JWT_SECRET`.

use std::sync::Arc;
use std::time::Duration;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use user_service::application::UserService;
use user_service::auth::{AccessGuard, TokenService};
use user_service::config::{AppConfig, LogFormat, LoggingConfig};
use user_service::infrastructure::database::migrator::Migrator;
use user_service::shared::{listen_for_shutdown_signals, ShutdownSignal};
use user_service::{create_api_router, init_database, DatabaseConfig, SeaOrmUserRepository};

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = AppConfig::resolve_path();
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_tracing(&cfg.logging);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            let cfg = AppConfig::default();
            init_tracing(&cfg.logging);
            error!("Failed to load config: {}. Using defaults.", e);
            cfg
        }
    };

    info!("Starting user service...");

    // ── Token signing ──────────────────────────────────────────
    let jwt_config = match app_cfg.jwt_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    info!(
        "JWT configured with {}s admin token lifetime",
        jwt_config.token_lifetime_seconds
    );
    let tokens = TokenService::new(&jwt_config);

    // ── Database ───────────────────────────────────────────────
    let db_config = DatabaseConfig::from(&app_cfg.database);
    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    info!("Running database migrations...");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }
    info!("Migrations completed");

    // ── Services ───────────────────────────────────────────────
    let repo = Arc::new(SeaOrmUserRepository::new(db.clone()));
    let user_service = Arc::new(UserService::new(
        repo,
        tokens.clone(),
        jwt_config.token_lifetime_seconds,
    ));
    let guard = AccessGuard::new(tokens);

    let api_router = create_api_router(user_service, guard);

    // ── Shutdown ───────────────────────────────────────────────
    let shutdown = ShutdownSignal::new();
    tokio::spawn(listen_for_shutdown_signals(shutdown.clone()));

    // ── HTTP server ────────────────────────────────────────────
    let api_addr = app_cfg.server.address();
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("REST API server listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/docs/", api_addr);

    let api_shutdown = shutdown.clone();
    let served = axum::serve(listener, api_router)
        .with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API server received shutdown signal");
        })
        .await;

    if let Err(e) = &served {
        error!("REST API server error: {}", e);
    }

    // ── Cleanup ────────────────────────────────────────────────
    let timeout = Duration::from_secs(app_cfg.server.shutdown_timeout);
    match tokio::time::timeout(timeout, db.close()).await {
        Ok(Ok(())) => info!("Database connection closed"),
        Ok(Err(e)) => warn!("Error closing database connection: {}", e),
        Err(_) => warn!("Timed out closing database connection"),
    }

    info!("User service shutdown complete");
    served.map_err(Into::into)
}
