//! Billing API Server Binary
//!
//! Starts the HTTP API server and the overdue sweep.
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - Token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` / `DATABASE_URL` - PostgreSQL connection string
//! * `API_EXCHANGE_RATE_URL` - VED/USD quote endpoint
//! * `API_FALLBACK_RATE` - Seed rate served until the first successful fetch
//! * `API_SWEEP_INTERVAL_SECS` - Overdue sweep interval (default: 43200)
//! * `API_LOG_LEVEL` - trace, debug, info, warn, error (default: info)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::ExchangeRate;
use domain_billing::{BillingService, HttpRateProvider, LogNotifier, OverdueSweep};
use infra_db::{PgBillingStore, PgContractStore, PgCustomerStore, PgPlanStore};
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = load_config()?;
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting billing API server"
    );

    let pool = infra_db::create_pool_from_url(&config.database_url).await?;
    verify_database(&pool).await?;

    // Store adapters
    let customers = Arc::new(PgCustomerStore::new(pool.clone()));
    let plans = Arc::new(PgPlanStore::new(pool.clone()));
    let contracts = Arc::new(PgContractStore::new(pool.clone()));
    let billing_store = Arc::new(PgBillingStore::new(pool.clone()));

    // Exchange-rate provider with last-known-good fallback
    let rates = Arc::new(HttpRateProvider::new(
        config.exchange_rate_url.clone(),
        Duration::from_secs(config.exchange_rate_timeout_secs),
    )?);
    if let Some(seed) = config.fallback_rate {
        match ExchangeRate::new(seed) {
            Ok(rate) => rates.seed(rate).await,
            Err(e) => tracing::warn!(error = %e, "ignoring invalid API_FALLBACK_RATE"),
        }
    }

    let billing = Arc::new(BillingService::new(
        customers.clone(),
        plans.clone(),
        contracts.clone(),
        billing_store.clone(),
        rates,
    ));

    // Overdue sweep on its configured interval
    let sweep = Arc::new(OverdueSweep::new(
        billing.clone(),
        billing_store.clone(),
        customers.clone(),
        Arc::new(LogNotifier),
    ));
    let sweep_handle = sweep.spawn(Duration::from_secs(config.sweep_interval_secs));
    tracing::info!(
        interval_secs = config.sweep_interval_secs,
        "Overdue sweep scheduled"
    );

    let state = AppState {
        customers,
        plans,
        contracts,
        billing_store,
        billing,
        config: config.clone(),
    };
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweep_handle.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads configuration from environment variables, falling back to
/// individual variables and then to defaults
fn load_config() -> Result<ApiConfig, Box<dyn std::error::Error>> {
    let defaults = ApiConfig::default();

    let config = ApiConfig::from_env().unwrap_or_else(|_| ApiConfig {
        host: std::env::var("API_HOST").unwrap_or(defaults.host),
        port: std::env::var("API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port),
        jwt_secret: std::env::var("API_JWT_SECRET").unwrap_or(defaults.jwt_secret),
        jwt_expiration_secs: std::env::var("API_JWT_EXPIRATION_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.jwt_expiration_secs),
        database_url: std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("API_DATABASE_URL"))
            .unwrap_or(defaults.database_url),
        log_level: std::env::var("API_LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(defaults.log_level),
        exchange_rate_url: std::env::var("API_EXCHANGE_RATE_URL")
            .unwrap_or(defaults.exchange_rate_url),
        exchange_rate_timeout_secs: std::env::var("API_EXCHANGE_RATE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.exchange_rate_timeout_secs),
        fallback_rate: std::env::var("API_FALLBACK_RATE")
            .ok()
            .and_then(|s| s.parse().ok()),
        sweep_interval_secs: std::env::var("API_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.sweep_interval_secs),
    });

    Ok(config)
}

/// Initializes the tracing subscriber for structured logging
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Verifies database connectivity before serving traffic
///
/// Schema migrations are applied externally from `infra_db/migrations/`.
async fn verify_database(pool: &sqlx::PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    tracing::info!("Database ready");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
