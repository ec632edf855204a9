use anyhow::{Context, Result};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

use devcollab_api::callbacks::expiry_callbacks::{notifier_from_url, ExpiryNotifier};
use devcollab_api::config::Config;
use devcollab_api::db::postgres::run_migrations;
use devcollab_api::db::repositories::users::UserRepository;
use devcollab_api::router::{create_router, AppState};
use devcollab_api::worker::ExpirySweepWorker;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting devcollab API server...");

    // --- Configuration ---
    let config_path =
        env::var("CONFIG_PATH").unwrap_or_else(|_| "config/local.toml".to_string());
    info!("Loading configuration from: {}", config_path);
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    // --- Database Setup ---
    info!("Setting up database connection pool...");
    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let pool = Pool::builder()
        .build(manager)
        .context("Failed to create database connection pool")?;
    let db_pool = Arc::new(pool);
    info!("Database pool created successfully.");

    if config.run_migrations {
        info!("Running pending migrations...");
        let migration_pool = db_pool.clone();
        tokio::task::spawn_blocking(move || run_migrations(&migration_pool))
            .await
            .context("Migration task panicked")??;
    }

    // --- Initialize Components --- //
    let notifier: Arc<dyn ExpiryNotifier> =
        Arc::from(notifier_from_url(config.expiry.webhook_url.as_deref()));

    let app = create_router(AppState {
        pool: db_pool.clone(),
        health: config.health.clone(),
        notifier: notifier.clone(),
    });
    info!("Router created.");

    // --- Setup Server Task ---
    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen_addr format in config: {}", config.listen_addr))?;
    info!("API server listening on {}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind TCP listener")?;
    let server = axum::serve(listener, app.into_make_service());

    // --- Run Concurrently --- //
    if config.expiry.enabled {
        let worker = ExpirySweepWorker::new(
            Arc::new(UserRepository::new(db_pool.clone())),
            notifier,
            Duration::from_secs(config.expiry.sweep_interval_secs.max(1)),
        );
        info!("Starting server and expiry sweep concurrently...");
        tokio::select! {
            res = server => {
                match res {
                    Ok(_) => info!("Axum server finished gracefully."),
                    Err(e) => error!(error = %e, "Axum server failed."),
                }
            },
            res = worker.run() => {
                if let Err(e) = res {
                    error!(error = %e, "Expiry sweep worker failed.");
                }
            },
        }
    } else if let Err(e) = server.await {
        error!(error = %e, "Axum server failed.");
    }

    info!("Application shut down.");
    Ok(())
}
