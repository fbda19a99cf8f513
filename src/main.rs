//! To-do Service
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `DATABASE_MAX_CONNECTIONS`: connection pool size (default: 5)
//! - `RUST_LOG`: Logging filter (default: `todo_service=debug,tower_http=debug`)
//! - `LOG_FORMAT`: `pretty` (default) | `json`
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `3000`)
//! - `WORKER_THREADS`: Number of tokio worker threads (default: logical CPU count)

use std::env;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_service::api::{AppState, create_router};
use todo_service::infrastructure::{RepositoryConfig, RepositoryFactory};

const DEFAULT_LOG_FILTER: &str = "todo_service=debug,tower_http=debug";

/// Parses `WORKER_THREADS`. Blank means unset; zero or garbage warns and falls back.
fn parse_worker_threads(value: &str) -> Option<usize> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    match value.parse::<usize>() {
        Ok(0) => {
            eprintln!("Warning: WORKER_THREADS=0 is invalid (must be > 0), using default");
            None
        }
        Ok(threads) => Some(threads),
        Err(error) => {
            eprintln!(
                "Warning: WORKER_THREADS='{value}' is not a valid number ({error}), using default"
            );
            None
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match env::var("LOG_FORMAT") {
            Ok(value) if value.trim().eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn main() {
    dotenvy::dotenv().ok();

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if let Some(threads) = env::var("WORKER_THREADS")
        .ok()
        .and_then(|value| parse_worker_threads(&value))
    {
        builder.worker_threads(threads);
        eprintln!("Tokio worker_threads set to: {threads}");
    }

    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("Failed to create tokio runtime: {error}");
            std::process::exit(1);
        }
    };
    runtime.block_on(async_main());
}

async fn async_main() {
    init_tracing(LogFormat::from_env());

    tracing::info!("Starting to-do service");

    let config = match RepositoryConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Configuration error: {}", error);
            std::process::exit(1);
        }
    };

    tracing::info!(
        storage_mode = ?config.storage_mode,
        max_connections = config.max_connections,
        "Repository configuration loaded"
    );

    let factory = RepositoryFactory::new(config);
    let repositories = match factory.create().await {
        Ok(repositories) => {
            tracing::info!("Repositories initialized successfully");
            repositories
        }
        Err(error) => {
            tracing::error!("Failed to initialize repositories: {}", error);
            std::process::exit(1);
        }
    };

    let application = create_router(AppState::from_repositories(repositories));

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = match env::var("PORT") {
        Ok(value) => match value.trim().parse() {
            Ok(port) => port,
            Err(error) => {
                tracing::error!(%error, "Invalid PORT: {}", value);
                std::process::exit(1);
            }
        },
        Err(_) => 3000,
    };

    let address: SocketAddr = match format!("{host}:{port}").parse() {
        Ok(address) => address,
        Err(error) => {
            tracing::error!(%error, "Invalid server address: {}:{}", host, port);
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "Failed to bind to address {}", address);
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(address) => tracing::info!("Listening on {}", address),
        Err(error) => tracing::warn!(%error, "Could not determine local address"),
    }

    if let Err(error) = axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

/// Completes when SIGINT or (on Unix) SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
