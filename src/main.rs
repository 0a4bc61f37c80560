mod auth;
mod config;
mod error;
mod hits;
mod keygen;
mod links;
#[cfg(test)]
mod memory;
mod model;
mod routes;
mod stats;
mod store;
#[cfg(test)]
mod testutil;
mod utils;
mod validator;

use axum::serve;
use config::Config;
use dotenvy::dotenv;
use links::LinkService;
use routes::{create_router, AppState};
use std::sync::Arc;
use std::time::Duration;
use store::RedisStore;
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use validator::SystemResolver;

const DEFAULT_TRACING_LEVEL: &str = "shorturl=debug";
const STORE_PING_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    _ = dotenv();
    configure_tracing();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Critical security error: {}", err);
            std::process::exit(1);
        }
    };
    let links = create_link_service(&config.redis_addr).await;
    let listener = create_listener(&config.server_address()).await;
    let router = create_router(AppState {
        links,
        credentials: Arc::new(config.admin),
    });
    serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed to start");
    tracing::info!("Server stopped");
}

fn configure_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or(DEFAULT_TRACING_LEVEL.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn create_link_service(redis_addr: &str) -> LinkService {
    let store = RedisStore::connect(redis_addr)
        .await
        .expect("Creating store connection failed");
    let links = LinkService::new(Arc::new(store), Arc::new(SystemResolver));
    tokio::time::timeout(STORE_PING_TIMEOUT, links.ping())
        .await
        .expect("Store ping timed out")
        .expect("Store ping failed");
    links
}

async fn create_listener(server_address: &str) -> TcpListener {
    let listener = TcpListener::bind(server_address)
        .await
        .expect("Creating tcp listener failed");
    tracing::info!("Listening on address: {}", server_address);
    listener
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Listening for shutdown signal failed: {}", err);
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Listening for SIGTERM failed: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutting down server...");
}
