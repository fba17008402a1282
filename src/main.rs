mod config;
mod error;
mod models;
mod notify;
mod routes;
mod service;
mod store;

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use config::Config;
use error::AppError;
use notify::Notifier;
use service::ReviewService;
use store::Store;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub struct AppState {
    pub reviews: ReviewService,
}

async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.reviews.store().ping().await?;
    Ok(Json(serde_json::json!({ "status": "ok", "db": db })))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    dotenvy::dotenv().ok();
    let config = Arc::new(Config::from_env().expect("invalid configuration"));

    let store = Store::open(&config)
        .await
        .expect("failed to open review store");
    let notifier = Notifier::from_config(&config).expect("failed to configure notifier");

    let state = AppState {
        reviews: ReviewService::new(store.clone(), notifier, config.clone()),
    };

    let app = routes::app(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    store.close().await;
    tracing::info!("store closed");
}
