mod api;
mod chat;
mod config;
mod dataset;
mod error;
mod models;
mod services;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{config::AppConfig, dataset::DatasetStore, services::AppServices};

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<AppServices>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockchat_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new()?;

    // One-shot blocking load; the server must not come up without it.
    let store = Arc::new(DatasetStore::load(&config.dataset.dir)?);
    tracing::info!(
        "Loaded {} datasets from {}",
        store.len(),
        config.dataset.dir.display()
    );

    let services = Arc::new(AppServices::new(store));

    let app_state = AppState { services };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(api::handlers::home))
        .route("/chat", post(api::handlers::chat))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server starting on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
