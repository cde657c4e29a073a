use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use notion::NotionClient;
use secrecy::ExposeSecret;
use services::services::{
    dashboard::{DashboardService, DatabaseIds},
    mutations::MutationService,
    schema_resolver::SchemaResolver,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;

use config::DashboardConfig;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: DashboardService,
    pub mutations: MutationService,
    pub notion: NotionClient,
    pub databases: DatabaseIds,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = DashboardConfig::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid HOST/PORT")?;

    let state = build_state(&config)?;
    let app = router(state);

    info!(%addr, "starting dashboard server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(config: &DashboardConfig) -> anyhow::Result<AppState> {
    let notion = NotionClient::new(config.notion_token.expose_secret().to_string())?;
    let schemas = SchemaResolver::new(notion.clone());
    let databases = config.database_ids();
    let dashboard = DashboardService::new(notion.clone(), schemas.clone(), databases.clone());
    let mutations = MutationService::new(notion.clone(), schemas);

    Ok(AppState {
        dashboard,
        mutations,
        notion,
        databases,
    })
}

fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
