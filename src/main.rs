pub mod api;
pub mod config;
pub mod data_structures;

use crate::config::{AppConfig, FinancialsLocation};
use crate::data_structures::AppState;
use anyhow::{anyhow, Context};
use axum::Router;
use rdcf::api::AnalyzerBuilder;
use std::{net::SocketAddr, sync::Arc};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;

fn build_state(app_config: &AppConfig) -> anyhow::Result<AppState> {
    let builder = AnalyzerBuilder::new()
        .with_settings(app_config.settings.clone())
        .with_companies_csv(&app_config.companies_csv);

    let builder = match &app_config.financials {
        FinancialsLocation::Url(url) => builder.with_source_url(url.clone()),
        FinancialsLocation::Dir(dir) => builder.with_source_dir(dir),
    };

    let analyzer = builder.build().context("Failed to build valuation analyzer")?;
    tracing::info!(
        companies = analyzer.directory().len(),
        financials = ?app_config.financials,
        "Loaded company directory"
    );
    Ok(AppState::new(analyzer))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = AppConfig::load()?;

    // Initialize tracing with node_name in all logs
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    // Set a global span with node_name for all subsequent logs
    let _span = tracing::info_span!("node", name = %app_config.node_name).entered();

    tracing::info!("Starting rdcf-server");
    tracing::info!(environment = %app_config.environment, port = app_config.port, "Loaded configuration");

    let app_state = build_state(&app_config)?;

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(app_config.rate_limit.per_second)
            .burst_size(app_config.rate_limit.burst_size)
            .finish()
            .ok_or_else(|| anyhow!("Invalid rate limit configuration"))?,
    );

    let app = Router::new()
        .merge(api::public_routes())
        .merge(api::valuation_routes().layer(GovernorLayer::new(governor_conf)))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], app_config.port));
    tracing::info!(%addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
