use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use kembara_api::{app, AppState};
use kembara_catalog::PricingEngine;
use kembara_store::HttpAvailabilityClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kembara_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = kembara_store::Config::load().context("Failed to load config")?;
    tracing::info!("Starting Kembara API on port {}", config.server.port);

    let client = HttpAvailabilityClient::new(&config.upstream).context("Failed to build availability client")?;
    tracing::info!("Availability backend at {}", config.upstream.base_url);

    let app_state = AppState::new(
        Arc::new(client),
        PricingEngine::new(config.business_rules.pricing()),
        config.polling.clone(),
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.context("Failed to bind listener")?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
