use std::sync::Arc;

use tokio::net::TcpListener;

use image_generation_service::{
    AppConfig, GenerationGateway, HuggingFaceClient, build_router, telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!(?config, "starting image generation service");
    if config.api_token.is_none() {
        tracing::warn!("no inference API token configured; generation requests will fail");
    }

    let client = HuggingFaceClient::from_config(&config)?;
    let gateway = Arc::new(GenerationGateway::from_config(&config, Arc::new(client)));
    let router = build_router(config.clone(), gateway);

    let listener = TcpListener::bind(config.listen_addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "REST server ready");

    axum::serve(listener, router).await?;

    Ok(())
}
