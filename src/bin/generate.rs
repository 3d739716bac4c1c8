//! Generates a single image from the command line and saves it as PNG.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;

use image_generation_service::{
    AppConfig, DEFAULT_OUTPUT_FILE, GenerationGateway, HuggingFaceClient, telemetry::init_tracing,
};

#[derive(Debug, Parser)]
#[command(name = "generate", about = "Generate one image from a text prompt")]
struct Args {
    #[arg(
        long,
        default_value = "A beautiful sunset over mountains, high quality, detailed"
    )]
    prompt: String,

    /// Budget in seconds; a slower result is discarded.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    if args.prompt.trim().is_empty() {
        anyhow::bail!("Please enter a prompt!");
    }

    let config = AppConfig::from_env()?;
    let client = HuggingFaceClient::from_config(&config)?;
    let gateway = GenerationGateway::from_config(&config, Arc::new(client));

    let image = gateway
        .generate(&args.prompt, args.timeout)
        .await
        .context("image generation failed")?;
    tracing::info!("image generated successfully");

    image
        .save(&args.output)
        .with_context(|| format!("failed to save {}", args.output.display()))?;
    tracing::info!(path = %args.output.display(), "image saved");

    Ok(())
}
