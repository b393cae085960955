//! The Third Eye entry point.
//!
//! Takes no arguments: the seed set, round count and model are fixed
//! configuration. Requires ANTHROPIC_API_KEY in the environment and the
//! local all-MiniLM-L6-v2 model files under models/.

use anyhow::{bail, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use third_eye::experiment::{ThirdEye, ThirdEyeConfig};
use third_eye::seeds::SEED_CASES;

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        bail!("Set ANTHROPIC_API_KEY");
    }

    let config = ThirdEyeConfig::default();

    println!("THE THIRD EYE");
    println!("Model: {}", config.completion.model);
    println!("Rounds per seed: {}", config.rounds);
    println!("Seeds: {}", SEED_CASES.len());
    println!("Architecture: Agent (depth) + Anti-Agent (skeptic) + Observer (third eye)\n");

    let experiment = ThirdEye::new(api_key, config)?;
    experiment.run().await?;

    Ok(())
}
