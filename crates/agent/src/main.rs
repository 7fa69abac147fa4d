use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tracing::info;

use leverage_risk::config;
use leverage_risk::core::RiskAssessor;
use leverage_risk::logging;
use leverage_risk::types::AssessmentRequest;

/// One-shot assessment: reads `{ position, market?, gas? }` from the file
/// given as the first argument (or stdin) and prints the assessment as JSON.
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    let config_dir = std::env::var("RISK_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let config = config::load_config(&config_dir)?;

    // Hold the guard for the process lifetime.
    let _guard = logging::init_tracing(&config.app.logging)?;

    info!(
        strategy = %config.risk.risk_strategy,
        critical_hf = %config.risk.critical_health_factor,
        max_gas_gwei = %config.risk.max_gas_price_gwei,
        "risk agent configured"
    );

    let raw = read_input(std::env::args().nth(1)).await?;
    let request = AssessmentRequest::from_json(&raw).context("parsing assessment input")?;

    let assessor = RiskAssessor::new(&config);
    let assessment = assessor.assess(
        &request.position,
        request.market.as_ref(),
        request.gas.as_ref(),
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&assessment).context("serializing assessment")?
    );
    Ok(())
}

async fn read_input(path: Option<String>) -> Result<String> {
    match path.as_deref() {
        None | Some("-") => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("reading assessment input from stdin")?;
            Ok(buf)
        }
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read input file: {path}")),
    }
}
