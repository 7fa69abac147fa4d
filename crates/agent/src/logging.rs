//! Process-wide tracing setup for the `risk-agent` binary.
//!
//! The assessment itself is the only thing printed on stdout. Log events go
//! to stderr in compact form and to a daily-rolling JSON file under the
//! configured log directory.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "risk-agent.log";
const DEFAULT_DIRECTIVES: &str = "leverage_risk=info,risk_agent=info,warn";

/// `RUST_LOG`-style directives, falling back to the defaults when absent or
/// malformed.
fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber. Keep the returned guard alive until exit,
/// or buffered file output is lost.
pub fn init_tracing(logging: &LoggingConfig) -> Result<WorkerGuard> {
    let log_dir = Path::new(&logging.log_dir);
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log dir {}", log_dir.display()))?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX));

    let json_file = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .json();
    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(env_filter(rust_log.as_deref()))
        .with(json_file)
        .with(stderr)
        .try_init()
        .context("tracing subscriber already installed")?;

    Ok(guard)
}
