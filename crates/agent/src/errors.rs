use thiserror::Error;

/// Typed error hierarchy for the risk agent.
///
/// The risk assessor itself never fails; these cover the executor seam and
/// snapshot ingestion. Application code wraps with
/// `anyhow::Context` for propagation.
#[derive(Error, Debug)]
pub enum AgentError {
    // -- Execution ----------------------------------------------------------
    #[error("execution failed: {reason}")]
    Execution { reason: String },

    // -- Data ---------------------------------------------------------------
    #[error("invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    // -- Forwarded errors ---------------------------------------------------
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
