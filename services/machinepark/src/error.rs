//! Error types for the machinepark service

/// Errors that can occur in the machinepark service
#[derive(Debug, thiserror::Error)]
pub enum MachineparkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Timestop rotation is empty")]
    EmptyRotation,

    #[error("Hour {0} is not a configured timestop")]
    UnknownTimestop(u32),

    #[error("Period accumulator for '{owner}' exhausted ({capacity} samples)")]
    BufferExhausted { owner: String, capacity: usize },

    #[error("Every fetch failed for {0} consecutive ticks")]
    FetchExhausted(u32),
}

/// Result type alias for machinepark operations
pub type Result<T> = std::result::Result<T, MachineparkError>;
