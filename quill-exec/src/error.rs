use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("Error: Language '{language}' is not supported for execution.\nSupported languages: {supported}")]
    Unsupported { language: String, supported: String },

    #[error("A run is already in progress for this code block")]
    AlreadyRunning,
}

/// Why an execution strategy produced no result.
#[derive(thiserror::Error, Debug)]
pub enum StrategyError {
    #[error("Compilation service unavailable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Compilation service unavailable (HTTP {0})")]
    Status(u16),

    #[error("Unexpected response from compilation service: {0}")]
    Malformed(String),

    #[error("Failed to start local interpreter: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Local run exceeded {0:?}")]
    Timeout(Duration),

    #[error("Local sandbox failed: {0}")]
    Sandbox(String),

    #[error("{0} is not handled by this strategy")]
    Unhandled(&'static str),
}
