use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutoplayerError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Unexpected page state: {0}")]
    InvalidPageState(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("DevTools protocol error in {method}: {message}")]
    Protocol { method: String, message: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Max retries ({attempts}) exceeded for {operation}")]
    RetriesExhausted { operation: String, attempts: u32 },

    #[error("Battle did not finish: {0}")]
    BattleStuck(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AutoplayerError {
    /// Whether the error comes from the flaky page/transport layer and the
    /// operation may succeed if attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AutoplayerError::Timeout(_)
                | AutoplayerError::Navigation(_)
                | AutoplayerError::ElementNotFound(_)
                | AutoplayerError::Script(_)
                | AutoplayerError::Protocol { .. }
        )
    }
}

impl From<serde_json::Error> for AutoplayerError {
    fn from(e: serde_json::Error) -> Self {
        AutoplayerError::Internal(format!("JSON error: {e}"))
    }
}

impl From<reqwest::Error> for AutoplayerError {
    fn from(e: reqwest::Error) -> Self {
        AutoplayerError::Browser(format!("DevTools HTTP request failed: {e}"))
    }
}
