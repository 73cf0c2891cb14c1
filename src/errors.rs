use thiserror::Error;

/// Everything that can go wrong across a session's lifecycle.
///
/// `ConfigurationMissing` is fatal at startup; the rest surface through the
/// session state machine and end the affected phase.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("planning service unavailable: {0}")]
    PlanningUnavailable(String),

    #[error("malformed planning response: {0}")]
    MalformedResponse(String),

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    #[error("action execution failed: {0}")]
    ExecutionFailed(String),
}
