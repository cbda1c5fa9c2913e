//! Error types for the hub.
//!
//! None of these ever reach a client: handlers return them so the event loop
//! can log and move on.

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Inbound text that is not a recognizable message
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Player-scoped message without a usable id
    #[error("Missing player id in {kind} message")]
    MissingId { kind: &'static str },

    /// `update` whose body matches neither position shape
    #[error("Update from {id} carries no usable position")]
    NoPosition { id: String },

    #[error("Unknown session action: {0}")]
    UnknownAction(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Control plane error: {0}")]
    Control(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
