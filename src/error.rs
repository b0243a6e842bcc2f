//! Error types for the lip-sync engine.
//!
//! Most of the engine never surfaces errors: payload problems degrade to a
//! shorter or estimated timeline and unknown symbols classify as rest. These
//! variants cover the edges that do fail: the audio collaborator and config
//! files.

/// Top-level error type for the lip-sync engine.
#[derive(Debug, thiserror::Error)]
pub enum LipSyncError {
    /// Audio collaborator failed to report playback state or position.
    #[error("audio error: {0}")]
    Audio(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, LipSyncError>;
