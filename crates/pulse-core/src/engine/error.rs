//! Engine error types

use thiserror::Error;

/// Errors that can occur while bringing up the audio graph
///
/// These never cross the engine boundary as panics; callers either use the
/// fallible API or the engine logs and degrades to a no-op (playback of
/// unprocessed audio is never blocked by graph failures).
#[derive(Error, Debug)]
pub enum EngineError {
    /// The graph context was closed; a closed context never reopens
    #[error("Graph context has been closed")]
    ContextClosed,

    /// Context creation failed (no audio support in this runtime)
    #[error("Failed to create graph context: {0}")]
    ContextCreation(String),

    /// The media element handle could not be read
    #[error("Media element unavailable: {0}")]
    ElementUnavailable(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
