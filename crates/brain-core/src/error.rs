//! Error types for brain operations.

use thiserror::Error;

/// Errors that can occur during brain processing.
///
/// User mistakes are answered with a reply, not an error; these cover
/// failures the brain could not turn into a reply.
#[derive(Debug, Error)]
pub enum BrainError {
    /// The brain could not be set up.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The message could not be processed.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// A timeout occurred during processing.
    #[error("processing timed out")]
    Timeout,
}
