//! Error types for the Trackside environment abstraction.

use thiserror::Error;

/// Errors reported by scene and UI collaborators.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The renderer could not create a transient marker
    #[error("Marker unavailable: {0}")]
    MarkerUnavailable(String),
}

impl EnvError {
    /// Creates a marker error.
    pub fn marker(msg: impl Into<String>) -> Self {
        Self::MarkerUnavailable(msg.into())
    }
}
