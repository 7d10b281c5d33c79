/// Convenience result alias used across layercast.
pub type LayercastResult<T> = Result<T, LayercastError>;

/// Error kinds surfaced by the compositor, encoders and pipeline.
///
/// Every failure is fatal for the run; callers report it and stop.
#[derive(thiserror::Error, Debug)]
pub enum LayercastError {
    /// Configuration or input shape is invalid (mismatched lengths, bad effect values, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// An input file is missing, unreadable or not a decodable PNG.
    #[error("input error: {0}")]
    Input(String),

    /// The encoder could not be started, fed or finalized.
    #[error("encode error: {0}")]
    Encode(String),

    /// Job file (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error with context.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LayercastError {
    /// Build a [`LayercastError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LayercastError::Input`] value.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build a [`LayercastError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`LayercastError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
