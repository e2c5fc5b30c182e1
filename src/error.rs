use thiserror::Error;

/// Errors produced by the address pipeline and its components.
///
/// Only [`AddressError::InputInvalid`] escapes
/// [`AddressPipeline::parse`](crate::pipeline::AddressPipeline::parse); the
/// model-path variants are recovered by falling back to the deterministic
/// parser.
#[derive(Error, Debug)]
pub enum AddressError {
    /// The inference endpoint was unreachable, timed out, or answered with a
    /// non-success status code.
    #[error("model service unavailable{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    ServiceUnavailable {
        /// HTTP status code, when a response was received at all.
        status: Option<u16>,
        /// Transport error text or response body.
        message: String,
    },

    /// A reply arrived but no usable JSON object could be extracted from it.
    #[error("unparsable model response: {0}")]
    UnparsableResponse(String),

    /// The raw address was empty or missing.
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// Invalid configuration detected at build time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization failed outside the model path (records, CLI).
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl AddressError {
    /// Shorthand for a transport-level [`AddressError::ServiceUnavailable`].
    pub fn unavailable(message: impl Into<String>) -> Self {
        AddressError::ServiceUnavailable {
            status: None,
            message: message.into(),
        }
    }

    /// Whether the model path failed in a way the fallback recovers from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AddressError::ServiceUnavailable { .. } | AddressError::UnparsableResponse(_)
        )
    }
}

impl From<anyhow::Error> for AddressError {
    fn from(err: anyhow::Error) -> Self {
        AddressError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AddressError>;
