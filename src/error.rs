//! Client error types
//!
//! Defines all errors that can occur while talking to Penguin Statistics.
//! Grouping drop records never fails, so nothing here covers it.

use thiserror::Error;

/// Errors that can occur when calling the Penguin Statistics API
#[derive(Error, Debug)]
pub enum PenguinError {
    /// Arguments rejected before any request was sent
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Request or connect timeout elapsed
    #[error("Request timeout")]
    Timeout,

    /// Could not connect to the service
    #[error("Penguin Statistics unavailable")]
    Unavailable,

    /// Transport failure not covered above
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response status not accepted by the endpoint
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("Could not decode response: {0}")]
    Decode(String),

    /// A required response field was absent
    #[error("Response missing field: {0}")]
    MissingField(&'static str),
}

impl PenguinError {
    /// Classify a transport error the same way for every endpoint
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PenguinError::Timeout
        } else if err.is_connect() {
            PenguinError::Unavailable
        } else {
            PenguinError::Request(err)
        }
    }
}

impl From<serde_json::Error> for PenguinError {
    fn from(err: serde_json::Error) -> Self {
        PenguinError::Decode(err.to_string())
    }
}

/// Result type alias for client operations
pub type PenguinResult<T> = Result<T, PenguinError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PenguinError::UnexpectedStatus {
            status: 400,
            body: "bad stage".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected status 400: bad stage");

        let err = PenguinError::MissingField("reportHash");
        assert_eq!(err.to_string(), "Response missing field: reportHash");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: PenguinError = json_err.into();
        assert!(matches!(err, PenguinError::Decode(_)));
    }
}
