use crate::endpoint::Endpoint;
use thiserror::Error;

/// Errors that can occur when talking to the chat service.
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("url error: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} returned status {status}: {message}")]
    UnexpectedStatus {
        endpoint: Endpoint,
        status: u16,
        message: String,
    },
    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
}

impl SdkError {
    pub(crate) fn unexpected_status(
        endpoint: Endpoint,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        SdkError::UnexpectedStatus {
            endpoint,
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SdkError::UnexpectedStatus { status, .. } => Some(*status),
            SdkError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
