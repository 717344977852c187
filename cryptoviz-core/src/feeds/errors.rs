//! Feed error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Network timeout")]
    Timeout,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Unexpected HTTP status {status}")]
    Http { status: u16 },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid feed url: {0}")]
    InvalidUrl(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl FetchError {
    /// Short label used for metrics and log fields
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::Http { .. } => "http",
            Self::Malformed(_) => "malformed",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Http { status: status.as_u16() }
        } else {
            Self::Unknown(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_are_malformed() {
        let err = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let fetch_err: FetchError = err.into();
        assert_eq!(fetch_err.label(), "malformed");
    }

    #[test]
    fn test_url_errors_are_invalid_url() {
        let err = url::Url::parse("not a url").unwrap_err();
        let fetch_err: FetchError = err.into();
        assert!(matches!(fetch_err, FetchError::InvalidUrl(_)));
    }
}
