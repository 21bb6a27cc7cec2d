use std::{fmt, time::Duration};

use reqwest::{Method, StatusCode, Url};

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid client setup: bad base URL, bad header, bad retry policy.
    #[error("configuration error: {0}")]
    Config(String),
    /// The request body could not be serialized to JSON.
    #[error("{method} {url}: failed to encode request body: {source}")]
    Encode {
        method: Method,
        url: Url,
        source: serde_json::Error,
    },
    /// No HTTP response was obtained.
    #[error("{method} {url}: transport error: {source}")]
    Transport {
        method: Method,
        url: Url,
        source: TransportError,
    },
    /// The remote service answered with a status outside 200–299.
    #[error(transparent)]
    Remote(#[from] ResponseError),
    /// A successful response whose body could not be decoded.
    #[error("{method} {url}: failed to decode response body: {source}")]
    Decode {
        method: Method,
        url: Url,
        source: serde_json::Error,
    },
    /// A successful response whose body could not be copied into the caller's sink.
    #[error("{method} {url}: failed to write response body: {source}")]
    Write {
        method: Method,
        url: Url,
        source: std::io::Error,
    },
}

impl Error {
    /// HTTP status associated with the failure.
    ///
    /// Remote errors report the status the service returned. Failures raised
    /// on this side of the wire report `500 Internal Server Error`.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Remote(err) => err.status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the normalized remote error, if this is one.
    pub fn as_remote(&self) -> Option<&ResponseError> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Failure to obtain any HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Network or request execution error from `reqwest`.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// The per-call deadline elapsed, possibly while waiting to retry.
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

/// A failed API call, normalized from a non-2xx response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseError {
    pub method: Method,
    pub url: Url,
    pub status: StatusCode,
    /// `message` from the structured error body, or the raw body text.
    pub message: String,
    /// Number of attempts made when the retry layer had to retry.
    pub attempts: Option<u32>,
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} {}",
            self.method,
            self.url,
            self.status.as_u16(),
            self.message
        )?;
        if let Some(attempts) = self.attempts.filter(|n| *n > 0) {
            write!(f, "; giving up after {attempts} attempt(s)")?;
        }
        Ok(())
    }
}

impl std::error::Error for ResponseError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found(attempts: Option<u32>) -> ResponseError {
        ResponseError {
            method: Method::DELETE,
            url: Url::parse("https://api.example.com/v1/cluster/p/r/7").unwrap(),
            status: StatusCode::NOT_FOUND,
            message: "cluster not found".to_owned(),
            attempts,
        }
    }

    #[test]
    fn display_without_attempts() {
        assert_eq!(
            not_found(None).to_string(),
            "DELETE https://api.example.com/v1/cluster/p/r/7: 404 cluster not found"
        );
    }

    #[test]
    fn display_reports_attempts() {
        assert_eq!(
            not_found(Some(4)).to_string(),
            "DELETE https://api.example.com/v1/cluster/p/r/7: 404 cluster not found; giving up after 4 attempt(s)"
        );
    }

    #[test]
    fn status_is_internal_for_local_failures() {
        let err = Error::Config("no base URL".to_owned());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.as_remote().is_none());

        let err = Error::from(not_found(None));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.as_remote().map(|e| e.message.as_str()), Some("cluster not found"));
    }
}
