//! Error types for cheapllm.
//!
//! Every failure the client can surface is a variant of [`Error`].  Callers that
//! only care about the broad class use the `is_*` predicates: connectivity
//! (the endpoint could not be reached), API (the server answered with a
//! non-2xx status), and decode (the server answered with something we could
//! not read).

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

const CONNECTIVITY_HINT: &str = "check your network connection, that the base URL is correct, \
     and that the local server (e.g. Ollama) is running";

/// The main error type for cheapllm.
#[derive(Clone, Debug)]
pub enum Error {
    /// The server answered with a non-2xx status.
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error type string from the body, when present.
        error_type: Option<String>,
        /// Server-provided message, or the raw body when it could not be parsed.
        message: String,
    },

    /// The endpoint could not be reached (DNS, refused connection, TLS).
    Connection {
        /// The base URL the request was aimed at.
        endpoint: String,
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// The request did not complete within the client's timeout.
    Timeout {
        /// The base URL the request was aimed at.
        endpoint: String,
        /// Human-readable error message.
        message: String,
        /// Duration of the timeout in seconds.
        duration: Option<f64>,
    },

    /// A response body was not the JSON we expected.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// The connection failed after the response headers arrived.
    Streaming {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// I/O error.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// HTTP client error that is neither connectivity nor an API answer.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// A URL parsing error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },

    /// A setting or argument was rejected.
    Validation {
        /// Human-readable error message.
        message: String,
        /// Parameter that failed validation.
        param: Option<String>,
    },

    /// The request was abandoned by the caller.
    Abort {
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Creates a new API error.
    pub fn api(status_code: u16, error_type: Option<String>, message: impl Into<String>) -> Self {
        Error::Api {
            status_code,
            error_type,
            message: message.into(),
        }
    }

    /// Creates a new connection error.
    pub fn connection(
        endpoint: impl Into<String>,
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(
        endpoint: impl Into<String>,
        message: impl Into<String>,
        duration: Option<Duration>,
    ) -> Self {
        Error::Timeout {
            endpoint: endpoint.into(),
            message: message.into(),
            duration: duration.map(|d| d.as_secs_f64()),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new streaming error.
    pub fn streaming(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Streaming {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    /// Creates a new abort error.
    pub fn abort(message: impl Into<String>) -> Self {
        Error::Abort {
            message: message.into(),
        }
    }

    /// Returns true if the server answered with a non-2xx status.
    pub fn is_api(&self) -> bool {
        matches!(self, Error::Api { .. })
    }

    /// Returns true if the endpoint could not be reached in time or at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Error::Connection { .. } | Error::Timeout { .. })
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if a response could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Serialization { .. })
    }

    /// Returns true if this error is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Returns true if this error is an abort.
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Abort { .. })
    }

    /// Returns true if a caller-side retry could plausibly succeed.
    ///
    /// The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api { status_code, .. } => {
                matches!(status_code, 408 | 409 | 429 | 500..=599)
            }
            Error::Connection { .. } | Error::Timeout { .. } | Error::Streaming { .. } => true,
            _ => false,
        }
    }

    /// Returns the status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Returns the endpoint associated with a connectivity error, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Error::Connection { endpoint, .. } | Error::Timeout { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }

    /// Returns the bare message without the classification prefix.
    pub fn message(&self) -> &str {
        match self {
            Error::Api { message, .. }
            | Error::Connection { message, .. }
            | Error::Timeout { message, .. }
            | Error::Serialization { message, .. }
            | Error::Streaming { message, .. }
            | Error::Io { message, .. }
            | Error::HttpClient { message, .. }
            | Error::Url { message, .. }
            | Error::Validation { message, .. }
            | Error::Abort { message } => message,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api {
                status_code,
                error_type,
                message,
            } => {
                if let Some(error_type) = error_type {
                    write!(f, "API request failed (HTTP {status_code}, {error_type}): {message}")
                } else {
                    write!(f, "API request failed (HTTP {status_code}): {message}")
                }
            }
            Error::Connection {
                endpoint, message, ..
            } => {
                write!(
                    f,
                    "Cannot connect to API server ({endpoint}): {message}\n{CONNECTIVITY_HINT}"
                )
            }
            Error::Timeout {
                endpoint,
                message,
                duration,
            } => {
                if let Some(duration) = duration {
                    write!(
                        f,
                        "Request to {endpoint} timed out after {duration} seconds: {message}\n{CONNECTIVITY_HINT}"
                    )
                } else {
                    write!(
                        f,
                        "Request to {endpoint} timed out: {message}\n{CONNECTIVITY_HINT}"
                    )
                }
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::Streaming { message, .. } => {
                write!(f, "Streaming error: {message}")
            }
            Error::Io { message, .. } => {
                write!(f, "I/O error: {message}")
            }
            Error::HttpClient { message, .. } => {
                write!(f, "HTTP client error: {message}")
            }
            Error::Url { message, .. } => {
                write!(f, "URL error: {message}")
            }
            Error::Validation { message, param } => {
                if let Some(param) = param {
                    write!(f, "Validation error: {message} (parameter: {param})")
                } else {
                    write!(f, "Validation error: {message}")
                }
            }
            Error::Abort { message } => {
                write!(f, "Request aborted: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. }
            | Error::Serialization { source, .. }
            | Error::Streaming { source, .. }
            | Error::HttpClient { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

/// A specialized Result type for cheapllm operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_exposes_status_and_message() {
        let err = Error::api(401, None, "invalid api key");
        assert!(err.is_api());
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(err.message(), "invalid api key");
        assert_eq!(
            err.to_string(),
            "API request failed (HTTP 401): invalid api key"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn connection_error_mentions_endpoint_and_hint() {
        let err = Error::connection("http://localhost:11434/v1", "connection refused", None);
        assert!(err.is_connectivity());
        assert_eq!(err.endpoint(), Some("http://localhost:11434/v1"));
        let text = err.to_string();
        assert!(text.contains("http://localhost:11434/v1"));
        assert!(text.contains("connection refused"));
        assert!(text.contains("local server"));
    }

    #[test]
    fn timeout_is_connectivity() {
        let err = Error::timeout(
            "https://api.openai.com/v1",
            "deadline",
            Some(Duration::from_secs(120)),
        );
        assert!(err.is_connectivity());
        assert!(err.is_timeout());
        assert!(err.is_retryable());
        assert!(err.to_string().contains("120 seconds"));
    }

    #[test]
    fn json_errors_are_decode_errors() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(err.is_decode());
        assert!(error::Error::source(&err).is_some());
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(Error::api(503, None, "overloaded").is_retryable());
        assert!(Error::api(429, Some("rate_limit".to_string()), "slow down").is_retryable());
        assert!(!Error::api(400, None, "bad").is_retryable());
    }
}
