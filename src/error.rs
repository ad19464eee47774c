// Error types shared by the configuration loader, the HTTP transport and
// the GitHub gateway. Upstream failures keep their status code and the
// parsed GitHub message so callers can branch on them without matching
// raw response text.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Name of a required credential field, as spelled in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    Token,
    Username,
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialField::Token => write!(f, "gitHubToken"),
            CredentialField::Username => write!(f, "gitHubUsername"),
        }
    }
}

/// Fatal, pre-flight configuration failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("GitHub credential `{0}` is missing in the configuration")]
    MissingCredential(CredentialField),

    #[error("Invalid configuration value for `{field}`: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Machine-checkable classification of an upstream error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorReason {
    NotFound,
    ReferenceExists,
    Other,
}

/// A non-2xx response from the GitHub API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("GitHub API responded {status}: {body}")]
pub struct ApiError {
    pub status: u16,
    /// The `message` field of GitHub's JSON error body, when there is one.
    pub message: Option<String>,
    pub body: String,
}

impl ApiError {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            message: Option<String>,
        }

        let body = body.into();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|parsed| parsed.message);
        Self {
            status,
            message,
            body,
        }
    }

    pub fn reason(&self) -> ApiErrorReason {
        match (self.status, self.message.as_deref()) {
            (404, _) => ApiErrorReason::NotFound,
            (422, Some("Reference already exists")) => ApiErrorReason::ReferenceExists,
            _ => ApiErrorReason::Other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.reason() == ApiErrorReason::NotFound
    }
}

/// Network-level failure: the request never produced an HTTP response.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl TransportError {
    /// Classify a reqwest failure for the given URL.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            TransportError::Timeout { url }
        } else if err.is_connect() {
            TransportError::Connect {
                url,
                message: err.to_string(),
            }
        } else {
            TransportError::Request {
                url,
                message: err.to_string(),
            }
        }
    }
}

/// Everything the gateway can fail with.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Unexpected response shape from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, GatewayError>;
