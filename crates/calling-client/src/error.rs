//! Error types for the calling client
//!
//! Two layers of errors live here:
//!
//! - [`ClientError`] is the operational error returned inside the crate
//!   (HTTP failures, decode failures, configuration problems).
//! - [`CallingClientError`] is the classified, client-facing error published on
//!   the event surface. Consumers only ever see this one; raw network errors
//!   are converted with [`CallingClientError::from_client_error`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for calling client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Operational errors raised by the calling client and its transports
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Configuration is invalid or incomplete
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// The request never produced a response (connect/reset/DNS)
    #[error("Network error: {reason}")]
    NetworkError { reason: String },

    /// The service answered with a non-success status
    #[error("HTTP {status} from {uri}: {reason}")]
    Http { status: u16, uri: String, reason: String },

    /// The request timed out
    #[error("Request to {uri} timed out")]
    Timeout { uri: String },

    /// A response body could not be parsed
    #[error("Failed to decode response: {reason}")]
    DecodeError { reason: String },

    /// A line is already registered; only one line is supported
    #[error("Line {existing} already exists, multiple lines are not supported")]
    LineAlreadyExists { existing: String },

    /// No line has been created yet
    #[error("No line available")]
    NoLine,

    /// Internal error
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl ClientError {
    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn invalid_configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same request later could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClientError::NetworkError { .. } | ClientError::Timeout { .. } => true,
            ClientError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Short category label used in structured logs
    pub fn category(&self) -> &'static str {
        match self {
            ClientError::InvalidConfiguration { .. } => "configuration",
            ClientError::NetworkError { .. } | ClientError::Timeout { .. } => "network",
            ClientError::Http { .. } => "http",
            ClientError::DecodeError { .. } => "decode",
            ClientError::LineAlreadyExists { .. } | ClientError::NoLine => "line",
            ClientError::InternalError { .. } => "internal",
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        let uri = err.url().map(|u| u.to_string()).unwrap_or_default();
        if err.is_timeout() {
            ClientError::Timeout { uri }
        } else if let Some(status) = err.status() {
            ClientError::Http {
                status: status.as_u16(),
                uri,
                reason: err.to_string(),
            }
        } else if err.is_decode() {
            ClientError::DecodeError {
                reason: err.to_string(),
            }
        } else {
            ClientError::NetworkError {
                reason: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::DecodeError {
            reason: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::InvalidConfiguration {
            field: "config".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Classification tag attached to client-facing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    CallError,
    Default,
    BadRequest,
    ForbiddenError,
    NotFound,
    RegistrationError,
    ServiceUnavailable,
    Timeout,
    TokenError,
    ServerError,
}

/// Registration state of the signaling service at the time of the error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobiusStatus {
    Active,
    Default,
}

/// Where an error was raised
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    pub file: String,
    pub method: String,
}

impl ErrorContext {
    pub fn new(file: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            method: method.into(),
        }
    }
}

/// Classified error delivered to consumers through `CallingClientEvent::Error`
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct CallingClientError {
    /// Human readable description
    pub message: String,
    /// Classification of the failure
    pub error_type: ErrorType,
    /// Registration state when the error happened
    pub status: MobiusStatus,
    /// Origin of the error
    pub context: ErrorContext,
}

impl CallingClientError {
    pub fn new(
        message: impl Into<String>,
        context: ErrorContext,
        error_type: ErrorType,
        status: MobiusStatus,
    ) -> Self {
        Self {
            message: message.into(),
            error_type,
            status,
            context,
        }
    }

    /// Classify an operational error into a client-facing one
    ///
    /// HTTP failures are mapped by status code; timeouts keep their own type and
    /// everything else collapses into [`ErrorType::Default`].
    pub fn from_client_error(err: &ClientError, context: ErrorContext) -> Self {
        let (error_type, message) = match err {
            ClientError::Http { status: 400, .. } => (
                ErrorType::BadRequest,
                "Invalid input. Please verify the required parameters, sign out and then sign back in with the valid data.",
            ),
            ClientError::Http { status: 401, .. } => (
                ErrorType::TokenError,
                "User is unauthorized due to an expired token. Sign out, then sign back in.",
            ),
            ClientError::Http { status: 403, .. } => (
                ErrorType::ForbiddenError,
                "An unauthorized action has been received. This action has been blocked. Please contact the administrator if this persists.",
            ),
            ClientError::Http { status: 404, .. } => (
                ErrorType::NotFound,
                "The requested resource was not found. Wait a moment and try again.",
            ),
            ClientError::Http { status: 500, .. } => (
                ErrorType::ServerError,
                "An unknown error occurred while placing the request. Wait a moment and try again.",
            ),
            ClientError::Http { status: 503, .. } => (
                ErrorType::ServiceUnavailable,
                "An error occurred on the server while processing the request. Wait a moment and try again.",
            ),
            ClientError::Timeout { .. } => (
                ErrorType::Timeout,
                "The request timed out. Check the network connection and try again.",
            ),
            _ => (
                ErrorType::Default,
                "An unknown error occurred. Wait a moment and try again.",
            ),
        };

        Self::new(message, context, error_type, MobiusStatus::Default)
    }
}
