//! Error handling for the storefront client

use std::fmt;
use thiserror::Error;

/// Unified error type for the storefront client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or transport failures
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Inline image payloads that are not valid base64
    #[error("Image decode error: {0}")]
    Image(#[from] base64::DecodeError),

    /// The server answered with a non-success status
    #[error("Request failed with status {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Missing or insufficient credentials, detected before sending
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Input rejected locally, no request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// A payload did not match the canonical schema
    #[error("Schema error: {0}")]
    Schema(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

/// Coarse classification used by callers to decide how to surface an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a response
    Network,
    /// The request was refused, either by the server (4xx) or locally
    Rejected,
    /// Anything else: server faults, malformed payloads, misconfiguration
    Unknown,
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new schema error
    pub fn schema<T: fmt::Display>(msg: T) -> Self {
        Error::Schema(msg.to_string())
    }

    /// Classify a failure to decode a response payload
    ///
    /// Well-formed JSON of the wrong shape, including values rejected by a
    /// `TryFrom` conversion, is a schema error; anything else stays a JSON
    /// error.
    pub(crate) fn payload(err: serde_json::Error) -> Self {
        if !err.is_data() {
            return Error::Json(err);
        }
        let message = err.to_string();
        match message.strip_prefix("Schema error: ") {
            Some(inner) => Error::Schema(inner.to_string()),
            None => Error::Schema(message),
        }
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(e) if e.is_status() => ErrorKind::Rejected,
            Error::Http(_) => ErrorKind::Network,
            Error::Api { status, .. } if (400..500).contains(status) => ErrorKind::Rejected,
            Error::Auth(_) | Error::Validation(_) => ErrorKind::Rejected,
            _ => ErrorKind::Unknown,
        }
    }

    /// HTTP status of a server-reported error
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Message suitable for showing to the user that triggered the action
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { message, .. } => message.clone(),
            Error::Auth(msg) | Error::Validation(msg) => msg.clone(),
            Error::Http(e) if e.is_timeout() => "The server took too long to respond".to_string(),
            Error::Http(_) => "Could not reach the server".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
