//! Configuration options for the storefront client

use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable holding the API base URL
pub const API_URL_ENV: &str = "STOREFRONT_API_URL";

/// Environment variable holding the request timeout in seconds
pub const REQUEST_TIMEOUT_ENV: &str = "STOREFRONT_REQUEST_TIMEOUT_SECS";

/// Configuration options for the storefront client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Value sent in the `X-Client-Info` header
    pub client_info: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            client_info: format!("storefront-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientOptions {
    /// Build options from the environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let options = Self::default();
        match std::env::var(REQUEST_TIMEOUT_ENV) {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    Error::config(format!("{REQUEST_TIMEOUT_ENV} must be a whole number of seconds, got {raw:?}"))
                })?;
                let timeout = (secs > 0).then(|| Duration::from_secs(secs));
                Ok(options.with_request_timeout(timeout))
            }
            Err(_) => Ok(options),
        }
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the client info header value
    pub fn with_client_info(mut self, value: &str) -> Self {
        self.client_info = value.to_string();
        self
    }
}
