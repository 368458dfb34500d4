//! HTTP plumbing shared by every API client

use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client, Method, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::auth::SessionHandle;
use crate::config::ClientOptions;
use crate::error::{Error, Result};

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Add a header to the request
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Append a query parameter
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query_params.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let json = serde_json::to_vec(body)?;
        self.body = Some(json);
        Ok(self)
    }

    fn build(&self) -> Result<RequestBuilder> {
        let mut url = Url::parse(&self.url)?;

        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }

        let mut req = self.client.request(self.method.clone(), url.as_str());
        req = req.headers(self.headers.clone());

        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }

        Ok(req)
    }

    async fn send(&self) -> Result<Response> {
        debug!("{} {}", self.method, self.url);
        let response = self.build()?.send().await?;
        let status = response.status();
        debug!("{} {} -> {}", self.method, self.url, status);

        if !status.is_success() {
            let text = response.text().await?;
            return Err(api_error(status.as_u16(), &text));
        }
        Ok(response)
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T> {
        let response = self.send().await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(Error::payload)
    }

    /// Execute the request, discarding any response body
    pub async fn execute_unit(&self) -> Result<()> {
        self.send().await?;
        Ok(())
    }
}

/// Turn an error response into an [`Error::Api`]
///
/// The backend reports failures as `{"error": "...", "details": ...}`; bodies
/// that don't follow that shape are passed through as text.
pub(crate) fn api_error(status: u16, body: &str) -> Error {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    let mut message = field("error")
        .or_else(|| field("message"))
        .or_else(|| field("msg"))
        .unwrap_or_else(|| body.trim().to_string());

    if let Some(details) = parsed.as_ref().and_then(|v| v.get("details")) {
        match details {
            serde_json::Value::String(s) => message = format!("{message}: {s}"),
            serde_json::Value::Null => {}
            other => message = format!("{message}: {other}"),
        }
    }

    if message.is_empty() {
        message = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Request failed")
            .to_string();
    }

    Error::Api { status, message }
}

/// Base URL, HTTP client and session shared by the API clients
#[derive(Clone)]
pub struct Transport {
    base_url: String,
    client: Client,
    session: SessionHandle,
    client_info: String,
}

impl Transport {
    /// Create a new transport rooted at `base_url`
    pub fn new(base_url: &str, client: Client, session: SessionHandle, options: &ClientOptions) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            session,
            client_info: options.client_info.clone(),
        }
    }

    /// The base URL requests are issued against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session whose token is attached to requests
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build a request, attaching the bearer token when a session exists
    pub fn request(&self, method: Method, path: &str) -> FetchBuilder<'_> {
        let builder = FetchBuilder::new(&self.client, &self.url(path), method)
            .header("X-Client-Info", &self.client_info);
        match self.session.token() {
            Some(token) => builder.bearer_auth(&token),
            None => builder,
        }
    }

    /// Build a request that requires a logged-in session
    pub fn authed(&self, method: Method, path: &str) -> Result<FetchBuilder<'_>> {
        if !self.session.is_authenticated() {
            return Err(Error::auth("Not logged in"));
        }
        Ok(self.request(method, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_prefers_error_field() {
        let err = api_error(400, r#"{"error": "Only 3 items available", "available_stock": 3}"#);
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Only 3 items available");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_api_error_appends_details() {
        let err = api_error(500, r#"{"error": "Failed to fetch orders", "details": "db down"}"#);
        assert_eq!(err.user_message(), "Failed to fetch orders: db down");
    }

    #[test]
    fn test_api_error_falls_back_to_text_and_reason() {
        assert_eq!(api_error(502, "upstream gone").user_message(), "upstream gone");
        assert_eq!(api_error(404, "").user_message(), "Not Found");
    }
}
