//! Transport configuration for the Ask-AI service client.

use std::collections::HashMap;
use std::time::Duration;

/// A secret string type for sensitive data like bearer tokens.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Transport options: generic transport fields plus the HTTP-specific
/// configuration for the Ask-AI endpoint.
///
/// # Example
/// ```rust
/// use askai::options::{HttpTransport, SecretString, TransportOptions};
/// use std::time::Duration;
///
/// let options = TransportOptions {
///     timeout: Some(Duration::from_secs(60)),
///     http: HttpTransport::new(SecretString::new("token".to_string()))
///         .with_base_url("https://api.example.com".to_string()),
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Request timeout covering the whole streaming response
    pub timeout: Option<Duration>,

    /// HTTP transport options
    pub http: HttpTransport,
}

/// HTTP-specific transport options.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    /// Bearer token for the `Authorization` header
    pub bearer_token: Option<SecretString>,

    /// Base URL of the Ask-AI service
    pub base_url: Option<String>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl HttpTransport {
    /// Create new HTTP transport options with a bearer token.
    pub fn new(bearer_token: impl Into<SecretString>) -> Self {
        Self {
            bearer_token: Some(bearer_token.into()),
            base_url: None,
            proxy: None,
            extra_headers: None,
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set extra headers.
    pub fn with_extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }
}

impl TransportOptions {
    /// Create new transport options with the given HTTP configuration.
    pub fn new(http: HttpTransport) -> Self {
        Self {
            timeout: None,
            http,
        }
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
