use std::{fmt, time::Duration};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::api::ApiClientError;

pub const DEFAULT_BASE_URL: &str = "https://mercury.dev.dream-ai.com/api";
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Settings the client is built from. Immutable once the client exists.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    base_url: Option<Url>,
    custom_headers: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            custom_headers: Vec::new(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Extra header sent with every request. Later values win over
    /// earlier ones and over the API key header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// # Errors
    ///
    /// Will return `Err` if the built-in default URL fails to parse.
    pub fn base_url(&self) -> Result<Url, ApiClientError> {
        match &self.base_url {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(DEFAULT_BASE_URL)?),
        }
    }

    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// # Errors
    ///
    /// Will return `Err` if the API key or a custom header is not a
    /// valid HTTP header.
    pub fn default_headers(&self) -> Result<HeaderMap, ApiClientError> {
        let mut headers = HeaderMap::new();

        let mut key = HeaderValue::from_str(&self.api_key).map_err(|e| {
            ApiClientError::InvalidHeader {
                name: API_KEY_HEADER.to_owned(),
                reason: e.to_string(),
            }
        })?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static("x-api-key"), key);

        for (name, value) in &self.custom_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ApiClientError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| ApiClientError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("custom_headers", &self.custom_headers)
            .field("timeout", &self.timeout)
            .finish()
    }
}
