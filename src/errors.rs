use reqwest::StatusCode;
use std::fmt::{self, Formatter};
use thiserror::Error;
use url::Url;

/// A request that reached the service but came back with a status the
/// caller has no dedicated handling for.
#[derive(Debug, Error)]
pub struct RequestFailure {
    pub url: Url,
    pub status: StatusCode,
    pub msg: String,
}

impl RequestFailure {
    pub fn new(url: Url, status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            url,
            status,
            msg: msg.into(),
        }
    }

    pub const fn error_code(&self) -> &'static str {
        "E002"
    }

    pub fn suggestions(&self) -> Vec<&'static str> {
        match self.status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => vec![
                "Check that your API key is correct",
                "Pass the key with --api-key or the HEDRA_API_KEY variable",
            ],
            StatusCode::NOT_FOUND => vec![
                "Check that the URL is correct",
                "Verify the base URL points at the API root",
            ],
            StatusCode::PAYLOAD_TOO_LARGE => vec![
                "Reduce the size of the uploaded file",
                "Compress audio or resize images before uploading",
            ],
            StatusCode::TOO_MANY_REQUESTS => vec![
                "Wait a moment before retrying",
                "Consider reducing request frequency",
            ],
            status if status.is_server_error() => vec![
                "The service is having trouble, try again later",
                "Check the service status page",
            ],
            _ => vec!["Check the request parameters"],
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        writeln!(
            formatter,
            "[{}] Request to {} failed with status {}",
            self.error_code(),
            self.url,
            self.status
        )?;
        if !self.msg.is_empty() {
            writeln!(formatter, "Server response: {}", self.msg)?;
        }
        write!(formatter, "\nSuggestions:")?;
        for suggestion in self.suggestions() {
            write!(formatter, "\n  • {suggestion}")?;
        }
        Ok(())
    }
}
