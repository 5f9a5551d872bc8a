use thiserror::Error;
use url::Url;

use crate::errors::RequestFailure;

/// Terminal outcomes of a generation job that are not a finished video.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("[E005] Project failed: {0}")]
    Failed(String),

    #[error("[E006] Polling timed out after {attempts} attempts\n\nSuggestions:\n  • Increase --max-attempts or --interval-ms\n  • Check the project later with the status command")]
    TimedOut { attempts: u32 },
}

impl JobError {
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Failed(_) => "E005",
            Self::TimedOut { .. } => "E006",
        }
    }

    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Failed(msg) => {
                let mut suggestions = vec![
                    "Check that the uploaded audio and image are valid",
                    "Submit the project again",
                ];

                if msg.contains("decode") {
                    suggestions.push("Re-encode the audio file as WAV or MP3");
                }

                if msg.contains("face") {
                    suggestions.push("Use a portrait where the face is clearly visible");
                }

                suggestions
            }
            Self::TimedOut { .. } => vec![
                "Increase the number of poll attempts",
                "Check the project later with the status command",
            ],
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("[E001] Invalid base URL: {0}\n\nSuggestions:\n  • Provide a valid HTTP or HTTPS URL\n  • Example: https://mercury.dev.dream-ai.com/api")]
    CannotBeBase(Url),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Failure(#[from] RequestFailure),

    #[error("[E003] Upload rejected by {url}\n\nServer response: {body}")]
    Validation { url: Url, body: String },

    #[error("[E004] You have reached your generation credit limit. Please upgrade your plan to continue generating characters.")]
    CreditLimit,

    #[error(transparent)]
    Job(#[from] JobError),

    #[error("[E007] Polling was cancelled")]
    Cancelled,

    #[error("[E008] Project '{0}' not found\n\nSuggestions:\n  • Check that the project ID is correct\n  • The project may have been deleted")]
    JobNotFound(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("[E009] Invalid URL format: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("[E010] Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("[E011] Invalid poll policy: {0}")]
    InvalidPollPolicy(&'static str),
}

impl ApiClientError {
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::CannotBeBase(_) => "E001",
            Self::Failure(f) => f.error_code(),
            Self::Validation { .. } => "E003",
            Self::CreditLimit => "E004",
            Self::Job(j) => j.error_code(),
            Self::Cancelled => "E007",
            Self::JobNotFound(_) => "E008",
            Self::UrlParse(_) => "E009",
            Self::InvalidHeader { .. } => "E010",
            Self::InvalidPollPolicy(_) => "E011",
            Self::Reqwest(_) | Self::IoError(_) => "E999",
        }
    }
}
