use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    #[value(name = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    #[value(name = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    #[value(name = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AudioSource {
    Tts,
    Audio,
}

/// Which upload endpoint a file goes to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UploadKind {
    Audio,
    Image,
}

impl UploadKind {
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Image => "portrait",
        }
    }
}

impl Display for UploadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// Status reported for a project. The service only guarantees the two
/// terminal values; everything else is carried through as pending.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProjectStatus {
    Completed,
    Failed,
    Pending(String),
}

impl ProjectStatus {
    pub const COMPLETED: &'static str = "Completed";
    pub const FAILED: &'static str = "Failed";
    /// Reported to progress callbacks when the service omits the status.
    pub const IN_PROGRESS: &'static str = "In Progress";

    pub fn classify(raw: Option<&str>) -> Self {
        match raw {
            Some(Self::COMPLETED) => Self::Completed,
            Some(Self::FAILED) => Self::Failed,
            Some(other) => Self::Pending(other.to_owned()),
            None => Self::Pending(Self::IN_PROGRESS.to_owned()),
        }
    }
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "{}", Self::COMPLETED),
            Self::Failed => write!(f, "{}", Self::FAILED),
            Self::Pending(status) => write!(f, "{status}"),
        }
    }
}
