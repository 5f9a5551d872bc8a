use super::types::{AspectRatio, AudioSource, ProjectStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AvatarImageInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    pub prompt: String,
}

/// Body of `POST /v1/characters`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_source: Option<AudioSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_image_input: Option<AvatarImageInput>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInitialization {
    pub job_id: String,
}

/// A generation job as reported by `GET /v1/projects/{id}`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: Option<String>,
    pub created_at: Option<String>,
    pub username: Option<String>,
    pub video_url: Option<String>,
    pub avatar_image_url: Option<String>,
    pub aspect_ratio: Option<AspectRatio>,
    pub text: Option<String>,
    pub voice_id: Option<String>,
    pub voice_url: Option<String>,
    pub user_id: Option<String>,
    pub job_type: Option<String>,
    pub status: Option<String>,
    pub stage: Option<String>,
    pub progress: Option<f64>,
    pub error_message: Option<String>,
    pub audio_source: Option<String>,
    pub avatar_image_input: Option<serde_json::Value>,
    pub shared: Option<bool>,
}

impl Project {
    pub fn status(&self) -> ProjectStatus {
        ProjectStatus::classify(self.status.as_deref())
    }

    /// Status string handed to progress callbacks.
    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or(ProjectStatus::IN_PROGRESS)
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.status() == ProjectStatus::Completed
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ProjectList {
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub labels: Option<HashMap<String, String>>,
    pub category: Option<String>,
    pub preview_url: Option<String>,
    #[serde(default)]
    pub premium: bool,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct VoiceList {
    #[serde(default)]
    pub supported_voices: Vec<Voice>,
}
