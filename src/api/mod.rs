// Re-export the API module components
pub use self::{
    client::ApiClient,
    errors::{ApiClientError, JobError},
    models::{
        AvatarImageInput, GenerateRequest, Project, ProjectInitialization, ProjectList,
        UploadResponse, Voice, VoiceList,
    },
    polling::{JobPoller, PollPolicy, PollState, ProgressCallback, ProjectSource},
    types::{AspectRatio, AudioSource, ProjectStatus, UploadKind},
    upload::{MultipartForm, ProbedPayload, StreamedPayload, UploadPayload},
};

// Module declarations
mod client;
mod errors;
mod models;
mod polling;
mod types;
pub mod upload;
