//! # Hedra
//!
//! A Rust client for the Hedra avatar generation API. Generation runs
//! asynchronously on the service: a caller submits a job, watches it until
//! it reaches a terminal status and then downloads the resulting video.
//!
//! ## Features
//!
//! - **Completion polling**: bounded, cancellable status polling with a
//!   progress callback
//! - **Uploads**: audio and portrait uploads with an exact `Content-Length`,
//!   for both in-memory buffers and streams
//! - **Typed errors**: every failure carries a stable code and suggestions
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use hedra::{
//!     api::{ApiClient, GenerateRequest, PollPolicy, UploadPayload},
//!     config::ClientConfig,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(&ClientConfig::new("your-api-key"))?;
//!
//! let audio = client
//!     .upload_audio(UploadPayload::from_path("voice.mp3").await?, Some("voice.mp3"))
//!     .await?;
//!
//! let request = GenerateRequest {
//!     voice_url: Some(audio.url),
//!     ..GenerateRequest::default()
//! };
//! let mut report = |status: &str| println!("status: {status}");
//! let project = client
//!     .generate_and_wait(&request, Some(&mut report), PollPolicy::default())
//!     .await?;
//!
//! if let Some(video) = project.video_url() {
//!     client.download_video(video, "avatar.mp4").await?;
//! }
//! # Ok(())
//! # }
//! ```

/// API client, polling and upload coordination
pub mod api;

/// Client configuration
pub mod config;

/// Shared error types
pub mod errors;
