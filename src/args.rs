use std::{path::PathBuf, time::Duration};

use hedra::{
    api::{AspectRatio, AudioSource, PollPolicy},
    config::DEFAULT_BASE_URL,
};
use url::Url;

fn header_value_parser(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_owned(), value.trim().to_owned()))
        }
        _ => Err(format!("Expected KEY=VALUE, got: {raw}")),
    }
}

#[derive(clap::Parser)]
#[command(name = "hedra")]
#[command(version)]
#[command(about = "Generate talking avatars with the Hedra API")]
#[command(long_about = "
A command-line client for the Hedra avatar generation API.

Upload a voice recording and a portrait, submit a generation job and
wait for the finished video.

Examples:
  # Upload audio and a portrait
  hedra upload audio voice.mp3
  hedra upload image face.png --aspect-ratio 1:1

  # Generate and wait for the result
  hedra generate --voice-url <URL> --avatar-image <URL> --wait

  # Download the video of a finished project
  hedra download <VIDEO_URL> --output avatar.mp4
")]
pub struct Args {
    /// API key sent with every request
    #[arg(long, env = "HEDRA_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// API endpoint URL
    #[arg(
        long,
        env = "HEDRA_BASE_URL",
        default_value = DEFAULT_BASE_URL,
        value_hint = clap::ValueHint::Url,
        value_parser = Url::parse
    )]
    pub url: Url,

    /// Extra header for every request (repeatable)
    #[arg(long = "header", value_name = "KEY=VALUE", value_parser = header_value_parser)]
    pub headers: Vec<(String, String)>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Check that the service is reachable
    Ping,

    /// List the voices available for text to speech
    Voices,

    /// Upload an audio file or a portrait
    #[command(subcommand)]
    Upload(UploadCommand),

    /// Submit a generation job
    Generate(GenerateArgs),

    /// Show the current state of a project
    Status {
        /// Project ID
        id: String,
    },

    /// Wait until a project finishes
    Wait {
        /// Project ID
        id: String,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// List all projects
    List,

    /// Delete a project
    Delete {
        /// Project ID
        id: String,
    },

    /// Share or unshare a project
    Share {
        /// Project ID
        id: String,

        /// New sharing state
        #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
        shared: bool,
    },

    /// Download a finished video
    Download {
        /// Video URL returned by a completed project
        url: String,

        /// Where to write the file
        #[arg(long, short, value_hint = clap::ValueHint::FilePath)]
        output: PathBuf,
    },
}

#[derive(clap::Subcommand)]
pub enum UploadCommand {
    /// Upload a voice recording
    Audio(UploadArgs),

    /// Upload a portrait image
    Image {
        #[command(flatten)]
        file: UploadArgs,

        /// Aspect ratio of the generated video
        #[arg(long, value_enum)]
        aspect_ratio: Option<AspectRatio>,
    },
}

#[derive(clap::Args)]
pub struct UploadArgs {
    /// File to upload, `-` reads from stdin
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub path: PathBuf,

    /// File name reported to the service (default: the file's name)
    #[arg(long)]
    pub filename: Option<String>,
}

impl UploadArgs {
    pub fn is_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }

    pub fn filename(&self) -> Option<String> {
        self.filename.clone().or_else(|| {
            if self.is_stdin() {
                None
            } else {
                self.path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            }
        })
    }
}

#[derive(clap::Args)]
pub struct GenerateArgs {
    /// Text the avatar speaks
    #[arg(long)]
    pub text: Option<String>,

    /// Voice ID for text to speech
    #[arg(long)]
    pub voice_id: Option<String>,

    /// URL of an uploaded voice recording
    #[arg(long)]
    pub voice_url: Option<String>,

    /// URL of an uploaded portrait
    #[arg(long)]
    pub avatar_image: Option<String>,

    /// Aspect ratio of the generated video
    #[arg(long, value_enum)]
    pub aspect_ratio: Option<AspectRatio>,

    /// Where the speech comes from
    #[arg(long, value_enum)]
    pub audio_source: Option<AudioSource>,

    /// Prompt for generating the portrait instead of uploading one
    #[arg(long)]
    pub prompt: Option<String>,

    /// Seed for portrait generation
    #[arg(long, requires = "prompt")]
    pub seed: Option<i64>,

    /// Wait for the project to finish
    #[arg(long, default_value_t = false)]
    pub wait: bool,

    #[command(flatten)]
    pub poll: PollArgs,
}

#[derive(clap::Args)]
pub struct PollArgs {
    /// Milliseconds between status checks
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    pub interval_ms: u64,

    /// Number of status checks before giving up
    #[arg(long, value_name = "N", default_value_t = PollPolicy::DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

impl PollArgs {
    pub fn policy(&self) -> Result<PollPolicy, hedra::api::ApiClientError> {
        PollPolicy::new(Duration::from_millis(self.interval_ms), self.max_attempts)
    }
}
