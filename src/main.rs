mod args;
mod progress;

use std::time::Duration;

use clap::Parser;
use hedra::{
    api::{
        ApiClient, ApiClientError, AspectRatio, AvatarImageInput, GenerateRequest, PollPolicy,
        Project, StreamedPayload, UploadKind, UploadPayload, UploadResponse,
    },
    config::ClientConfig,
};
use serde::Serialize;

use crate::args::{Args, Commands, GenerateArgs, UploadArgs, UploadCommand};
use crate::progress::ApiProgress;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let Args {
        api_key,
        url,
        headers,
        timeout,
        command,
    } = Args::parse();

    let mut config = ClientConfig::new(api_key).with_base_url(url);
    for (name, value) in headers {
        config = config.with_header(name, value);
    }
    if let Some(secs) = timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    let client = ApiClient::new(&config)?;

    match command {
        Commands::Ping => {
            client.ping().await?;
            println!("Service is reachable at {}", client.base());
        }
        Commands::Voices => print_json(&client.voices().await?)?,
        Commands::Upload(UploadCommand::Audio(file)) => {
            let uploaded = upload(&client, UploadKind::Audio, &file, None).await?;
            print_json(&uploaded)?;
        }
        Commands::Upload(UploadCommand::Image { file, aspect_ratio }) => {
            let uploaded = upload(&client, UploadKind::Image, &file, aspect_ratio).await?;
            print_json(&uploaded)?;
        }
        Commands::Generate(args) => generate(&client, args).await?,
        Commands::Status { id } => print_json(&client.project(&id).await?)?,
        Commands::Wait { id, poll } => {
            let project = wait(&client, &id, poll.policy()?).await?;
            print_json(&project)?;
        }
        Commands::List => print_json(&client.projects().await?)?,
        Commands::Delete { id } => {
            client.delete_project(&id).await?;
            println!("Deleted project {id}");
        }
        Commands::Share { id, shared } => {
            client.share_project(&id, shared).await?;
            let state = if shared { "shared" } else { "private" };
            println!("Project {id} is now {state}");
        }
        Commands::Download { url, output } => {
            let written = client.download_video(&url, &output).await?;
            println!("Wrote {written} bytes to {}", output.display());
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn upload(
    client: &ApiClient,
    kind: UploadKind,
    file: &UploadArgs,
    aspect_ratio: Option<AspectRatio>,
) -> Result<UploadResponse, ApiClientError> {
    let payload = if file.is_stdin() {
        UploadPayload::Streamed(StreamedPayload::from_reader(tokio::io::stdin()))
    } else {
        UploadPayload::from_path(&file.path).await?
    };
    let filename = file.filename();

    let progress = ApiProgress::new_upload(&kind.to_string());
    let result = client
        .upload(kind, payload, filename.as_deref(), aspect_ratio)
        .await;
    match &result {
        Ok(_) => progress.finish_with_message("✅ Upload finished"),
        Err(_) => progress.finish_and_clear(),
    }
    result
}

async fn wait(
    client: &ApiClient,
    project_id: &str,
    policy: PollPolicy,
) -> Result<Project, ApiClientError> {
    let progress = ApiProgress::new_polling(project_id);
    let mut report = |status: &str| progress.set_message(&format!("Project {project_id}: {status}"));

    let result = client
        .wait_for_project_completion(project_id, Some(&mut report), policy)
        .await;
    match &result {
        Ok(_) => progress.finish_with_message("✅ Project completed"),
        Err(ApiClientError::Job(e)) => {
            progress.finish_and_clear();
            for suggestion in e.suggestions() {
                eprintln!("  • {suggestion}");
            }
        }
        Err(_) => progress.finish_and_clear(),
    }
    result
}

async fn generate(client: &ApiClient, args: GenerateArgs) -> anyhow::Result<()> {
    let policy = args.poll.policy()?;
    let request = GenerateRequest {
        text: args.text,
        voice_id: args.voice_id,
        voice_url: args.voice_url,
        avatar_image: args.avatar_image,
        aspect_ratio: args.aspect_ratio,
        audio_source: args.audio_source,
        avatar_image_input: args
            .prompt
            .map(|prompt| AvatarImageInput {
                seed: args.seed,
                prompt,
            }),
    };

    let submitted = client.generate_character(&request).await?;
    println!("Project id: {}", submitted.job_id);

    if args.wait {
        let project = wait(client, &submitted.job_id, policy).await?;
        print_json(&project)?;
    }
    Ok(())
}
