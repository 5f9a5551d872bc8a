#![allow(clippy::unwrap_used)]

use std::time::Duration;

use bytes::Bytes;
use hedra::api::{
    ApiClient, ApiClientError, AspectRatio, GenerateRequest, JobError, PollPolicy,
    StreamedPayload, UploadPayload,
};
use hedra::config::ClientConfig;
use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    let base = Url::parse(&format!("{}/api", server.uri())).unwrap();
    ApiClient::new(&ClientConfig::new("test-key").with_base_url(base)).unwrap()
}

fn project_body(status: &str) -> serde_json::Value {
    let video_url = (status == "Completed").then_some("https://cdn.example.com/p-1.mp4");
    json!({
        "id": "p-1",
        "status": status,
        "aspectRatio": "1:1",
        "videoUrl": video_url,
    })
}

fn fast_policy(max_attempts: u32) -> PollPolicy {
    PollPolicy::new(Duration::from_millis(10), max_attempts).unwrap()
}

async fn assert_body_matches_length(server: &MockServer) -> Vec<u8> {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    let declared: usize = request
        .headers
        .get("content-length")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(declared, request.body.len());
    assert!(request.headers.get("transfer-encoding").is_none());

    request.body.clone()
}

#[test_log::test(tokio::test)]
async fn test_api_key_header_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ping"))
        .and(header("x-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).ping().await.unwrap();
}

#[test_log::test(tokio::test)]
async fn test_buffered_audio_upload_declares_exact_length() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/audio"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"url": "https://cdn.example.com/a.mp3"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let uploaded = client_for(&server)
        .upload_audio(
            UploadPayload::Buffered(Bytes::from_static(b"ID3 fake mp3 data")),
            Some("voice.mp3"),
        )
        .await
        .unwrap();

    assert_eq!(uploaded.url, "https://cdn.example.com/a.mp3");
    let body = assert_body_matches_length(&server).await;
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("filename=\"voice.mp3\""));
    assert!(text.contains("ID3 fake mp3 data"));
}

#[test_log::test(tokio::test)]
async fn test_streamed_image_upload_declares_exact_length() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/portrait"))
        .and(query_param("aspect_ratio", "16:9"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"url": "https://cdn.example.com/i.png"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("face.png");
    std::fs::write(&image, &data).unwrap();

    let uploaded = client_for(&server)
        .upload_image(
            UploadPayload::from_path(&image).await.unwrap(),
            Some(AspectRatio::Landscape),
            Some("face.png"),
        )
        .await
        .unwrap();

    assert_eq!(uploaded.url, "https://cdn.example.com/i.png");
    let body = assert_body_matches_length(&server).await;
    assert!(body.windows(data.len()).any(|window| window == data.as_slice()));
}

#[test_log::test(tokio::test)]
async fn test_reader_upload_declares_exact_length() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/audio"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"url": "https://cdn.example.com/r.wav"})),
        )
        .mount(&server)
        .await;

    let reader = std::io::Cursor::new(vec![1u8; 12_345]);
    client_for(&server)
        .upload_audio(
            UploadPayload::Streamed(StreamedPayload::from_reader(reader)),
            None,
        )
        .await
        .unwrap();

    assert_body_matches_length(&server).await;
}

#[test_log::test(tokio::test)]
async fn test_upload_validation_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/audio"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({"detail": [{"msg": "file: unsupported format"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .upload_audio(UploadPayload::from(b"not audio".to_vec()), Some("x.txt"))
        .await
        .unwrap_err();

    match err {
        ApiClientError::Validation { url, body } => {
            assert!(url.path().ends_with("/v1/audio"));
            assert!(body.contains("unsupported format"));
        }
        other => panic!("Expected Validation, got {other:?}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_upload_other_failures_propagate_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/portrait"))
        .respond_with(ResponseTemplate::new(413).set_body_string("too big"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .upload_image(UploadPayload::from(vec![0u8; 16]), None, None)
        .await
        .unwrap_err();

    match err {
        ApiClientError::Failure(failure) => {
            assert_eq!(failure.status.as_u16(), 413);
            assert_eq!(failure.msg, "too big");
        }
        other => panic!("Expected Failure, got {other:?}"),
    }
}

#[test_log::test(tokio::test)]
async fn test_generate_character_returns_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/characters"))
        .and(body_json(json!({
            "text": "Hi",
            "avatarImage": "https://cdn.example.com/i.png",
            "aspectRatio": "1:1",
            "audioSource": "tts"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jobId": "p-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let request = GenerateRequest {
        text: Some("Hi".to_owned()),
        avatar_image: Some("https://cdn.example.com/i.png".to_owned()),
        aspect_ratio: Some(AspectRatio::Square),
        audio_source: Some(hedra::api::AudioSource::Tts),
        ..GenerateRequest::default()
    };
    let submitted = client_for(&server)
        .generate_character(&request)
        .await
        .unwrap();

    assert_eq!(submitted.job_id, "p-1");
}

#[test_log::test(tokio::test)]
async fn test_generate_character_without_credit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/characters"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({"detail": "no credit"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate_character(&GenerateRequest::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiClientError::CreditLimit));
    assert!(err.to_string().contains("generation credit limit"));
}

#[test_log::test(tokio::test)]
async fn test_wait_for_completion_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_body("Processing")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_body("Completed")))
        .mount(&server)
        .await;

    let mut seen = Vec::new();
    let mut record = |status: &str| seen.push(status.to_owned());
    let project = client_for(&server)
        .wait_for_project_completion("p-1", Some(&mut record), fast_policy(3))
        .await
        .unwrap();

    assert_eq!(project.video_url(), Some("https://cdn.example.com/p-1.mp4"));
    assert_eq!(seen, vec!["Processing", "Processing", "Completed"]);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[test_log::test(tokio::test)]
async fn test_wait_reports_failed_project() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p-1",
            "status": "Failed",
            "errorMessage": "decode error"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .wait_for_project_completion("p-1", None, fast_policy(5))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApiClientError::Job(JobError::Failed(ref msg)) if msg == "decode error"
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_wait_times_out_after_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_body("Rendering")))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .wait_for_project_completion("p-1", None, fast_policy(3))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApiClientError::Job(JobError::TimedOut { attempts: 3 })
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[test_log::test(tokio::test)]
async fn test_generate_and_wait() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/characters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jobId": "p-1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_body("Completed")))
        .expect(1)
        .mount(&server)
        .await;

    let project = client_for(&server)
        .generate_and_wait(&GenerateRequest::default(), None, fast_policy(3))
        .await
        .unwrap();

    assert!(project.is_completed());
}

#[test_log::test(tokio::test)]
async fn test_missing_project() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server).project("nope").await.unwrap_err();

    assert!(matches!(err, ApiClientError::JobNotFound(ref id) if id == "nope"));
}

#[test_log::test(tokio::test)]
async fn test_project_listing_and_voices() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projects": [project_body("Completed"), project_body("Queued")]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/voices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "supported_voices": [
                {"voice_id": "v-1", "name": "Ava", "premium": false},
                {"voice_id": "v-2", "labels": {"accent": "british"}, "premium": true}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let projects = client.projects().await.unwrap();
    let voices = client.voices().await.unwrap();

    assert_eq!(projects.projects.len(), 2);
    assert!(projects.projects[0].is_completed());
    assert_eq!(voices.supported_voices[0].name.as_deref(), Some("Ava"));
    assert!(voices.supported_voices[1].premium);
}

#[test_log::test(tokio::test)]
async fn test_delete_and_share() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/projects/p-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/projects/p-1/sharing"))
        .and(query_param("shared", "false"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.delete_project("p-1").await.unwrap();
    client.share_project("p-1", false).await.unwrap();
}

#[test_log::test(tokio::test)]
async fn test_download_video_writes_file() {
    let server = MockServer::start().await;
    let video = vec![9u8; 50_000];
    Mock::given(method("GET"))
        .and(path("/videos/p-1.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(video.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("p-1.mp4");
    let written = client_for(&server)
        .download_video(&format!("{}/videos/p-1.mp4", server.uri()), &output)
        .await
        .unwrap();

    assert_eq!(written, 50_000);
    assert_eq!(std::fs::read(&output).unwrap(), video);
}

#[test_log::test(tokio::test)]
async fn test_download_relative_video_url_keeps_query() {
    let server = MockServer::start().await;
    let video = vec![3u8; 2048];
    Mock::given(method("GET"))
        .and(path("/api/videos/a.mp4"))
        .and(query_param("sig", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(video.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("a.mp4");
    let written = client_for(&server)
        .download_video("/videos/a.mp4?sig=abc", &output)
        .await
        .unwrap();

    assert_eq!(written, 2048);
    assert_eq!(std::fs::read(&output).unwrap(), video);
}

#[test_log::test(tokio::test)]
async fn test_server_error_is_request_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).projects().await.unwrap_err();

    assert_eq!(err.error_code(), "E002");
    assert!(err.to_string().contains("maintenance"));
}
