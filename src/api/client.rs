use std::path::Path;

use futures::StreamExt;
use reqwest::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    Body, Client, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::{config::ClientConfig, errors::RequestFailure};

use super::errors::ApiClientError;
use super::models::{
    GenerateRequest, Project, ProjectInitialization, ProjectList, UploadResponse, VoiceList,
};
use super::polling::{JobPoller, PollPolicy, ProgressCallback, ProjectSource};
use super::types::{AspectRatio, UploadKind};
use super::upload::{MultipartForm, UploadPayload};

/// Handle to the avatar generation API.
///
/// Cloning is cheap: clones share the same connection pool and the
/// headers fixed at construction time.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base: Url,
    client: Client,
}

impl ApiClient {
    /// # Errors
    ///
    /// Fails if the configured `Url` cannot be a base, if a configured
    /// header is invalid or if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let base = config.base_url()?;
        // Test here so that we are sure path_segments_mut succeeds
        if base.cannot_be_a_base() {
            return Err(ApiClientError::CannotBeBase(base));
        }

        let mut builder = Client::builder().default_headers(config.default_headers()?);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base,
            client: builder.build()?,
        })
    }

    pub const fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiClientError> {
        let mut url = self.base.clone();
        let url_clone = url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiClientError::CannotBeBase(url_clone))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Absolute URLs are taken as-is. Relative ones extend the base path
    /// and keep their own query and fragment.
    fn artifact_url(&self, video_url: &str) -> Result<Url, ApiClientError> {
        match Url::parse(video_url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let (rest, fragment) = match video_url.split_once('#') {
                    Some((rest, fragment)) => (rest, Some(fragment)),
                    None => (video_url, None),
                };
                let (path, query) = match rest.split_once('?') {
                    Some((path, query)) => (path, Some(query)),
                    None => (rest, None),
                };

                let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
                let mut url = self.endpoint(&segments)?;
                if query.is_some() {
                    url.set_query(query);
                }
                url.set_fragment(fragment);
                Ok(url)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// # Errors
    ///
    /// Will return `Err` if the URL cannot be a base.
    pub fn project_url(&self, project_id: &str) -> Result<Url, ApiClientError> {
        self.endpoint(&["v1", "projects", project_id])
    }

    /// # Errors
    ///
    /// Will return `Err` if the URL cannot be a base.
    pub fn upload_url(
        &self,
        kind: UploadKind,
        aspect_ratio: Option<AspectRatio>,
    ) -> Result<Url, ApiClientError> {
        let mut url = self.endpoint(&["v1", kind.endpoint()])?;
        match (kind, aspect_ratio) {
            (UploadKind::Image, Some(ratio)) => {
                url.query_pairs_mut()
                    .append_pair("aspect_ratio", ratio.as_str());
            }
            (UploadKind::Audio, Some(ratio)) => {
                log::warn!("Ignoring aspect ratio {ratio} for an audio upload");
            }
            (_, None) => (),
        }
        Ok(url)
    }

    /// # Errors
    ///
    /// Will return `Err` on network failure or a non-success status.
    pub async fn ping(&self) -> Result<(), ApiClientError> {
        let url = self.endpoint(&["ping"])?;
        let response = self.client.get(url.clone()).send().await?;
        ensure_success(&url, response).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Will return `Err` on network failure, a non-success status or an
    /// unexpected response body.
    pub async fn voices(&self) -> Result<VoiceList, ApiClientError> {
        let url = self.endpoint(&["v1", "voices"])?;
        let response = self.client.get(url.clone()).send().await?;
        let response = ensure_success(&url, response).await?;
        parse_json(&url, response).await
    }

    /// Uploads `payload` as the single `file` field of a multipart body.
    ///
    /// The body length is always computed up front and sent as
    /// `Content-Length`; the upload endpoints reject chunked bodies.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::Validation`] when the service answers
    /// 422, and any other failure unchanged.
    pub async fn upload(
        &self,
        kind: UploadKind,
        payload: UploadPayload,
        filename: Option<&str>,
        aspect_ratio: Option<AspectRatio>,
    ) -> Result<UploadResponse, ApiClientError> {
        let url = self.upload_url(kind, aspect_ratio)?;
        let form = MultipartForm::new(payload, filename).await?;
        let content_length = form.content_length();
        log::debug!("Uploading {kind} to {url}: {content_length} bytes");

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, form.content_type())
            .header(CONTENT_LENGTH, content_length)
            .body(Body::wrap_stream(form.into_stream()))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => parse_json(&url, response).await,
            StatusCode::UNPROCESSABLE_ENTITY => {
                let body = response.text().await?;
                log::error!("Upload failed. Server response: {body}");
                Err(ApiClientError::Validation { url, body })
            }
            status_code => Err(ApiClientError::from(RequestFailure::new(
                url,
                status_code,
                response.text().await?,
            ))),
        }
    }

    /// # Errors
    ///
    /// See [`ApiClient::upload`].
    pub async fn upload_audio(
        &self,
        payload: UploadPayload,
        filename: Option<&str>,
    ) -> Result<UploadResponse, ApiClientError> {
        self.upload(UploadKind::Audio, payload, filename, None)
            .await
    }

    /// # Errors
    ///
    /// See [`ApiClient::upload`].
    pub async fn upload_image(
        &self,
        payload: UploadPayload,
        aspect_ratio: Option<AspectRatio>,
        filename: Option<&str>,
    ) -> Result<UploadResponse, ApiClientError> {
        self.upload(UploadKind::Image, payload, filename, aspect_ratio)
            .await
    }

    /// Submits a generation job and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::CreditLimit`] when the account has no
    /// generation credit left (402).
    pub async fn generate_character(
        &self,
        request: &GenerateRequest,
    ) -> Result<ProjectInitialization, ApiClientError> {
        let url = self.endpoint(&["v1", "characters"])?;
        let response = self.client.post(url.clone()).json(request).send().await?;

        match response.status() {
            status if status.is_success() => parse_json(&url, response).await,
            StatusCode::PAYMENT_REQUIRED => Err(ApiClientError::CreditLimit),
            status_code => Err(ApiClientError::from(RequestFailure::new(
                url,
                status_code,
                response.text().await?,
            ))),
        }
    }

    /// # Errors
    ///
    /// Will return `Err` on network failure or a non-success status.
    pub async fn projects(&self) -> Result<ProjectList, ApiClientError> {
        let url = self.endpoint(&["v1", "projects"])?;
        let response = self.client.get(url.clone()).send().await?;
        let response = ensure_success(&url, response).await?;
        parse_json(&url, response).await
    }

    /// # Errors
    ///
    /// Returns [`ApiClientError::JobNotFound`] on 404, otherwise `Err` on
    /// network failure or a non-success status.
    pub async fn project(&self, project_id: &str) -> Result<Project, ApiClientError> {
        let url = self.project_url(project_id)?;
        let response = self.client.get(url.clone()).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiClientError::JobNotFound(project_id.to_owned()));
        }

        let response = ensure_success(&url, response).await?;
        parse_json(&url, response).await
    }

    /// # Errors
    ///
    /// Will return `Err` on network failure or a non-success status.
    pub async fn delete_project(&self, project_id: &str) -> Result<(), ApiClientError> {
        let url = self.project_url(project_id)?;
        let response = self.client.delete(url.clone()).send().await?;
        ensure_success(&url, response).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Will return `Err` on network failure or a non-success status.
    pub async fn share_project(&self, project_id: &str, shared: bool) -> Result<(), ApiClientError> {
        let mut url = self.endpoint(&["v1", "projects", project_id, "sharing"])?;
        url.query_pairs_mut()
            .append_pair("shared", if shared { "true" } else { "false" });

        let response = self.client.post(url.clone()).send().await?;
        ensure_success(&url, response).await?;
        Ok(())
    }

    /// Streams the artifact at `video_url` into `output`, returning the
    /// number of bytes written. Relative URLs resolve against the base.
    ///
    /// # Errors
    ///
    /// Will return `Err` on network failure, a non-success status or if
    /// the file cannot be written.
    pub async fn download_video(
        &self,
        video_url: &str,
        output: impl AsRef<Path>,
    ) -> Result<u64, ApiClientError> {
        let url = self.artifact_url(video_url)?;

        let response = self.client.get(url.clone()).send().await?;
        let response = ensure_success(&url, response).await?;

        let mut file = tokio::fs::File::create(output.as_ref()).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        log::debug!(
            "Downloaded {written} bytes from {url} to {}",
            output.as_ref().display()
        );
        Ok(written)
    }

    /// # Errors
    ///
    /// See [`JobPoller::poll_until_complete`].
    pub async fn wait_for_project_completion(
        &self,
        project_id: &str,
        on_progress: Option<ProgressCallback<'_>>,
        policy: PollPolicy,
    ) -> Result<Project, ApiClientError> {
        JobPoller::new(self, policy)
            .poll_until_complete(project_id, on_progress)
            .await
    }

    /// Submits `request` and polls the new project until it finishes.
    ///
    /// # Errors
    ///
    /// Any error of [`ApiClient::generate_character`] or
    /// [`JobPoller::poll_until_complete`].
    pub async fn generate_and_wait(
        &self,
        request: &GenerateRequest,
        on_progress: Option<ProgressCallback<'_>>,
        policy: PollPolicy,
    ) -> Result<Project, ApiClientError> {
        let ProjectInitialization { job_id } = self.generate_character(request).await?;
        log::debug!("Submitted project {job_id}");
        self.wait_for_project_completion(&job_id, on_progress, policy)
            .await
    }
}

impl ProjectSource for ApiClient {
    async fn fetch_project(&self, project_id: &str) -> Result<Project, ApiClientError> {
        self.project(project_id).await
    }
}

async fn ensure_success(url: &Url, response: Response) -> Result<Response, ApiClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiClientError::from(RequestFailure::new(
            url.clone(),
            status,
            response.text().await?,
        )))
    }
}

async fn parse_json<T: DeserializeOwned>(
    url: &Url,
    response: Response,
) -> Result<T, ApiClientError> {
    let status = response.status();
    let response_text = response.text().await?;
    log::debug!("Raw API Response from {url}: {response_text}");

    serde_json::from_str(&response_text).map_err(|e| {
        log::error!("Failed to parse JSON response: {e}");
        log::error!("Response text: {response_text}");
        ApiClientError::from(RequestFailure::new(
            url.clone(),
            status,
            format!("Failed to parse JSON response: {e}"),
        ))
    })
}
