//! File storage API client.
//!
//! Async HTTP client using `reqwest`, with an optional Bearer token and one
//! request timeout shared by every call.

use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use taskpilot_protocol::constants::{
    self, DEFAULT_API_BASE_URL, FIELD_FILE, FIELD_FILE_NAME, FIELD_FILE_SIZE, FIELD_FILE_TYPE,
    FILES_PATH, REQUEST_TIMEOUT, UPLOAD_PATH,
};
use taskpilot_protocol::messages::{DeleteResponse, ErrorBody, FileListResponse, UploadResponse};
use taskpilot_protocol::types::StoredFile;
use taskpilot_transfer::{FilePayload, ProgressFn, ProgressReporter};
use tracing::{debug, warn};

/// Bytes handed to the HTTP stack per progress step.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Errors from the file storage client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("API error {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// The server answered 2xx but refused the operation.
    #[error("{0}")]
    Rejected(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid API token")]
    InvalidHeader,
}

impl ClientError {
    /// Server-provided failure text, if the server sent one.
    ///
    /// Transport failures (connection, timeout, malformed body) return
    /// `None`; callers show their own generic message for those.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            ClientError::Api { message, .. } => message.as_deref(),
            ClientError::Rejected(message) => Some(message),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Http(e)
        }
    }
}

/// Settings for [`FileClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:3001/api`.
    pub base_url: String,
    /// Applied to every request.
    pub timeout: Duration,
    /// Sent as `Authorization: Bearer <token>` when set.
    pub bearer_token: Option<String>,
    /// When `true`, [`FileTransport::list`](crate::FileTransport::list)
    /// degrades list failures to an empty list.
    pub fail_open_list: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
            bearer_token: None,
            fail_open_list: true,
        }
    }
}

/// File storage API client.
pub struct FileClient {
    http: reqwest::Client,
    base_url: String,
    fail_open_list: bool,
}

impl FileClient {
    /// Creates a new client from `config`.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.bearer_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|_| ClientError::InvalidHeader)?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            fail_open_list: config.fail_open_list,
        })
    }

    /// Whether list failures degrade to an empty list.
    pub fn fail_open_list(&self) -> bool {
        self.fail_open_list
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Uploads one file as multipart form data.
    ///
    /// `on_progress` receives non-decreasing percentages while the body is
    /// streamed; it is held at 99 until the server confirms, then gets 100.
    pub async fn upload(
        &self,
        payload: &FilePayload,
        on_progress: ProgressFn,
    ) -> Result<StoredFile, ClientError> {
        let reporter = ProgressReporter::new(payload.size(), on_progress);
        let body = progress_body(payload.data(), reporter.clone());

        let part = Part::stream_with_length(body, payload.size())
            .file_name(payload.name().to_string())
            .mime_str(payload.mime_type())?;
        let form = Form::new()
            .part(FIELD_FILE, part)
            .text(FIELD_FILE_NAME, payload.name().to_string())
            .text(FIELD_FILE_TYPE, payload.mime_type().to_string())
            .text(FIELD_FILE_SIZE, payload.size().to_string());

        debug!(name = %payload.name(), size = payload.size(), "uploading file");
        let resp = self
            .http
            .post(self.url(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let parsed: UploadResponse = serde_json::from_slice(&body)?;
        if parsed.success
            && let Some(file) = parsed.file
        {
            reporter.finish();
            return Ok(file);
        }
        Err(ClientError::Rejected(
            parsed.reason().unwrap_or("Upload failed").to_string(),
        ))
    }

    /// Lists stored files, surfacing any failure.
    pub async fn try_list(&self) -> Result<Vec<StoredFile>, ClientError> {
        let resp = self.http.get(self.url(FILES_PATH)).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let parsed: FileListResponse = serde_json::from_slice(&body)?;
        Ok(parsed.files)
    }

    /// Lists stored files; any failure yields an empty list.
    pub async fn list(&self) -> Vec<StoredFile> {
        match self.try_list().await {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "failed to fetch file list, showing none");
                Vec::new()
            }
        }
    }

    /// Deletes a stored file.
    pub async fn remove(&self, id: &str) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(self.url(&constants::file_path(&encode_id(id))))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let parsed: DeleteResponse = serde_json::from_slice(&body)?;
        if parsed.success {
            Ok(())
        } else {
            let reason = parsed
                .error
                .or(parsed.message)
                .unwrap_or_else(|| "Failed to delete file".into());
            Err(ClientError::Rejected(reason))
        }
    }

    /// Fetches a stored file's content.
    pub async fn fetch_bytes(&self, id: &str) -> Result<Vec<u8>, ClientError> {
        let resp = self
            .http
            .get(self.url(&constants::download_path(&encode_id(id))))
            .send()
            .await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.bytes().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

/// Builds a streaming request body that reports progress as chunks are
/// pulled by the HTTP stack.
fn progress_body(data: Arc<[u8]>, reporter: ProgressReporter) -> reqwest::Body {
    let len = data.len();
    let chunks = (0..len).step_by(UPLOAD_CHUNK_SIZE).map(move |start| {
        let end = (start + UPLOAD_CHUNK_SIZE).min(len);
        reporter.advance((end - start) as u64);
        Ok::<_, std::io::Error>(data[start..end].to_vec())
    });
    reqwest::Body::wrap_stream(futures_util::stream::iter(chunks))
}

fn api_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.reason().map(str::to_string));
    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}

fn encode_id(id: &str) -> String {
    utf8_percent_encode(id, NON_ALPHANUMERIC).to_string()
}
