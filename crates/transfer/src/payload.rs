use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::TransferError;
use crate::mime::detect_content_type;

/// The raw file handed to the uploader: display name, declared MIME type and
/// content.
///
/// Cloning is cheap (the bytes are shared), which lets a failed upload keep
/// its payload around for a retry without copying it.
#[derive(Clone)]
pub struct FilePayload {
    name: String,
    mime_type: String,
    data: Arc<[u8]>,
}

impl FilePayload {
    /// Creates a payload from in-memory bytes.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Reads a file from disk, deriving the MIME type from its extension.
    ///
    /// Unknown extensions get an empty MIME type, which validation rejects.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, TransferError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| TransferError::InvalidPath(path.display().to_string()))?
            .to_string();
        let mime_type = detect_content_type(path).unwrap_or_default();
        let data = tokio::fs::read(path).await?;
        tracing::debug!(path = %path.display(), mime = %mime_type, size = data.len(), "read file");
        Ok(Self::new(name, mime_type, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Shared handle to the content.
    pub fn data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    /// Runs [`validate_file`](crate::validate_file) on this payload.
    pub fn validate(&self) -> Result<(), TransferError> {
        crate::validate_file(self.size(), &self.mime_type)
    }
}

impl fmt::Debug for FilePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePayload")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}
