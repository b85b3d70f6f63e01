use std::path::Path;
use std::sync::Arc;

use crate::error::{AppError, AppResult};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    name: String,
    media_type: String,
    bytes: Arc<[u8]>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            media_type: PDF_MEDIA_TYPE.to_string(),
            bytes: bytes.into(),
        }
    }

    pub async fn read(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(AppError::invalid_argument("document path must not be empty"));
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                AppError::invalid_argument(format!("document path has no file name: {}", path.display()))
            })?;
        let bytes = tokio::fs::read(path).await.map_err(|source| {
            AppError::io_with_context(source, format!("failed to read document: {}", path.display()))
        })?;
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_buffer(&self) -> SourceBuffer {
        SourceBuffer {
            bytes: Arc::clone(&self.bytes),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceBuffer {
    bytes: Arc<[u8]>,
}

impl SourceBuffer {
    /// A new owned copy. The engine may consume whatever it is handed.
    pub fn fresh_copy(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
