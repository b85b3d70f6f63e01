use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use uuid::Uuid;

pub const PNG_MEDIA_TYPE: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Arc<[u8]>,
    media_type: String,
}

impl Blob {
    pub fn new(bytes: impl Into<Arc<[u8]>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PngFile {
    name: String,
    media_type: String,
    size: usize,
    #[serde(skip)]
    blob: Blob,
}

impl PngFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let blob = Blob::new(bytes, PNG_MEDIA_TYPE);
        Self {
            name: name.into(),
            media_type: blob.media_type().to_string(),
            size: blob.size(),
            blob,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        self.blob.bytes()
    }

    pub fn blob(&self) -> &Blob {
        &self.blob
    }
}

#[derive(Debug)]
pub struct ObjectUrlRegistry {
    origin: String,
    entries: Mutex<HashMap<String, Blob>>,
}

impl ObjectUrlRegistry {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn create(&self, blob: Blob) -> String {
        let url = format!("blob:{}/{}", self.origin, Uuid::new_v4());
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.clone(), blob);
        url
    }

    pub fn resolve(&self, url: &str) -> Option<Blob> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    pub fn revoke(&self, url: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
