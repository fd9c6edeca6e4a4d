use std::collections::HashMap;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult, FieldErrors};

/// External object storage for look and piece images.
///
/// Creation flows must call `upload` only after all request validation has
/// passed, and must not persist a record unless the upload succeeded.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> AppResult<()>;
    async fn fetch(&self, key: &str) -> AppResult<Option<Vec<u8>>>;
}

/// Image store backed by an S3-style HTTP gateway
pub struct HttpImageStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpImageStore {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl ImageStore for HttpImageStore {
    async fn upload(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> AppResult<()> {
        self.client
            .put(self.url_for(key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn fetch(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let response = self.client.get(self.url_for(key)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = response.error_for_status()?.bytes().await?;
        Ok(Some(bytes.to_vec()))
    }
}

/// In-process image store for tests and store-less local runs
#[derive(Default)]
pub struct MemoryImageStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn upload(&self, key: &str, _content_type: &str, bytes: Vec<u8>) -> AppResult<()> {
        self.objects.write().await.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn fetch(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        Ok(self.objects.read().await.get(key).cloned())
    }
}

/// Image store whose uploads always fail; lets tests exercise the
/// no-record-on-failed-upload contract
pub struct FailingImageStore;

#[async_trait]
impl ImageStore for FailingImageStore {
    async fn upload(&self, _key: &str, _content_type: &str, _bytes: Vec<u8>) -> AppResult<()> {
        Err(AppError::Internal("image store unavailable".to_string()))
    }

    async fn fetch(&self, _key: &str) -> AppResult<Option<Vec<u8>>> {
        Err(AppError::Internal("image store unavailable".to_string()))
    }
}

pub const UNSUPPORTED_TYPE_MESSAGE: &str =
    "Unsupported image type. Supported extensions: png, jpg, jpeg";

/// Identifies the payload by magic bytes; only JPEG and PNG are accepted
pub fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else {
        None
    }
}

pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        _ => "jpg",
    }
}

/// Decodes and type-checks a base64 image payload, accumulating field
/// errors; shared by the piece and look creation flows
pub fn decode_payload(
    img: Option<String>,
    errors: &mut FieldErrors,
) -> Option<(Vec<u8>, &'static str)> {
    let raw = match img {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            errors.insert("img", "Image is required");
            return None;
        }
    };

    match BASE64.decode(raw.as_bytes()) {
        Ok(bytes) => match sniff_image(&bytes) {
            Some(content_type) => Some((bytes, content_type)),
            None => {
                errors.insert("img", UNSUPPORTED_TYPE_MESSAGE);
                None
            }
        },
        Err(_) => {
            errors.insert("img", "Image is not valid base64");
            None
        }
    }
}

/// Content type for serving a stored object, inferred from the key
pub fn content_type_for_key(key: &str) -> &'static str {
    if key.ends_with(".png") {
        "image/png"
    } else if key.ends_with(".jpg") || key.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}

/// Minimal valid JPEG header, enough to pass `sniff_image` in tests
pub const JPEG_MAGIC: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];
