use crate::config::{ImageStorageMode, StorageConfig};
use crate::db::models::{DbImage, NewImage};
use crate::error::RegistryError;
use futures::future::join_all;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Route under which blob-backed images are served.
pub const BLOB_ROUTE_PREFIX: &str = "/images";

const MAX_EXTENSION_LEN: usize = 10;

static UPLOAD_SEQ: AtomicU64 = AtomicU64::new(0);

/// A file received from a client, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Backing storage for image payloads.
#[derive(Debug, Clone)]
pub enum ImageStore {
    Disk { dir: PathBuf, uploads_prefix: String },
    Blob,
}

impl ImageStore {
    pub fn from_config(cfg: &StorageConfig) -> Self {
        match cfg.mode {
            ImageStorageMode::Disk => Self::Disk {
                dir: cfg.upload_dir.clone(),
                uploads_prefix: normalize_prefix(&cfg.uploads_prefix),
            },
            ImageStorageMode::Blob => Self::Blob,
        }
    }

    /// Create the upload directory when storing on disk.
    pub async fn ensure_ready(&self) -> Result<(), RegistryError> {
        if let Self::Disk { dir, .. } = self {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    /// Write each upload to its backing. Disk files already written are removed
    /// again if a later one fails.
    pub async fn persist_all(
        &self,
        uploads: Vec<ImageUpload>,
    ) -> Result<Vec<NewImage>, RegistryError> {
        let mut saved = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.persist(upload).await {
                Ok(image) => saved.push(image),
                Err(e) => {
                    self.discard_new(&saved).await;
                    return Err(e);
                }
            }
        }
        Ok(saved)
    }

    async fn persist(&self, upload: ImageUpload) -> Result<NewImage, RegistryError> {
        let content_type = upload
            .content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        match self {
            Self::Disk { dir, .. } => {
                let file_name = stored_file_name(&upload.file_name);
                tokio::fs::write(dir.join(&file_name), &upload.data).await?;
                debug!(file = %file_name, bytes = upload.data.len(), "stored upload on disk");
                Ok(NewImage::Path {
                    file_path: file_name,
                    content_type,
                })
            }
            Self::Blob => Ok(NewImage::Blob {
                data: upload.data,
                content_type,
            }),
        }
    }

    /// Identifier the client echoes back in its keep list.
    pub fn identifier(&self, image: &DbImage) -> String {
        match image.file_path.as_deref() {
            Some(path) => file_name_of(path).to_string(),
            None => image.id.to_string(),
        }
    }

    /// Public URL of a stored image.
    pub fn url(&self, image: &DbImage) -> String {
        match (self, image.file_path.as_deref()) {
            (Self::Disk { uploads_prefix, .. }, Some(path)) => {
                format!("{}/{}", uploads_prefix, file_name_of(path))
            }
            _ => format!("{}/{}", BLOB_ROUTE_PREFIX, image.id),
        }
    }

    /// Best-effort removal of the backing files of stored images.
    pub async fn discard(&self, images: &[DbImage]) {
        let paths = images.iter().filter_map(|img| img.file_path.as_deref());
        self.remove_files(paths).await;
    }

    /// Best-effort removal of files written for images that never got a row.
    pub async fn discard_new(&self, images: &[NewImage]) {
        self.remove_files(images.iter().filter_map(NewImage::file_path))
            .await;
    }

    async fn remove_files<'a>(&self, names: impl Iterator<Item = &'a str>) {
        let Self::Disk { dir, .. } = self else {
            return;
        };
        let removals = names.map(|name| remove_file_quietly(dir.join(file_name_of(name))));
        join_all(removals).await;
    }
}

async fn remove_file_quietly(path: PathBuf) {
    match tokio::fs::remove_file(&path).await {
        Ok(()) => debug!(path = %path.display(), "removed image file"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove image file"),
    }
}

/// Route prefix with exactly one leading `/` and no trailing one; `/uploads` when blank.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/uploads".to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Last `/`-separated segment; strips any directory or URL prefix.
pub fn file_name_of(reference: &str) -> &str {
    let trimmed = reference.trim().trim_end_matches('/');
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}

/// `hero-{millis}-{seq}{.ext}`; the client's name only contributes a sanitized extension.
pub fn stored_file_name(original: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let seq = UPLOAD_SEQ.fetch_add(1, Ordering::Relaxed);
    match sanitized_extension(original) {
        Some(ext) => format!("hero-{millis}-{seq}.{ext}"),
        None => format!("hero-{millis}-{seq}"),
    }
}

fn sanitized_extension(original: &str) -> Option<String> {
    let ext = Path::new(file_name_of(original)).extension()?.to_str()?;
    let valid = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}
