use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Result;
use bytes::Bytes;
use charityhub_types::backend::{BackendError, BackendResult, BlobStore};
use tokio::fs;
use tracing::{debug, info, warn};

/// On-disk object storage for record attachments.
///
/// An object at `charities/{id}/documents/document.pdf` lives at the same
/// relative path under `dir` and is served by the router under `/files`.
pub struct Storage {
    dir: PathBuf,
    public_url: String,
}

impl Storage {
    pub async fn new(dir: PathBuf, public_url: impl Into<String>) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Blob storage directory: {}", dir.display());
        Ok(Self {
            dir,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve an object path to a file below the storage directory.
    /// Rejects anything that could escape it.
    pub fn file_path(&self, path: &str) -> BackendResult<PathBuf> {
        let valid = !path.is_empty()
            && !path.contains('\\')
            && path
                .split('/')
                .all(|seg| !seg.is_empty() && seg != "." && seg != "..");
        if !valid {
            return Err(BackendError::InvalidPath(path.to_string()));
        }
        Ok(self.dir.join(path))
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/files/{}", self.public_url, path)
    }

    /// Size of a stored object.
    pub async fn object_size(&self, path: &str) -> BackendResult<u64> {
        let file = self.file_path(path)?;
        match fs::metadata(&file).await {
            Ok(meta) if meta.is_file() => Ok(meta.len()),
            Ok(_) => Err(BackendError::not_found("blobs", path)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BackendError::not_found("blobs", path)),
            Err(e) => Err(BackendError::backend(e)),
        }
    }
}

impl BlobStore for Storage {
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> BackendResult<()> {
        let file = self.file_path(path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).await.map_err(BackendError::backend)?;
        }
        fs::write(&file, &data).await.map_err(BackendError::backend)?;
        debug!("Stored {} ({} bytes, {})", path, data.len(), content_type);
        Ok(())
    }

    async fn download_url(&self, path: &str) -> BackendResult<String> {
        self.object_size(path).await?;
        Ok(self.url_for(path))
    }

    async fn delete(&self, path: &str) -> BackendResult<()> {
        let file = self.file_path(path)?;
        match fs::remove_file(&file).await {
            Ok(()) => {
                info!("Deleted blob {}", path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Blob {} already gone", path);
                Ok(())
            }
            Err(e) => Err(BackendError::backend(e)),
        }
    }
}
