//! In-memory blob store with failure injection for store tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use bytes::Bytes;
use charityhub_types::backend::{BackendError, BackendResult, BlobStore};

#[derive(Default)]
pub struct MemoryBlobs {
    objects: Mutex<HashMap<String, Bytes>>,
    failing_uploads: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
}

impl MemoryBlobs {
    pub fn fail_upload(&self, path: &str) {
        self.failing_uploads.lock().unwrap().insert(path.to_string());
    }

    pub fn fail_delete(&self, path: &str) {
        self.failing_deletes.lock().unwrap().insert(path.to_string());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.lock().unwrap().contains_key(path)
    }

    pub fn put(&self, path: &str, data: &'static [u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), Bytes::from_static(data));
    }
}

impl BlobStore for MemoryBlobs {
    async fn upload(&self, path: &str, data: Bytes, _content_type: &str) -> BackendResult<()> {
        if self.failing_uploads.lock().unwrap().contains(path) {
            return Err(BackendError::backend(format!("upload to {} refused", path)));
        }
        self.objects.lock().unwrap().insert(path.to_string(), data);
        Ok(())
    }

    async fn download_url(&self, path: &str) -> BackendResult<String> {
        if !self.contains(path) {
            return Err(BackendError::not_found("blobs", path));
        }
        Ok(format!("mem://{}", path))
    }

    async fn delete(&self, path: &str) -> BackendResult<()> {
        if self.failing_deletes.lock().unwrap().contains(path) {
            return Err(BackendError::backend(format!("delete of {} refused", path)));
        }
        self.objects.lock().unwrap().remove(path);
        Ok(())
    }
}
