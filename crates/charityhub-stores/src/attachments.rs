use std::collections::BTreeMap;

use bytes::Bytes;
use charityhub_types::backend::{BackendResult, BlobStore, Document, DocumentStore};
use charityhub_types::entity::AttachmentSlot;
use serde_json::Value;
use tracing::info;

/// File payloads to upload with a new record, keyed by record field.
#[derive(Debug, Clone, Default)]
pub struct Attachments {
    files: BTreeMap<String, Bytes>,
}

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.insert(field, data);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, data: impl Into<Bytes>) {
        self.files.insert(field.into(), data.into());
    }

    pub fn get(&self, field: &str) -> Option<&Bytes> {
        self.files.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Upload `data` into `slot` of record `collection/id` and store the
/// resulting URL on the record. Returns the URL.
///
/// Not atomic: if the record update fails the blob stays uploaded.
pub async fn attach<D, B>(
    docs: &D,
    blobs: &B,
    collection: &str,
    id: &str,
    slot: &AttachmentSlot,
    data: Bytes,
) -> BackendResult<String>
where
    D: DocumentStore,
    B: BlobStore,
{
    let path = slot.path(collection, id);
    let size = data.len();

    blobs.upload(&path, data, slot.content_type).await?;
    let url = blobs.download_url(&path).await?;

    let mut fields = Document::new();
    fields.insert(slot.field.to_string(), Value::String(url.clone()));
    docs.update(collection, id, fields).await?;

    info!("Attached {} ({} bytes) to {}/{}", slot.field, size, collection, id);
    Ok(url)
}

/// Remove the blob behind `slot` of record `collection/id`.
pub async fn detach<B: BlobStore>(
    blobs: &B,
    collection: &str,
    id: &str,
    slot: &AttachmentSlot,
) -> BackendResult<()> {
    blobs.delete(&slot.path(collection, id)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryBlobs;
    use charityhub_db::Database;
    use charityhub_types::entity::Entity;
    use charityhub_types::models::Charity;
    use serde_json::json;

    #[tokio::test]
    async fn attach_uploads_and_records_url() {
        let db = Database::open_in_memory().unwrap();
        let blobs = MemoryBlobs::default();
        let id = db.insert_document("charities", &Document::new()).unwrap();
        let slot = Charity::slot("documents").unwrap();

        let url = attach(&db, &blobs, "charities", &id, slot, Bytes::from_static(b"%PDF"))
            .await
            .unwrap();

        assert_eq!(url, format!("mem://charities/{}/documents/document.pdf", id));
        assert!(blobs.contains(&format!("charities/{}/documents/document.pdf", id)));
        let fields = db.get_document("charities", &id).unwrap().unwrap().fields().unwrap();
        assert_eq!(fields["documents"], json!(url));
    }

    #[tokio::test]
    async fn failed_upload_leaves_record_untouched() {
        let db = Database::open_in_memory().unwrap();
        let blobs = MemoryBlobs::default();
        let id = db.insert_document("ads", &Document::new()).unwrap();
        let path = format!("ads/{}/files/file", id);
        blobs.fail_upload(&path);

        let slot = charityhub_types::models::Advertisement::slot("file").unwrap();
        assert!(attach(&db, &blobs, "ads", &id, slot, Bytes::from_static(b"x")).await.is_err());

        let fields = db.get_document("ads", &id).unwrap().unwrap().fields().unwrap();
        assert!(fields.get("file").is_none());
    }

    #[test]
    fn attachments_builder_tracks_fields() {
        let files = Attachments::new()
            .with("coverPicture", Bytes::from_static(b"a"))
            .with("documents", vec![1u8, 2, 3]);
        assert_eq!(files.len(), 2);
        assert_eq!(files.fields().collect::<Vec<_>>(), vec!["coverPicture", "documents"]);
        assert_eq!(files.get("documents").unwrap().len(), 3);
    }
}
