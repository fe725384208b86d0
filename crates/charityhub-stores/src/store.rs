use std::sync::Arc;

use charityhub_types::backend::{BackendError, BlobStore, Document, DocumentStore, Query};
use charityhub_types::entity::{self, AttachmentSlot, AttachmentUrls, Entity, Flag};
use futures_util::future::join_all;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::attachments::{self, Attachments};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{collection}/{id} is not loaded")]
    NotLoaded { collection: &'static str, id: String },

    #[error("{collection} records have no {flag} flag")]
    UnsupportedFlag { collection: &'static str, flag: Flag },

    #[error("{collection} records have no attachment '{field}'")]
    UnknownAttachment { collection: &'static str, field: String },

    /// The record exists but one attachment did not make it.
    #[error("{collection}/{id} saved without {field}: {source}")]
    Attachment {
        collection: &'static str,
        id: String,
        field: &'static str,
        #[source]
        source: BackendError,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotLoaded { .. } => true,
            Self::Backend(e) => e.is_not_found(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// In-memory view of one collection plus the actions that change it.
///
/// The collection mirrors the last `fetch_all`. Mutating actions go to the
/// backend first and only touch the local copy once the backend accepted them.
pub struct EntityStore<T, D, B> {
    docs: Arc<D>,
    blobs: Arc<B>,
    records: Vec<T>,
}

impl<T, D, B> EntityStore<T, D, B>
where
    T: Entity,
    D: DocumentStore,
    B: BlobStore,
{
    pub fn new(docs: Arc<D>, blobs: Arc<B>) -> Self {
        Self {
            docs,
            blobs,
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    /// Reload the whole collection, replacing what is held in memory.
    /// On failure the previous contents are kept.
    pub async fn fetch_all(&mut self) -> Result<usize> {
        let query = T::filters()
            .into_iter()
            .fold(Query::collection(T::COLLECTION), Query::filter)
            .order_by(T::ORDER_BY);

        let docs = self
            .docs
            .query(&query)
            .await
            .inspect_err(|e| error!("Fetching {} failed: {}", T::COLLECTION, e))?;

        let records = docs
            .into_iter()
            .map(entity::from_document::<T>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .inspect_err(|e| error!("Decoding {} failed: {}", T::COLLECTION, e))?;

        self.records = records;
        debug!("Loaded {} {}", self.records.len(), T::COLLECTION);
        Ok(self.records.len())
    }

    /// Look a record up in the backend by id, ignoring the list filters.
    pub async fn find(&self, id: &str) -> Result<Option<T>> {
        let doc = self
            .docs
            .get(T::COLLECTION, id)
            .await
            .inspect_err(|e| error!("Reading {}/{} failed: {}", T::COLLECTION, id, e))?;
        Ok(doc.map(entity::from_document::<T>).transpose()?)
    }

    /// Insert `record`, then upload its attachments one by one in slot order.
    ///
    /// Returns the new id. The first failed upload stops the rest and is
    /// reported as [`StoreError::Attachment`]; the record is not rolled back.
    pub async fn add(&self, record: &T, files: &Attachments) -> Result<String> {
        check_slots::<T>(files)?;

        let fields = entity::to_document(record)?;
        let id = self
            .docs
            .insert(T::COLLECTION, fields)
            .await
            .inspect_err(|e| error!("Creating {} record failed: {}", T::COLLECTION, e))?;

        self.upload(&id, files).await?;

        info!("Created {}/{}", T::COLLECTION, id);
        Ok(id)
    }

    /// Upload `files` into the slots of an existing record, replacing the
    /// objects stored there, and return the new URLs.
    ///
    /// Fails the same way as `add`; on failure the loaded copy is left as is.
    pub async fn attach(&mut self, id: &str, files: &Attachments) -> Result<AttachmentUrls> {
        check_slots::<T>(files)?;

        let exists = self
            .docs
            .get(T::COLLECTION, id)
            .await
            .inspect_err(|e| error!("Reading {}/{} failed: {}", T::COLLECTION, id, e))?
            .is_some();
        if !exists {
            return Err(BackendError::not_found(T::COLLECTION, id).into());
        }

        let urls = self.upload(id, files).await?;

        if let Some(pos) = self.position(id) {
            let patch: Document = urls
                .iter()
                .map(|(field, url)| (field.to_string(), Value::String(url.clone())))
                .collect();
            self.records[pos] = entity::merge_into(&self.records[pos], &patch)?;
        }

        info!("Attached {} files to {}/{}", urls.len(), T::COLLECTION, id);
        Ok(urls)
    }

    async fn upload(&self, id: &str, files: &Attachments) -> Result<AttachmentUrls> {
        let mut urls = AttachmentUrls::new();
        for slot in T::ATTACHMENTS {
            let Some(data) = files.get(slot.field) else {
                continue;
            };

            let url = attachments::attach(
                &*self.docs,
                &*self.blobs,
                T::COLLECTION,
                id,
                slot,
                data.clone(),
            )
            .await
            .map_err(|source| {
                error!("Uploading {} for {}/{} failed: {}", slot.field, T::COLLECTION, id, source);
                StoreError::Attachment {
                    collection: T::COLLECTION,
                    id: id.to_string(),
                    field: slot.field,
                    source,
                }
            })?;
            urls.insert(slot.field, url);
        }
        Ok(urls)
    }

    /// Overwrite the fields carried by `changes`.
    pub async fn update(&mut self, id: &str, changes: &T::Changes) -> Result<()> {
        let patch = entity::to_document(changes)?;

        self.docs
            .update(T::COLLECTION, id, patch.clone())
            .await
            .inspect_err(|e| error!("Updating {}/{} failed: {}", T::COLLECTION, id, e))?;

        if let Some(pos) = self.position(id) {
            self.records[pos] = entity::merge_into(&self.records[pos], &patch)?;
        }

        info!("Updated {}/{}", T::COLLECTION, id);
        Ok(())
    }

    /// Delete the record, then each attachment named in `attachment_urls`.
    ///
    /// Attachment removals run concurrently and never undo the record
    /// deletion; failures are logged. Returns how many attachments went away.
    pub async fn delete(&mut self, id: &str, attachment_urls: &AttachmentUrls) -> Result<usize> {
        self.docs
            .delete(T::COLLECTION, id)
            .await
            .inspect_err(|e| error!("Deleting {}/{} failed: {}", T::COLLECTION, id, e))?;

        self.records.retain(|r| r.id() != id);

        let slots: Vec<&'static AttachmentSlot> = T::ATTACHMENTS
            .iter()
            .filter(|slot| {
                attachment_urls
                    .get(slot.field)
                    .is_some_and(|url| !url.is_empty())
            })
            .collect();

        let blobs = &*self.blobs;
        let removals = slots.into_iter().map(|slot| async move {
            let outcome = attachments::detach(blobs, T::COLLECTION, id, slot).await;
            (slot, outcome)
        });

        let mut removed = 0;
        for (slot, outcome) in join_all(removals).await {
            match outcome {
                Ok(()) => removed += 1,
                Err(e) => warn!(
                    "Removing {} of deleted {}/{} failed: {}",
                    slot.field,
                    T::COLLECTION,
                    id,
                    e
                ),
            }
        }

        info!("Deleted {}/{} ({} attachments)", T::COLLECTION, id, removed);
        Ok(removed)
    }

    /// Flip `flag` on a loaded record and return the new value.
    pub async fn toggle_flag(&mut self, id: &str, flag: Flag) -> Result<bool> {
        let pos = self.position(id).ok_or_else(|| StoreError::NotLoaded {
            collection: T::COLLECTION,
            id: id.to_string(),
        })?;

        let current = self.records[pos]
            .flag(flag)
            .ok_or(StoreError::UnsupportedFlag {
                collection: T::COLLECTION,
                flag,
            })?;
        let next = !current;

        let mut patch = Document::new();
        patch.insert(flag.field().to_string(), Value::Bool(next));
        self.docs
            .update(T::COLLECTION, id, patch)
            .await
            .inspect_err(|e| error!("Setting {} on {}/{} failed: {}", flag, T::COLLECTION, id, e))?;

        self.records[pos].set_flag(flag, next);
        Ok(next)
    }

    /// Forget everything held in memory. Used on logout.
    pub fn reset(&mut self) {
        self.records.clear();
    }
}

fn check_slots<T: Entity>(files: &Attachments) -> Result<()> {
    match files.fields().find(|f| T::slot(f).is_none()) {
        Some(field) => Err(StoreError::UnknownAttachment {
            collection: T::COLLECTION,
            field: field.to_string(),
        }),
        None => Ok(()),
    }
}
