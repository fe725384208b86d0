//! Narrow interface to the managed backends.
//!
//! Stores only ever talk to a document database and an object store through
//! these two traits, so the concrete adapters (SQLite, local disk, or a hosted
//! service) can be swapped without touching store logic.

use std::future::Future;

use bytes::Bytes;
use serde_json::{Map, Value};
use thiserror::Error;

/// Field map of a single document, without its identifier.
pub type Document = Map<String, Value>;

/// A document as returned by a query: backend-assigned id plus fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

/// Equality predicate on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, fields: &Document) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }
}

/// Collection query: all filters must match, results ascending by `order_by`.
///
/// Documents that lack the `order_by` field are not returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<String>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BackendError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Document database collection API.
pub trait DocumentStore: Send + Sync {
    fn query(&self, query: &Query) -> impl Future<Output = BackendResult<Vec<StoredDocument>>> + Send;

    /// Fetch one document by id, regardless of any list filter.
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = BackendResult<Option<StoredDocument>>> + Send;

    /// Insert a new document and return the id the backend assigned to it.
    fn insert(
        &self,
        collection: &str,
        fields: Document,
    ) -> impl Future<Output = BackendResult<String>> + Send;

    /// Overwrite the given top-level fields, leaving the others untouched.
    fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> impl Future<Output = BackendResult<()>> + Send;

    fn delete(&self, collection: &str, id: &str) -> impl Future<Output = BackendResult<()>> + Send;
}

/// Object storage API, addressed by slash-separated paths.
pub trait BlobStore: Send + Sync {
    fn upload(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> impl Future<Output = BackendResult<()>> + Send;

    /// Durable URL of an uploaded object. Fails if nothing is stored there.
    fn download_url(&self, path: &str) -> impl Future<Output = BackendResult<String>> + Send;

    fn delete(&self, path: &str) -> impl Future<Output = BackendResult<()>> + Send;
}
