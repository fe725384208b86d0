use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{Document, Filter, StoredDocument};
use crate::nav::{self, Role};

/// Boolean admin flags a record may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    Featured,
    Verified,
}

impl Flag {
    /// Document field holding the flag.
    pub fn field(self) -> &'static str {
        match self {
            Self::Featured => "isFeatured",
            Self::Verified => "isVerified",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Featured => f.write_str("featured"),
            Self::Verified => f.write_str("verified"),
        }
    }
}

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "featured" => Ok(Self::Featured),
            "verified" => Ok(Self::Verified),
            other => Err(format!("unknown flag '{}'", other)),
        }
    }
}

/// A named file attached to a record.
///
/// The storage path is `{collection}/{id}/{dir}/{file_name}`, so the same slot
/// always lands on the same object and re-uploads overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentSlot {
    /// Record field that receives the durable URL.
    pub field: &'static str,
    pub dir: &'static str,
    pub file_name: &'static str,
    pub content_type: &'static str,
}

impl AttachmentSlot {
    pub fn path(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}/{}", collection, id, self.dir, self.file_name)
    }
}

/// Attachment URLs of one record keyed by field. Empty URLs are never stored.
pub type AttachmentUrls = BTreeMap<&'static str, String>;

/// A record type kept in its own document collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Partial-update payload accepted by `update`.
    type Changes: Serialize + DeserializeOwned + Send + Sync + 'static;

    const COLLECTION: &'static str;
    const ORDER_BY: &'static str;
    const ATTACHMENTS: &'static [AttachmentSlot] = &[];
    /// Roles allowed to read and change the collection. Matches the
    /// visibility of its sidebar entry.
    const MANAGED_BY: &'static [Role] = nav::EVERYONE;

    fn id(&self) -> &str;

    fn managed_by(role: Role) -> bool {
        Self::MANAGED_BY.contains(&role)
    }

    /// Filters applied when listing the collection.
    fn filters() -> Vec<Filter> {
        Vec::new()
    }

    /// Current value of `flag`, or `None` if this record type has no such flag.
    fn flag(&self, _flag: Flag) -> Option<bool> {
        None
    }

    /// Returns false if the flag is not supported.
    fn set_flag(&mut self, _flag: Flag, _value: bool) -> bool {
        false
    }

    fn attachment_url(&self, _field: &str) -> Option<&str> {
        None
    }

    fn attachment_urls(&self) -> AttachmentUrls {
        Self::ATTACHMENTS
            .iter()
            .filter_map(|slot| {
                self.attachment_url(slot.field)
                    .filter(|url| !url.is_empty())
                    .map(|url| (slot.field, url.to_string()))
            })
            .collect()
    }

    fn slot(field: &str) -> Option<&'static AttachmentSlot> {
        Self::ATTACHMENTS.iter().find(|slot| slot.field == field)
    }
}

/// Serialize a record or patch into document fields.
///
/// Any `id` key is dropped: ids belong to the backend and never change.
pub fn to_document<S: Serialize>(value: &S) -> Result<Document, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(mut fields) => {
            fields.remove("id");
            Ok(fields)
        }
        other => Err(<serde_json::Error as serde::de::Error>::custom(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Build a record from a stored document, taking the id from the backend.
pub fn from_document<T: Entity>(doc: StoredDocument) -> Result<T, serde_json::Error> {
    let StoredDocument { id, mut fields } = doc;
    fields.insert("id".to_string(), Value::String(id));
    serde_json::from_value(Value::Object(fields))
}

/// Apply `patch` over `record` field by field.
pub fn merge_into<T: Entity>(record: &T, patch: &Document) -> Result<T, serde_json::Error> {
    let id = record.id().to_string();
    let mut fields = to_document(record)?;
    for (key, value) in patch {
        fields.insert(key.clone(), value.clone());
    }
    from_document(StoredDocument { id, fields })
}
