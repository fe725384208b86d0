use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::Flag;
use crate::nav::Role;

// -- JWT Claims --

/// Claims of the bearer tokens issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub role: Role,
    pub exp: usize,
}

// -- Records --

/// Body of `POST /{collection}`: the record plus base64 attachment payloads
/// keyed by record field (e.g. `coverPicture`).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRequest<T> {
    pub record: T,
    #[serde(default)]
    pub attachments: BTreeMap<String, String>,
}

/// Body of `PUT /{collection}/{id}/attachments`: base64 payloads keyed by
/// record field, replacing whatever is stored in those slots.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttachRequest {
    pub attachments: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct AttachedResponse {
    pub id: String,
    pub urls: BTreeMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: String,
    pub attachments_removed: usize,
}

#[derive(Debug, Serialize)]
pub struct FlagResponse {
    pub id: String,
    pub flag: Flag,
    pub value: bool,
}

// -- Utilities --

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DateResponse {
    pub formatted: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub path: String,
}
