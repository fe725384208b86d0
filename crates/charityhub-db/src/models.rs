use charityhub_types::backend::{Document, StoredDocument};

use crate::Result;

/// A row of the `documents` table.
pub struct DocumentRow {
    pub id: String,
    pub collection: String,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

impl DocumentRow {
    pub fn fields(&self) -> Result<Document> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn into_stored(self) -> Result<StoredDocument> {
        let fields = self.fields()?;
        Ok(StoredDocument {
            id: self.id,
            fields,
        })
    }
}
