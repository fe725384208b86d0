use charityhub_types::backend::{
    BackendError, BackendResult, Document, DocumentStore, Query, StoredDocument,
};
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;
use uuid::Uuid;

use crate::models::DocumentRow;
use crate::{Database, DbError, Result};

impl Database {
    // -- Documents --

    /// Insert a document and return its freshly assigned id.
    pub fn insert_document(&self, collection: &str, fields: &Document) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(fields)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (id, collection, body) VALUES (?1, ?2, ?3)",
                (&id, collection, &body),
            )?;
            Ok(())
        })?;
        Ok(id)
    }

    pub fn get_document(&self, collection: &str, id: &str) -> Result<Option<DocumentRow>> {
        self.with_conn(|conn| query_document(conn, collection, id))
    }

    /// Run a collection query: equality filters, ascending order.
    pub fn query_documents(&self, query: &Query) -> Result<Vec<StoredDocument>> {
        let rows = self.with_conn(|conn| query_collection(conn, &query.collection, query.order_by.as_deref()))?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let doc = row.into_stored()?;
            if query.filters.iter().all(|f| f.matches(&doc.fields)) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    /// Merge `fields` into an existing document.
    /// Returns false if the document does not exist.
    pub fn update_document(&self, collection: &str, id: &str, fields: &Document) -> Result<bool> {
        self.with_conn(|conn| {
            let Some(row) = query_document(conn, collection, id)? else {
                return Ok(false);
            };

            let mut body = row.fields()?;
            for (key, value) in fields {
                body.insert(key.clone(), value.clone());
            }

            conn.execute(
                "UPDATE documents SET body = ?1, updated_at = datetime('now')
                 WHERE collection = ?2 AND id = ?3",
                (serde_json::to_string(&body)?, collection, id),
            )?;
            Ok(true)
        })
    }

    /// Returns false if there was nothing to delete.
    pub fn delete_document(&self, collection: &str, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                (collection, id),
            )?;
            Ok(n > 0)
        })
    }
}

fn query_document(conn: &Connection, collection: &str, id: &str) -> Result<Option<DocumentRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, collection, body, created_at, updated_at
         FROM documents WHERE collection = ?1 AND id = ?2",
    )?;

    let row = stmt
        .query_row((collection, id), map_row)
        .optional()?;

    Ok(row)
}

fn query_collection(
    conn: &Connection,
    collection: &str,
    order_by: Option<&str>,
) -> Result<Vec<DocumentRow>> {
    let rows = match order_by {
        Some(field) => {
            let path = json_path(field)?;
            // json_type is NULL only when the field is absent; such documents
            // are not listed.
            let mut stmt = conn.prepare(
                "SELECT id, collection, body, created_at, updated_at
                 FROM documents
                 WHERE collection = ?1 AND json_type(body, ?2) IS NOT NULL
                 ORDER BY json_extract(body, ?2), id",
            )?;
            let rows = stmt
                .query_map((collection, &path), map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, collection, body, created_at, updated_at
                 FROM documents WHERE collection = ?1 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([collection], map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
    };

    Ok(rows)
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        collection: row.get(1)?,
        body: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn json_path(field: &str) -> Result<String> {
    if field.is_empty() || field.contains('"') {
        return Err(DbError::InvalidField(field.to_string()));
    }
    Ok(format!("$.\"{}\"", field))
}

impl DocumentStore for Database {
    async fn query(&self, query: &Query) -> BackendResult<Vec<StoredDocument>> {
        Ok(self.query_documents(query)?)
    }

    async fn get(&self, collection: &str, id: &str) -> BackendResult<Option<StoredDocument>> {
        let row = self.get_document(collection, id)?;
        Ok(row.map(DocumentRow::into_stored).transpose()?)
    }

    async fn insert(&self, collection: &str, fields: Document) -> BackendResult<String> {
        let id = self.insert_document(collection, &fields)?;
        debug!("Inserted {}/{}", collection, id);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> BackendResult<()> {
        if self.update_document(collection, id, &fields)? {
            Ok(())
        } else {
            Err(BackendError::not_found(collection, id))
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> BackendResult<()> {
        if !self.delete_document(collection, id)? {
            debug!("Delete of missing document {}/{}", collection, id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charityhub_types::backend::Filter;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn query_orders_and_filters() {
        let db = Database::open_in_memory().unwrap();
        db.insert_document("charities", &doc(json!({"title": "Oxfam", "private": false})))
            .unwrap();
        db.insert_document("charities", &doc(json!({"title": "Barnardo's", "private": false})))
            .unwrap();
        db.insert_document("charities", &doc(json!({"title": "Alpha", "private": true})))
            .unwrap();
        db.insert_document("charities", &doc(json!({"private": false}))).unwrap();
        db.insert_document("ads", &doc(json!({"title": "Aardvark"}))).unwrap();

        let q = Query::collection("charities")
            .filter(Filter::eq("private", false))
            .order_by("title");
        let titles: Vec<_> = db
            .query_documents(&q)
            .unwrap()
            .into_iter()
            .map(|d| d.fields["title"].clone())
            .collect();

        assert_eq!(titles, vec![json!("Barnardo's"), json!("Oxfam")]);
    }

    #[test]
    fn unordered_query_returns_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        for n in ["c", "a", "b"] {
            db.insert_document("users", &doc(json!({"name": n}))).unwrap();
        }
        let names: Vec<_> = db
            .query_documents(&Query::collection("users"))
            .unwrap()
            .into_iter()
            .map(|d| d.fields["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("c"), json!("a"), json!("b")]);
    }

    #[test]
    fn update_merges_fields() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .insert_document("ads", &doc(json!({"title": "Old", "source": "radio"})))
            .unwrap();

        assert!(db.update_document("ads", &id, &doc(json!({"title": "New"}))).unwrap());

        let fields = db.get_document("ads", &id).unwrap().unwrap().fields().unwrap();
        assert_eq!(fields["title"], json!("New"));
        assert_eq!(fields["source"], json!("radio"));
    }

    #[test]
    fn update_and_delete_of_missing_documents() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.update_document("ads", "nope", &Document::new()).unwrap());
        assert!(!db.delete_document("ads", "nope").unwrap());
    }

    #[test]
    fn rejects_quoted_sort_field() {
        let db = Database::open_in_memory().unwrap();
        let q = Query::collection("ads").order_by("bad\"field");
        assert!(matches!(db.query_documents(&q), Err(DbError::InvalidField(_))));
    }

    #[tokio::test]
    async fn document_store_reports_missing_update() {
        let db = Database::open_in_memory().unwrap();
        let err = DocumentStore::update(&db, "ads", "ghost", Document::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let id = DocumentStore::insert(&db, "ads", doc(json!({"title": "x"})))
            .await
            .unwrap();
        DocumentStore::delete(&db, "ads", &id).await.unwrap();
        assert!(db.get_document("ads", &id).unwrap().is_none());
    }

    #[tokio::test]
    async fn document_store_get_ignores_list_filters() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .insert_document("charities", &doc(json!({"title": "Hidden", "private": true})))
            .unwrap();

        let found = DocumentStore::get(&db, "charities", &id).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.fields["private"], json!(true));
        assert!(DocumentStore::get(&db, "charities", "ghost").await.unwrap().is_none());
    }
}
