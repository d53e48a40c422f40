//! Backend en memoria del proceso. Mantiene el orden de inserción.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{sanitize_changes, stamp_new, Collection, Document, Filter, Store, ID_FIELD};
use crate::error::StoreResult;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn has_id(doc: &Document, id: &str) -> bool {
    doc.get(ID_FIELD).map(String::as_str) == Some(id)
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, collection: Collection, fields: Document) -> StoreResult<Document> {
        let doc = stamp_new(collection, fields)?;
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn find_all(
        &self,
        collection: Collection,
        filter: Option<&Filter>,
    ) -> StoreResult<Vec<Document>> {
        if let Some(filter) = filter {
            collection.check_field(&filter.field)?;
        }
        let guard = self.collections.read().await;
        let docs = guard
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.map_or(true, |f| f.matches(doc)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| has_id(doc, id)))
            .cloned())
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        changes: Document,
    ) -> StoreResult<Option<Document>> {
        let changes = sanitize_changes(collection, changes)?;
        let mut guard = self.collections.write().await;
        let Some(doc) = guard
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|doc| has_id(doc, id)))
        else {
            return Ok(None);
        };
        doc.extend(changes);
        Ok(Some(doc.clone()))
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let mut guard = self.collections.write().await;
        let Some(docs) = guard.get_mut(&collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|doc| !has_id(doc, id));
        Ok(docs.len() != before)
    }

    async fn delete_many(&self, collection: Collection, filter: &Filter) -> StoreResult<u64> {
        collection.check_field(&filter.field)?;
        let mut guard = self.collections.write().await;
        let Some(docs) = guard.get_mut(&collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| !filter.matches(doc));
        Ok((before - docs.len()) as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
