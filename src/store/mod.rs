//! Capa de acceso al almacenamiento: operaciones CRUD genéricas sobre las tres
//! colecciones (Folders, Files, Notes), indexadas por un id único.
//!
//! Cada llamada se confirma de forma independiente; no hay transacciones que
//! abarquen varias llamadas.

pub mod memory;
pub mod neo4j;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

pub use memory::MemoryStore;
pub use neo4j::Neo4jStore;

/// Registro en forma de datos planos: nombre de campo → valor.
pub type Document = BTreeMap<String, String>;

pub const ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "createdAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Folders,
    Files,
    Notes,
}

impl Collection {
    /// Etiqueta del nodo en Neo4j.
    pub fn label(self) -> &'static str {
        match self {
            Self::Folders => "Folder",
            Self::Files => "File",
            Self::Notes => "Note",
        }
    }

    /// Conjunto cerrado de campos que admite cada colección.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Folders => &["id", "name", "createdAt"],
            Self::Files => &["id", "folderId", "name", "content", "createdAt"],
            Self::Notes => &["id", "fileId", "title", "content", "createdAt"],
        }
    }

    pub fn check_field(self, field: &str) -> StoreResult<()> {
        if self.fields().contains(&field) {
            Ok(())
        } else {
            Err(StoreError::UnknownField {
                collection: self.label(),
                field: field.to_string(),
            })
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Filtro de igualdad sobre un único campo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.field) == Some(&self.value)
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Asigna id y `createdAt`, persiste y devuelve el registro guardado.
    async fn insert(&self, collection: Collection, fields: Document) -> StoreResult<Document>;

    async fn find_all(
        &self,
        collection: Collection,
        filter: Option<&Filter>,
    ) -> StoreResult<Vec<Document>>;

    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>>;

    /// Mezcla `changes` en el registro existente; los campos no indicados
    /// conservan su valor. `None` si el id no existe.
    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        changes: Document,
    ) -> StoreResult<Option<Document>>;

    /// `true` si había un registro con ese id.
    async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<bool>;

    async fn delete_many(&self, collection: Collection, filter: &Filter) -> StoreResult<u64>;

    async fn ping(&self) -> StoreResult<()>;
}

/// Valida los campos de un alta y le añade id y fecha de creación.
pub(crate) fn stamp_new(collection: Collection, mut fields: Document) -> StoreResult<Document> {
    for key in fields.keys() {
        collection.check_field(key)?;
    }
    fields.insert(ID_FIELD.to_string(), Uuid::new_v4().to_string());
    fields.insert(CREATED_AT_FIELD.to_string(), Utc::now().to_rfc3339());
    Ok(fields)
}

/// Valida los campos de una actualización y descarta los que el sistema gestiona.
pub(crate) fn sanitize_changes(collection: Collection, mut changes: Document) -> StoreResult<Document> {
    for key in changes.keys() {
        collection.check_field(key)?;
    }
    changes.remove(ID_FIELD);
    changes.remove(CREATED_AT_FIELD);
    Ok(changes)
}
