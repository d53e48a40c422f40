//! Modelos de dominio (Carpeta → Fichero → Nota) y sus estructuras de alta y
//! de modificación.
//!
//! La propiedad es por referencia: un `File` guarda el id de su carpeta y una
//! `Note` el id de su fichero, ninguna entidad contiene a sus hijos.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::store::{Collection, Document};

/// Raíz de la jerarquía.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Fichero de texto perteneciente a una carpeta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub folder_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Nota perteneciente a un fichero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Entidades que se guardan en una colección del `Store`.
pub trait Entity: DeserializeOwned + Send {
    const COLLECTION: Collection;

    fn from_document(doc: Document) -> StoreResult<Self> {
        let value = serde_json::to_value(doc).map_err(malformed::<Self>)?;
        serde_json::from_value(value).map_err(malformed::<Self>)
    }
}

fn malformed<E: Entity>(err: serde_json::Error) -> StoreError {
    StoreError::Malformed {
        collection: E::COLLECTION.label(),
        reason: err.to_string(),
    }
}

impl Entity for Folder {
    const COLLECTION: Collection = Collection::Folders;
}

impl Entity for File {
    const COLLECTION: Collection = Collection::Files;
}

impl Entity for Note {
    const COLLECTION: Collection = Collection::Notes;
}

// --- Altas ---

/// Acepta cualquier escalar JSON como texto (`42` → `"42"`, `true` → `"true"`);
/// `null` equivale a un campo ausente. La entrada no se valida.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFolder {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFile {
    #[serde(default, deserialize_with = "lenient_string")]
    pub folder_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    #[serde(default, deserialize_with = "lenient_string")]
    pub file_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: Option<String>,
}

impl NewFolder {
    pub fn into_document(self) -> Document {
        Document::from([("name".to_string(), self.name.unwrap_or_default())])
    }
}

impl NewFile {
    /// Un fichero nuevo siempre empieza con contenido vacío.
    pub fn into_document(self) -> Document {
        Document::from([
            ("folderId".to_string(), self.folder_id.unwrap_or_default()),
            ("name".to_string(), self.name.unwrap_or_default()),
            ("content".to_string(), String::new()),
        ])
    }
}

impl NewNote {
    pub fn into_document(self) -> Document {
        Document::from([
            ("fileId".to_string(), self.file_id.unwrap_or_default()),
            ("title".to_string(), self.title.unwrap_or_default()),
            ("content".to_string(), self.content.unwrap_or_default()),
        ])
    }
}

// --- Modificaciones: `None` deja el campo como estaba ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderChanges {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileChanges {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteChanges {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: Option<String>,
}

fn changes_document(pairs: [(&str, Option<String>); 2]) -> Document {
    pairs
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field.to_string(), v)))
        .collect()
}

impl FolderChanges {
    pub fn into_document(self) -> Document {
        self.name
            .map(|name| Document::from([("name".to_string(), name)]))
            .unwrap_or_default()
    }
}

impl FileChanges {
    pub fn into_document(self) -> Document {
        changes_document([("name", self.name), ("content", self.content)])
    }
}

impl NoteChanges {
    pub fn into_document(self) -> Document {
        changes_document([("title", self.title), ("content", self.content)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entities_serialize_with_mongo_style_ids() {
        let doc = Document::from([
            ("id".to_string(), "n1".to_string()),
            ("fileId".to_string(), "f1".to_string()),
            ("title".to_string(), "comprar leche".to_string()),
            ("content".to_string(), String::new()),
            ("createdAt".to_string(), "2024-05-01T10:00:00+00:00".to_string()),
        ]);

        let note = Note::from_document(doc).unwrap();
        let value = serde_json::to_value(&note).unwrap();

        assert_eq!(value["_id"], "n1");
        assert_eq!(value["fileId"], "f1");
        assert_eq!(value["title"], "comprar leche");
        assert!(value.get("id").is_none());
        assert!(value["createdAt"].as_str().unwrap().starts_with("2024-05-01T10:00:00"));
    }

    #[test]
    fn documents_without_timestamp_are_malformed() {
        let doc = Document::from([("id".to_string(), "x".to_string())]);
        let err = Folder::from_document(doc).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { collection: "Folder", .. }));
    }

    #[test]
    fn missing_fields_default_to_empty_on_create() {
        let note: NewNote = serde_json::from_value(json!({ "fileId": "f1" })).unwrap();
        let doc = note.into_document();
        assert_eq!(doc["title"], "");
        assert_eq!(doc["content"], "");

        let file: NewFile = serde_json::from_value(json!({ "name": "todo.txt" })).unwrap();
        let doc = file.into_document();
        assert_eq!(doc["folderId"], "");
        assert_eq!(doc["content"], "");
    }

    #[test]
    fn changes_only_carry_given_fields() {
        let changes: FileChanges = serde_json::from_value(json!({ "content": "hola" })).unwrap();
        let doc = changes.into_document();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["content"], "hola");

        assert!(FolderChanges::default().into_document().is_empty());
    }

    #[test]
    fn non_string_scalars_are_stored_as_text() {
        let folder: NewFolder = serde_json::from_value(json!({ "name": 42 })).unwrap();
        assert_eq!(folder.name.as_deref(), Some("42"));

        let note: NewNote =
            serde_json::from_value(json!({ "fileId": 7, "title": true, "content": 1.5 })).unwrap();
        let doc = note.into_document();
        assert_eq!(doc["fileId"], "7");
        assert_eq!(doc["title"], "true");
        assert_eq!(doc["content"], "1.5");
    }

    #[test]
    fn null_fields_leave_values_untouched() {
        let changes: NoteChanges =
            serde_json::from_value(json!({ "title": null, "content": "nuevo" })).unwrap();
        let doc = changes.into_document();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["content"], "nuevo");
    }
}
