//! Borrado en cascada de la jerarquía Carpeta → Fichero → Nota.
//!
//! El orden es siempre hijos antes que padre (notas, ficheros, carpeta). No
//! hay atomicidad: cada paso se confirma por separado y un error aborta los
//! pasos restantes. Si el proceso cae a mitad pueden quedar ficheros cuya
//! carpeta ya no existe, pero nunca notas de un fichero ya borrado.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::StoreResult;
use crate::store::{Collection, Filter, Store, ID_FIELD};

/// Resumen de lo eliminado por un borrado.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CascadeSummary {
    pub files_deleted: u64,
    pub notes_deleted: u64,
    /// `false` si el registro objetivo no existía (el borrado sigue siendo un éxito).
    pub target_existed: bool,
}

impl fmt::Display for CascadeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ficheros y {} notas eliminados (objetivo {})",
            self.files_deleted,
            self.notes_deleted,
            if self.target_existed { "existente" } else { "inexistente" }
        )
    }
}

#[derive(Clone)]
pub struct HierarchyIntegrity {
    store: Arc<dyn Store>,
}

impl HierarchyIntegrity {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Elimina una carpeta, sus ficheros y las notas de esos ficheros.
    pub async fn delete_folder(&self, folder_id: &str) -> StoreResult<CascadeSummary> {
        let in_folder = Filter::eq("folderId", folder_id);
        let files = self.store.find_all(Collection::Files, Some(&in_folder)).await?;

        let mut summary = CascadeSummary::default();
        for file in &files {
            let Some(file_id) = file.get(ID_FIELD) else {
                warn!("Fichero sin id en la carpeta {folder_id}, se omiten sus notas.");
                continue;
            };
            summary.notes_deleted += self
                .store
                .delete_many(Collection::Notes, &Filter::eq("fileId", file_id.as_str()))
                .await?;
        }

        summary.files_deleted = self.store.delete_many(Collection::Files, &in_folder).await?;
        summary.target_existed = self.store.delete_by_id(Collection::Folders, folder_id).await?;

        info!("Carpeta {folder_id} eliminada: {summary}");
        Ok(summary)
    }

    /// Elimina un fichero y sus notas.
    pub async fn delete_file(&self, file_id: &str) -> StoreResult<CascadeSummary> {
        let notes_deleted = self
            .store
            .delete_many(Collection::Notes, &Filter::eq("fileId", file_id))
            .await?;
        let target_existed = self.store.delete_by_id(Collection::Files, file_id).await?;

        let summary = CascadeSummary {
            files_deleted: u64::from(target_existed),
            notes_deleted,
            target_existed,
        };
        info!("Fichero {file_id} eliminado: {summary}");
        Ok(summary)
    }

    /// Las notas no tienen descendientes.
    pub async fn delete_note(&self, note_id: &str) -> StoreResult<CascadeSummary> {
        let target_existed = self.store.delete_by_id(Collection::Notes, note_id).await?;
        Ok(CascadeSummary {
            notes_deleted: u64::from(target_existed),
            target_existed,
            ..CascadeSummary::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{Document, MemoryStore};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    /// Envuelve un `MemoryStore`, registra las llamadas de borrado y puede
    /// fallar en el borrado masivo de una colección concreta.
    #[derive(Default)]
    struct RecordingStore {
        inner: MemoryStore,
        calls: Mutex<Vec<String>>,
        fail_delete_many_on: Option<Collection>,
    }

    #[async_trait]
    impl Store for RecordingStore {
        async fn insert(&self, collection: Collection, fields: Document) -> StoreResult<Document> {
            self.inner.insert(collection, fields).await
        }

        async fn find_all(
            &self,
            collection: Collection,
            filter: Option<&Filter>,
        ) -> StoreResult<Vec<Document>> {
            self.inner.find_all(collection, filter).await
        }

        async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
            self.inner.find_by_id(collection, id).await
        }

        async fn update_by_id(
            &self,
            collection: Collection,
            id: &str,
            changes: Document,
        ) -> StoreResult<Option<Document>> {
            self.inner.update_by_id(collection, id, changes).await
        }

        async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<bool> {
            self.calls.lock().unwrap().push(format!("delete_by_id {collection}"));
            self.inner.delete_by_id(collection, id).await
        }

        async fn delete_many(&self, collection: Collection, filter: &Filter) -> StoreResult<u64> {
            self.calls.lock().unwrap().push(format!("delete_many {collection}"));
            if self.fail_delete_many_on == Some(collection) {
                return Err(StoreError::Unavailable("conexión perdida".to_string()));
            }
            self.inner.delete_many(collection, filter).await
        }

        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    fn doc(pairs: &[(&str, &str)]) -> Document {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn seed_tree(store: &dyn Store) -> (String, Vec<String>) {
        let folder = store
            .insert(Collection::Folders, doc(&[("name", "Work")]))
            .await
            .unwrap();
        let folder_id = folder[ID_FIELD].clone();

        let mut file_ids = Vec::new();
        for name in ["todo.txt", "ideas.md"] {
            let file = store
                .insert(
                    Collection::Files,
                    doc(&[("folderId", folder_id.as_str()), ("name", name), ("content", "")]),
                )
                .await
                .unwrap();
            for title in ["uno", "dos"] {
                store
                    .insert(
                        Collection::Notes,
                        doc(&[("fileId", file[ID_FIELD].as_str()), ("title", title), ("content", "")]),
                    )
                    .await
                    .unwrap();
            }
            file_ids.push(file[ID_FIELD].clone());
        }
        (folder_id, file_ids)
    }

    #[tokio::test]
    async fn deleting_a_folder_leaves_no_orphans() {
        let store = Arc::new(MemoryStore::new());
        let (folder_id, file_ids) = seed_tree(store.as_ref()).await;

        // Una carpeta vecina no debe verse afectada.
        let (other_folder, other_files) = seed_tree(store.as_ref()).await;

        let integrity = HierarchyIntegrity::new(store.clone());
        let summary = integrity.delete_folder(&folder_id).await.unwrap();

        assert_eq!(
            summary,
            CascadeSummary {
                files_deleted: 2,
                notes_deleted: 4,
                target_existed: true,
            }
        );

        let files = store
            .find_all(Collection::Files, Some(&Filter::eq("folderId", folder_id.as_str())))
            .await
            .unwrap();
        assert!(files.is_empty());
        for file_id in &file_ids {
            let notes = store
                .find_all(Collection::Notes, Some(&Filter::eq("fileId", file_id.as_str())))
                .await
                .unwrap();
            assert!(notes.is_empty());
        }
        assert!(store
            .find_by_id(Collection::Folders, &folder_id)
            .await
            .unwrap()
            .is_none());

        assert!(store
            .find_by_id(Collection::Folders, &other_folder)
            .await
            .unwrap()
            .is_some());
        assert_eq!(store.find_all(Collection::Files, None).await.unwrap().len(), other_files.len());
        assert_eq!(store.find_all(Collection::Notes, None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn deletes_are_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let (folder_id, file_ids) = seed_tree(store.as_ref()).await;
        let integrity = HierarchyIntegrity::new(store);

        assert_ok!(integrity.delete_file(&file_ids[0]).await);
        let again = assert_ok!(integrity.delete_file(&file_ids[0]).await);
        assert_eq!(again, CascadeSummary::default());

        assert_ok!(integrity.delete_folder(&folder_id).await);
        let again = assert_ok!(integrity.delete_folder(&folder_id).await);
        assert!(!again.target_existed);

        let never = assert_ok!(integrity.delete_folder("nunca-existio").await);
        assert_eq!(never, CascadeSummary::default());
        assert!(!assert_ok!(integrity.delete_note("nunca-existio").await).target_existed);
    }

    #[tokio::test]
    async fn file_delete_removes_notes_before_the_file() {
        let store = Arc::new(RecordingStore::default());
        let (_, file_ids) = seed_tree(store.as_ref()).await;
        let integrity = HierarchyIntegrity::new(store.clone());

        let summary = integrity.delete_file(&file_ids[0]).await.unwrap();
        assert_eq!(summary.notes_deleted, 2);
        assert_eq!(summary.files_deleted, 1);

        assert_eq!(
            *store.calls.lock().unwrap(),
            vec!["delete_many Note".to_string(), "delete_by_id File".to_string()]
        );
        let remaining = store
            .find_all(Collection::Notes, Some(&Filter::eq("fileId", file_ids[0].as_str())))
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn folder_delete_runs_notes_then_files_then_folder() {
        let store = Arc::new(RecordingStore::default());
        let (folder_id, _) = seed_tree(store.as_ref()).await;
        let integrity = HierarchyIntegrity::new(store.clone());

        integrity.delete_folder(&folder_id).await.unwrap();

        assert_eq!(
            *store.calls.lock().unwrap(),
            vec![
                "delete_many Note".to_string(),
                "delete_many Note".to_string(),
                "delete_many File".to_string(),
                "delete_by_id Folder".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn storage_error_aborts_remaining_steps() {
        let store = Arc::new(RecordingStore {
            fail_delete_many_on: Some(Collection::Files),
            ..RecordingStore::default()
        });
        let (folder_id, file_ids) = seed_tree(store.as_ref()).await;
        let integrity = HierarchyIntegrity::new(store.clone());

        let err = assert_err!(integrity.delete_folder(&folder_id).await);
        assert!(matches!(err, StoreError::Unavailable(_)));

        // Las notas ya se borraron; ficheros y carpeta siguen ahí.
        for file_id in &file_ids {
            let notes = store
                .find_all(Collection::Notes, Some(&Filter::eq("fileId", file_id.as_str())))
                .await
                .unwrap();
            assert!(notes.is_empty());
        }
        assert_eq!(store.find_all(Collection::Files, None).await.unwrap().len(), 2);
        assert!(store
            .find_by_id(Collection::Folders, &folder_id)
            .await
            .unwrap()
            .is_some());
        assert!(!store
            .calls
            .lock()
            .unwrap()
            .iter()
            .any(|call| call == "delete_by_id Folder"));
    }
}
