//! Servicio de notas: traduce las doce operaciones públicas (listar, crear,
//! modificar y borrar Carpetas, Ficheros y Notas) a llamadas al `Store` y al
//! gestor de integridad.
//!
//! No valida la entrada: los campos ausentes se guardan vacíos y un fichero
//! puede crearse en una carpeta que no existe.

use std::sync::Arc;

use crate::error::StoreResult;
use crate::integrity::{CascadeSummary, HierarchyIntegrity};
use crate::models::{
    Entity, File, FileChanges, Folder, FolderChanges, NewFile, NewFolder, NewNote, Note,
    NoteChanges,
};
use crate::store::{Document, Filter, Store};

#[derive(Clone)]
pub struct NotesService {
    store: Arc<dyn Store>,
    integrity: HierarchyIntegrity,
}

impl NotesService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let integrity = HierarchyIntegrity::new(store.clone());
        Self { store, integrity }
    }

    pub async fn ping(&self) -> StoreResult<()> {
        self.store.ping().await
    }

    async fn list<E: Entity>(&self, filter: Option<Filter>) -> StoreResult<Vec<E>> {
        self.store
            .find_all(E::COLLECTION, filter.as_ref())
            .await?
            .into_iter()
            .map(E::from_document)
            .collect()
    }

    async fn create<E: Entity>(&self, fields: Document) -> StoreResult<E> {
        let doc = self.store.insert(E::COLLECTION, fields).await?;
        E::from_document(doc)
    }

    async fn update<E: Entity>(&self, id: &str, changes: Document) -> StoreResult<Option<E>> {
        self.store
            .update_by_id(E::COLLECTION, id, changes)
            .await?
            .map(E::from_document)
            .transpose()
    }

    // --- Carpetas ---

    pub async fn list_folders(&self) -> StoreResult<Vec<Folder>> {
        self.list(None).await
    }

    pub async fn create_folder(&self, input: NewFolder) -> StoreResult<Folder> {
        self.create(input.into_document()).await
    }

    pub async fn rename_folder(&self, id: &str, changes: FolderChanges) -> StoreResult<Option<Folder>> {
        self.update(id, changes.into_document()).await
    }

    pub async fn delete_folder(&self, id: &str) -> StoreResult<CascadeSummary> {
        self.integrity.delete_folder(id).await
    }

    // --- Ficheros ---

    pub async fn list_files(&self, folder_id: &str) -> StoreResult<Vec<File>> {
        self.list(Some(Filter::eq("folderId", folder_id))).await
    }

    pub async fn create_file(&self, input: NewFile) -> StoreResult<File> {
        self.create(input.into_document()).await
    }

    pub async fn update_file(&self, id: &str, changes: FileChanges) -> StoreResult<Option<File>> {
        self.update(id, changes.into_document()).await
    }

    pub async fn delete_file(&self, id: &str) -> StoreResult<CascadeSummary> {
        self.integrity.delete_file(id).await
    }

    // --- Notas ---

    pub async fn list_notes(&self, file_id: &str) -> StoreResult<Vec<Note>> {
        self.list(Some(Filter::eq("fileId", file_id))).await
    }

    pub async fn create_note(&self, input: NewNote) -> StoreResult<Note> {
        self.create(input.into_document()).await
    }

    pub async fn update_note(&self, id: &str, changes: NoteChanges) -> StoreResult<Option<Note>> {
        self.update(id, changes.into_document()).await
    }

    pub async fn delete_note(&self, id: &str) -> StoreResult<CascadeSummary> {
        self.integrity.delete_note(id).await
    }
}
