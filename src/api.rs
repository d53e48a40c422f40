use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tracing::error;

use crate::{
    app_state::AppState,
    error::StoreError,
    models::{File, FileChanges, Folder, FolderChanges, NewFile, NewFolder, NewNote, Note, NoteChanges},
};

type ApiFailure = (StatusCode, Json<Value>);

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/folders",
            get(list_folders_handler).post(create_folder_handler),
        )
        .route(
            "/api/folders/:id",
            put(rename_folder_handler).delete(delete_folder_handler),
        )
        .route("/api/files", post(create_file_handler))
        // GET recibe el id de la carpeta; PUT y DELETE el del fichero.
        .route(
            "/api/files/:id",
            get(list_files_handler)
                .put(update_file_handler)
                .delete(delete_file_handler),
        )
        .route("/api/notes", post(create_note_handler))
        // GET recibe el id del fichero; PUT y DELETE el de la nota.
        .route(
            "/api/notes/:id",
            get(list_notes_handler)
                .put(update_note_handler)
                .delete(delete_note_handler),
        )
        .with_state(app_state)
}

// --- Respuestas de error ---

fn storage_failure(action: &str, err: StoreError) -> ApiFailure {
    error!("Error al {action}: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("Error al {action}: {err}") })),
    )
}

fn not_found(what: &str, id: &str) -> ApiFailure {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("{what} no encontrado: {id}") })),
    )
}

fn deleted() -> Json<Value> {
    Json(json!({ "success": true }))
}

// --- Salud ---

#[axum::debug_handler]
async fn health_handler(State(state): State<AppState>) -> Result<Json<Value>, ApiFailure> {
    state
        .notes
        .ping()
        .await
        .map(|()| Json(json!({ "status": "ok" })))
        .map_err(|e| storage_failure("comprobar el almacenamiento", e))
}

// --- Carpetas ---

#[axum::debug_handler]
async fn list_folders_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Folder>>, ApiFailure> {
    state
        .notes
        .list_folders()
        .await
        .map(Json)
        .map_err(|e| storage_failure("listar carpetas", e))
}

#[axum::debug_handler]
async fn create_folder_handler(
    State(state): State<AppState>,
    Json(payload): Json<NewFolder>,
) -> Result<Json<Folder>, ApiFailure> {
    state
        .notes
        .create_folder(payload)
        .await
        .map(Json)
        .map_err(|e| storage_failure("crear la carpeta", e))
}

#[axum::debug_handler]
async fn rename_folder_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<FolderChanges>,
) -> Result<Json<Folder>, ApiFailure> {
    match state.notes.rename_folder(&id, payload).await {
        Ok(Some(folder)) => Ok(Json(folder)),
        Ok(None) => Err(not_found("Carpeta", &id)),
        Err(e) => Err(storage_failure("renombrar la carpeta", e)),
    }
}

#[axum::debug_handler]
async fn delete_folder_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiFailure> {
    state
        .notes
        .delete_folder(&id)
        .await
        .map(|_| deleted())
        .map_err(|e| storage_failure("borrar la carpeta", e))
}

// --- Ficheros ---

#[axum::debug_handler]
async fn list_files_handler(
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
) -> Result<Json<Vec<File>>, ApiFailure> {
    state
        .notes
        .list_files(&folder_id)
        .await
        .map(Json)
        .map_err(|e| storage_failure("listar ficheros", e))
}

#[axum::debug_handler]
async fn create_file_handler(
    State(state): State<AppState>,
    Json(payload): Json<NewFile>,
) -> Result<Json<File>, ApiFailure> {
    state
        .notes
        .create_file(payload)
        .await
        .map(Json)
        .map_err(|e| storage_failure("crear el fichero", e))
}

#[axum::debug_handler]
async fn update_file_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<FileChanges>,
) -> Result<Json<File>, ApiFailure> {
    match state.notes.update_file(&id, payload).await {
        Ok(Some(file)) => Ok(Json(file)),
        Ok(None) => Err(not_found("Fichero", &id)),
        Err(e) => Err(storage_failure("actualizar el fichero", e)),
    }
}

#[axum::debug_handler]
async fn delete_file_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiFailure> {
    state
        .notes
        .delete_file(&id)
        .await
        .map(|_| deleted())
        .map_err(|e| storage_failure("borrar el fichero", e))
}

// --- Notas ---

#[axum::debug_handler]
async fn list_notes_handler(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<Vec<Note>>, ApiFailure> {
    state
        .notes
        .list_notes(&file_id)
        .await
        .map(Json)
        .map_err(|e| storage_failure("listar notas", e))
}

#[axum::debug_handler]
async fn create_note_handler(
    State(state): State<AppState>,
    Json(payload): Json<NewNote>,
) -> Result<Json<Note>, ApiFailure> {
    state
        .notes
        .create_note(payload)
        .await
        .map(Json)
        .map_err(|e| storage_failure("crear la nota", e))
}

#[axum::debug_handler]
async fn update_note_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<NoteChanges>,
) -> Result<Json<Note>, ApiFailure> {
    match state.notes.update_note(&id, payload).await {
        Ok(Some(note)) => Ok(Json(note)),
        Ok(None) => Err(not_found("Nota", &id)),
        Err(e) => Err(storage_failure("actualizar la nota", e)),
    }
}

#[axum::debug_handler]
async fn delete_note_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiFailure> {
    state
        .notes
        .delete_note(&id)
        .await
        .map(|_| deleted())
        .map_err(|e| storage_failure("borrar la nota", e))
}
