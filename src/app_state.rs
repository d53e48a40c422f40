use std::sync::Arc;

use crate::{config::AppConfig, notes::NotesService, store::Store};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub notes: NotesService,
}

impl AppState {
    /// El handle de almacenamiento se construye fuera y se inyecta aquí.
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        Self {
            config,
            notes: NotesService::new(store),
        }
    }
}
