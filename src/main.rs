// Módulos de la aplicación
mod api;
mod app_state;
mod config;
mod error;
mod integrity;
mod models;
mod notes;
mod store;

use crate::app_state::AppState;
use crate::config::StorageBackend;
use crate::store::{MemoryStore, Neo4jStore, Store};
use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Construye el handle de almacenamiento. Si el backend no responde, el
/// servidor no llega a arrancar.
async fn open_store(backend: &StorageBackend) -> Result<Arc<dyn Store>> {
    match backend {
        StorageBackend::Neo4j { addr, user, password } => {
            let store = Neo4jStore::connect(addr, user, password)
                .await
                .context("Error conectando a Neo4j")?;
            store
                .ensure_schema()
                .await
                .context("Error asegurando el esquema de Neo4j")?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            info!("Usando almacenamiento en memoria (los datos se pierden al cerrar).");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Cargar configuración
    let cfg = config::AppConfig::from_env().context("Error al cargar la configuración")?;

    // 3. Abrir el almacenamiento
    let store = open_store(&cfg.storage).await?;

    // 4. Crear estado compartido de la aplicación
    let app_state = AppState::new(cfg, store);

    // 5. Configurar el router de la API y el servicio de ficheros estáticos
    let app = Router::new()
        .merge(api::create_router(app_state.clone()))
        .fallback_service(ServeDir::new(&app_state.config.static_dir))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 6. Iniciar el servidor
    let server_addr = &app_state.config.server_addr;
    let listener = tokio::net::TcpListener::bind(server_addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {server_addr}"))?;
    info!("🚀 Servidor escuchando en http://{}", server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await
        .context("Error sirviendo peticiones")?;

    // 7. Liberar el handle de almacenamiento
    drop(app_state);
    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}
