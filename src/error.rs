//! Errores de la capa de almacenamiento.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Fallos que puede devolver un `Store`. Un id inexistente no es un error:
/// las búsquedas y actualizaciones devuelven `None` en ese caso.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("almacenamiento no disponible: {0}")]
    Unavailable(String),

    #[error("el campo '{field}' no existe en la colección {collection}")]
    UnknownField {
        collection: &'static str,
        field: String,
    },

    #[error("registro mal formado en {collection}: {reason}")]
    Malformed {
        collection: &'static str,
        reason: String,
    },
}

impl From<neo4rs::Error> for StoreError {
    fn from(err: neo4rs::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}
