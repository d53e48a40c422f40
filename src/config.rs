//! Carga y gestión de configuración de la aplicación (almacenamiento + servidor).

use std::env;
use anyhow::{anyhow, Context, Result};
use url::Url;

/// Backend de almacenamiento seleccionado por el esquema de `STORAGE_URI`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Neo4j {
        addr: String,
        user: String,
        password: String,
    },
    Memory,
}

impl StorageBackend {
    /// Interpreta la cadena de conexión. Las credenciales embebidas en la URI
    /// tienen prioridad sobre `default_user` / `default_password`.
    pub fn from_uri(uri: &str, default_user: &str, default_password: &str) -> Result<Self> {
        let url = Url::parse(uri).with_context(|| format!("STORAGE_URI inválida: {uri}"))?;

        match url.scheme() {
            "memory" => Ok(Self::Memory),
            "neo4j" | "bolt" | "neo4j+s" | "bolt+s" => {
                let host = url.host_str().unwrap_or("localhost");
                let port = url.port().unwrap_or(7687);
                let user = if url.username().is_empty() {
                    default_user.to_string()
                } else {
                    url.username().to_string()
                };
                let password = url
                    .password()
                    .map(str::to_string)
                    .unwrap_or_else(|| default_password.to_string());

                Ok(Self::Neo4j {
                    addr: format!("{host}:{port}"),
                    user,
                    password,
                })
            }
            other => Err(anyhow!("Esquema de almacenamiento no soportado: {other}")),
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub server_addr: String,
    pub static_dir: String,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env`, pero leyendo las claves con `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_uri =
            lookup("STORAGE_URI").ok_or_else(|| anyhow!("Falta STORAGE_URI en el entorno"))?;
        let user = lookup("NEO4J_USER").unwrap_or_else(|| "neo4j".to_string());
        let password = lookup("NEO4J_PASSWORD").unwrap_or_default();
        let storage = StorageBackend::from_uri(&storage_uri, &user, &password)?;

        let host = lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PORT debe ser un número de puerto, recibido: {raw}"))?,
            None => 5000,
        };

        let static_dir = lookup("STATIC_DIR").unwrap_or_else(|| "public".to_string());

        Ok(Self {
            storage,
            server_addr: format!("{host}:{port}"),
            static_dir,
        })
    }
}
