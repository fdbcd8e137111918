// Selección del almacenamiento a partir del entorno (`.env` incluido).
//
//   CUADRA_BACKEND        memory | sqlite | pocketbase (por defecto memory)
//   CUADRA_DB_URL         ruta SQLite (o DATABASE_URL)
//   POCKETBASE_URL        URL del servicio (por defecto http://127.0.0.1:8090)
//   CUADRA_SESSION_FILE   fichero donde persistir la sesión
use crate::{DieselRecordStore, PocketBaseStore};
use cuadra_domain::{DomainError, DomainStubs};
use registro::{FileSessionStorage, RecordStore, SessionProvider, SessionStore, StoreError};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_POCKETBASE_URL: &str = "http://127.0.0.1:8090";
pub const DEFAULT_SQLITE_URL: &str = "cuadra.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
  /// En memoria con datos de ejemplo.
  Memory,
  Sqlite(String),
  PocketBase(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
  pub backend: Backend,
  pub session_file: Option<PathBuf>,
}

impl BackendConfig {
  pub fn from_env() -> Result<Self, DomainError> {
    dotenvy::dotenv().ok();
    Self::from_lookup(|k| std::env::var(k).ok())
  }

  /// Igual que `from_env` pero leyendo las variables de `lookup`.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
    let nombre = lookup("CUADRA_BACKEND").unwrap_or_else(|| "memory".into()).to_lowercase();
    let backend = match nombre.as_str() {
      "memory" | "memoria" => Backend::Memory,
      "sqlite" => {
        let url = lookup("CUADRA_DB_URL").or_else(|| lookup("DATABASE_URL"))
                                         .unwrap_or_else(|| DEFAULT_SQLITE_URL.into());
        Backend::Sqlite(url)
      }
      "pocketbase" | "remote" => Backend::PocketBase(lookup("POCKETBASE_URL").unwrap_or_else(|| DEFAULT_POCKETBASE_URL.into())),
      otro => {
        return Err(DomainError::Store(StoreError::Other(format!("CUADRA_BACKEND desconocido: '{}' (memory, sqlite o pocketbase)",
                                                                otro))))
      }
    };
    Ok(Self { backend,
              session_file: lookup("CUADRA_SESSION_FILE").filter(|s| !s.is_empty()).map(PathBuf::from) })
  }

  /// Sesión del proceso, persistida en fichero si se configuró.
  pub fn session(&self) -> Arc<dyn SessionProvider> {
    match &self.session_file {
      Some(path) => Arc::new(SessionStore::with_storage(Box::new(FileSessionStorage::new(path.clone())))),
      None => Arc::new(SessionStore::new()),
    }
  }

  /// Construye el almacenamiento configurado.
  pub async fn open_store(&self, session: Arc<dyn SessionProvider>) -> Result<Arc<dyn RecordStore>, DomainError> {
    let store: Arc<dyn RecordStore> = match &self.backend {
      Backend::Memory => Arc::new(DomainStubs::sample_store(session).await?),
      Backend::Sqlite(url) => Arc::new(DieselRecordStore::new(url)?),
      Backend::PocketBase(url) => Arc::new(PocketBaseStore::new(url, session)),
    };
    log::info!("Almacenamiento: {:?}", self.backend);
    Ok(store)
  }
}

/// Sesión y almacenamiento a partir del entorno.
pub async fn new_store_from_env() -> Result<(Arc<dyn RecordStore>, Arc<dyn SessionProvider>), DomainError> {
  let config = BackendConfig::from_env()?;
  let session = config.session();
  let store = config.open_store(session.clone()).await?;
  Ok((store, session))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn config(vars: &[(&str, &str)]) -> Result<BackendConfig, DomainError> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    BackendConfig::from_lookup(|k| map.get(k).cloned())
  }

  #[test]
  fn memoria_por_defecto() {
    let c = config(&[]).unwrap();
    assert_eq!(c.backend, Backend::Memory);
    assert!(c.session_file.is_none());
  }

  #[test]
  fn sqlite_usa_database_url_como_alternativa() {
    let c = config(&[("CUADRA_BACKEND", "sqlite"), ("DATABASE_URL", "/tmp/x.db")]).unwrap();
    assert_eq!(c.backend, Backend::Sqlite("/tmp/x.db".into()));
    let c = config(&[("CUADRA_BACKEND", "SQLite"), ("CUADRA_DB_URL", "a.db"), ("DATABASE_URL", "b.db")]).unwrap();
    assert_eq!(c.backend, Backend::Sqlite("a.db".into()));
  }

  #[test]
  fn pocketbase_con_url_por_defecto() {
    let c = config(&[("CUADRA_BACKEND", "pocketbase"), ("CUADRA_SESSION_FILE", "s.json")]).unwrap();
    assert_eq!(c.backend, Backend::PocketBase(DEFAULT_POCKETBASE_URL.into()));
    assert_eq!(c.session_file, Some(PathBuf::from("s.json")));
  }

  #[test]
  fn backend_desconocido() {
    assert!(config(&[("CUADRA_BACKEND", "mongo")]).is_err());
  }
}
