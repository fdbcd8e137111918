// Archivo: session.rs
// Propósito: implementación de `SessionProvider` con persistencia opcional
// (`SessionStorage`) para conservar la sesión entre arranques.
use crate::domain::Record;
use crate::errors::{Result, StoreError};
use crate::repository::{SessionListener, SessionProvider};
use crate::token::token_is_valid;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Estado serializable de la sesión.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub token: Option<String>,
    pub model: Option<Record>,
}

/// Medio donde se conserva la sesión.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<SessionState>>;
    fn store(&self, state: &SessionState) -> Result<()>;
    fn remove(&self) -> Result<()>;
}

/// Guarda la sesión como JSON en un fichero.
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<SessionState>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Storage(format!("sesión {}: {}", self.path.display(), e))),
        }
    }

    fn store(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Storage(e.to_string()))?;
            }
        }
        let bytes = serde_json::to_vec_pretty(state)?;
        std::fs::write(&self.path, bytes).map_err(|e| StoreError::Storage(format!("sesión {}: {}", self.path.display(), e)))
    }

    fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Storage(e.to_string())),
        }
    }
}

/// Sesión del proceso. Los fallos del medio de persistencia se registran
/// en el log y no interrumpen la sesión en memoria.
pub struct SessionStore {
    state: Mutex<SessionState>,
    listeners: Mutex<Vec<SessionListener>>,
    storage: Option<Box<dyn SessionStorage>>,
}

impl SessionStore {
    /// Sesión sólo en memoria.
    pub fn new() -> Self {
        Self { state: Mutex::new(SessionState::default()),
               listeners: Mutex::new(Vec::new()),
               storage: None }
    }

    /// Sesión respaldada por `storage`; carga el estado guardado.
    pub fn with_storage(storage: Box<dyn SessionStorage>) -> Self {
        let initial = match storage.load() {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                log::warn!("no se pudo leer la sesión guardada: {}", e);
                SessionState::default()
            }
        };
        Self { state: Mutex::new(initial),
               listeners: Mutex::new(Vec::new()),
               storage: Some(storage) }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn replace(&self, next: SessionState) {
        *self.lock_state() = next.clone();
        if let Some(storage) = &self.storage {
            let res = if next.token.is_some() { storage.store(&next) } else { storage.remove() };
            if let Err(e) = res {
                log::warn!("no se pudo persistir la sesión: {}", e);
            }
        }
        // Los oyentes no deben registrar otros oyentes desde el callback.
        let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        for l in listeners.iter() {
            l(next.token.as_deref(), next.model.as_ref());
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProvider for SessionStore {
    fn token(&self) -> Option<String> {
        self.lock_state().token.clone()
    }

    fn current(&self) -> Option<Record> {
        self.lock_state().model.clone()
    }

    fn is_valid(&self) -> bool {
        self.lock_state().token.as_deref().map(token_is_valid).unwrap_or(false)
    }

    fn save(&self, token: String, model: Record) {
        self.replace(SessionState { token: Some(token),
                                    model: Some(model) });
    }

    fn clear(&self) {
        self.replace(SessionState::default());
    }

    fn on_change(&self, listener: SessionListener) {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner()).push(listener);
    }
}
