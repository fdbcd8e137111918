// Archivo: repository.rs
// Propósito: definir el contrato `RecordStore` (CRUD por colección contra el
// servicio de registros) y `SessionProvider` (sesión del usuario
// autenticado). Las implementaciones concretas viven en `stubs` (memoria) y
// en `cuadra-persistence` (SQLite, HTTP).
use crate::domain::{AuthData, ListOptions, Record, RecordPayload};
use crate::errors::Result;
use async_trait::async_trait;

/// Contrato del cliente de registros.
///
/// Cada operación es una petición/respuesta independiente; el cliente no
/// reintenta ni cachea. Los errores del servicio se devuelven tal cual.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Crea un registro en `collection` y lo devuelve con `id`, `created` y
    /// `updated` completados por el servicio.
    async fn create(&self, collection: &str, payload: RecordPayload) -> Result<Record>;

    /// Obtiene un registro por id. `StoreError::NotFound` si no existe.
    async fn get_one(&self, collection: &str, id: &str) -> Result<Record>;

    /// Lista como mucho `max_count` registros aplicando filtro, orden y
    /// expansión de relaciones.
    async fn get_full_list(&self, collection: &str, max_count: usize, options: &ListOptions) -> Result<Vec<Record>>;

    /// Actualiza (merge) los campos del registro y lo devuelve.
    async fn update(&self, collection: &str, id: &str, payload: RecordPayload) -> Result<Record>;

    /// Elimina un registro. Devuelve `true` cuando se ha borrado.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// Autentica un registro de una colección de usuarios.
    async fn auth_with_password(&self, collection: &str, identity: &str, password: &str) -> Result<AuthData>;
}

/// Oyente de cambios de sesión: recibe el token y el modelo nuevos (ambos
/// `None` tras `clear`).
pub type SessionListener = Box<dyn Fn(Option<&str>, Option<&Record>) + Send + Sync>;

/// Sesión del usuario autenticado, compartida por todo el proceso.
///
/// Se construye una vez al arrancar y se inyecta en quien la necesite.
pub trait SessionProvider: Send + Sync {
    /// Token actual, si hay sesión.
    fn token(&self) -> Option<String>;

    /// Registro del usuario autenticado.
    fn current(&self) -> Option<Record>;

    /// `true` si hay token decodificable y no expirado.
    fn is_valid(&self) -> bool;

    /// Guarda token y modelo y avisa a los oyentes.
    fn save(&self, token: String, model: Record);

    /// Borra la sesión y avisa a los oyentes.
    fn clear(&self);

    /// Registra un oyente de cambios.
    fn on_change(&self, listener: SessionListener);
}
