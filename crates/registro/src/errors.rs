// Archivo: errors.rs
// Propósito: definir los errores del cliente de registros y el alias
// Result<T> usado por las APIs del crate.
use thiserror::Error;

/// Errores que puede devolver un `RecordStore`.
///
/// - `NotFound`: el registro o la colección no existe.
/// - `Forbidden`: el servicio rechazó la operación por permisos.
/// - `BadRequest`: datos o filtro inválidos.
/// - `Conflict`: conflicto al escribir (por ejemplo, unicidad).
/// - `Network`: fallo de transporte con el servicio remoto.
/// - `Storage`: error del almacenamiento local (BD, mutex, disco).
/// - `Other`: cualquier otro error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
  /// Registro no encontrado.
  #[error("No encontrado: {0}")]
  NotFound(String),
  /// Operación no permitida para la sesión actual.
  #[error("Permiso denegado: {0}")]
  Forbidden(String),
  /// Petición inválida (filtro mal formado, campos inválidos...).
  #[error("Petición inválida: {0}")]
  BadRequest(String),
  /// Conflicto al persistir.
  #[error("Conflicto: {0}")]
  Conflict(String),
  /// Error de red o de transporte.
  #[error("Error de red: {0}")]
  Network(String),
  /// Error genérico de almacenamiento local.
  #[error("Error de almacenamiento: {0}")]
  Storage(String),
  /// Otro tipo de error.
  #[error("Otro: {0}")]
  Other(String),
}

impl From<serde_json::Error> for StoreError {
  fn from(e: serde_json::Error) -> Self {
    Self::Other(format!("json: {}", e))
  }
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, StoreError>;
