// error.rs
use registro::StoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
  /// Validación local previa a cualquier llamada remota.
  #[error("Error de validación: {0}")]
  ValidationError(String),
  /// Rechazo del servicio de registros, sin modificar.
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error("Error de serialización: {0}")]
  SerializationError(String),
}

impl From<serde_json::Error> for DomainError {
  fn from(e: serde_json::Error) -> Self {
    Self::SerializationError(e.to_string())
  }
}
