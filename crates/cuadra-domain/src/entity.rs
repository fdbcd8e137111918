// entity.rs
use crate::DomainError;
use chrono::{SecondsFormat, Utc};
use registro::{Record, RecordPayload};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Límite de registros de los listados completos.
pub const MAX_LISTA: usize = 200;

/// Entidad identificada por el id que le asigna el servicio.
pub trait Entidad {
  fn id(&self) -> &str;
}

/// Fecha actual en el formato ISO que espera el servicio.
pub fn ahora() -> String {
  Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Registra el error en el log y lo devuelve sin cambios.
pub(crate) fn registrar<T>(contexto: &str, res: Result<T, DomainError>) -> Result<T, DomainError> {
  if let Err(e) = &res {
    log::error!("{}: {}", contexto, e);
  }
  res
}

pub(crate) fn to_payload<T: Serialize>(value: &T) -> Result<RecordPayload, DomainError> {
  match serde_json::to_value(value)? {
    serde_json::Value::Object(fields) => Ok(RecordPayload::new(fields)),
    other => Err(DomainError::SerializationError(format!("se esperaba un objeto, llegó {}", other))),
  }
}

pub(crate) fn from_record<T: DeserializeOwned>(record: &Record) -> Result<T, DomainError> {
  Ok(record.to_entity()?)
}

pub(crate) fn from_records<T: DeserializeOwned>(records: &[Record]) -> Result<Vec<T>, DomainError> {
  records.iter().map(from_record).collect()
}

/// `true` si el texto está vacío o sólo tiene espacios.
pub(crate) fn vacio(s: &str) -> bool {
  s.trim().is_empty()
}

/// El servicio devuelve `""` para fechas y textos opcionales sin valor.
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
  where D: Deserializer<'de>
{
  let opt = Option::<String>::deserialize(deserializer)?;
  Ok(opt.filter(|s| !s.is_empty()))
}
