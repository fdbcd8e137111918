// Archivo: domain.rs
// Propósito: tipos de datos que viajan entre el cliente y el servicio de
// registros: `Record`, `RecordPayload`, `ListOptions` y `AuthData`.
use crate::errors::{Result, StoreError};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Objeto JSON con los campos de un registro.
pub type JsonMap = serde_json::Map<String, JsonValue>;

/// Registro genérico de una colección.
///
/// `data` contiene los campos propios de la colección; `expand` las
/// relaciones resueltas cuando se pidió `expand` en la consulta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub collection: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub data: JsonMap,
    #[serde(default)]
    pub expand: JsonMap,
}

/// Campos de sistema que no forman parte de `data`.
const SYSTEM_FIELDS: [&str; 6] = ["id", "collectionId", "collectionName", "created", "updated", "expand"];

impl Record {
    /// Crea un registro con `created == updated == ahora`.
    pub fn new(id: impl Into<String>, collection: impl Into<String>, data: JsonMap) -> Self {
        let now = Utc::now();
        Self { id: id.into(),
               collection: collection.into(),
               created: now,
               updated: now,
               data,
               expand: JsonMap::new() }
    }

    /// Valor de un campo, incluidos los de sistema (`id`, `created`,
    /// `updated`, `collectionName`).
    pub fn field(&self, name: &str) -> Option<JsonValue> {
        match name {
            "id" => Some(JsonValue::String(self.id.clone())),
            "created" => Some(JsonValue::String(format_timestamp(&self.created))),
            "updated" => Some(JsonValue::String(format_timestamp(&self.updated))),
            "collectionName" => Some(JsonValue::String(self.collection.clone())),
            other => self.data.get(other).cloned(),
        }
    }

    /// Campo de texto de `data`, si existe y es string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(|v| v.as_str())
    }

    /// Forma plana del registro (la misma que usa el servicio remoto).
    pub fn to_json(&self) -> JsonValue {
        let mut obj = JsonMap::new();
        obj.insert("id".into(), JsonValue::String(self.id.clone()));
        obj.insert("collectionName".into(), JsonValue::String(self.collection.clone()));
        obj.insert("created".into(), JsonValue::String(format_timestamp(&self.created)));
        obj.insert("updated".into(), JsonValue::String(format_timestamp(&self.updated)));
        for (k, v) in &self.data {
            obj.insert(k.clone(), v.clone());
        }
        if !self.expand.is_empty() {
            obj.insert("expand".into(), JsonValue::Object(self.expand.clone()));
        }
        JsonValue::Object(obj)
    }

    /// Construye un registro a partir de su forma plana.
    pub fn from_json(value: JsonValue) -> Result<Self> {
        let mut obj = match value {
            JsonValue::Object(o) => o,
            other => return Err(StoreError::BadRequest(format!("se esperaba un objeto, llegó {}", other))),
        };
        let id = match obj.get("id").and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => return Err(StoreError::BadRequest("registro sin id".into())),
        };
        let collection = obj.get("collectionName").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let created = timestamp_or_now(obj.get("created"))?;
        let updated = timestamp_or_now(obj.get("updated"))?;
        let expand = match obj.remove("expand") {
            Some(JsonValue::Object(e)) => e,
            _ => JsonMap::new(),
        };
        for f in SYSTEM_FIELDS {
            obj.remove(f);
        }
        Ok(Self { id,
                  collection,
                  created,
                  updated,
                  data: obj,
                  expand })
    }

    /// Deserializa el registro plano en un tipo de dominio.
    pub fn to_entity<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.to_json()).map_err(|e| {
                                                  StoreError::BadRequest(format!("registro {} de '{}' con forma inesperada: {}",
                                                                                 self.id, self.collection, e))
                                              })
    }
}

/// Formato de marca temporal con ancho fijo: el orden lexicográfico coincide
/// con el cronológico.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Acepta RFC 3339 y el formato del servicio (`2024-01-31 10:00:00.123Z`).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.fZ").ok()
                                                             .map(|n| Utc.from_utc_datetime(&n))
}

fn timestamp_or_now(value: Option<&JsonValue>) -> Result<DateTime<Utc>> {
    match value.and_then(|v| v.as_str()) {
        None | Some("") => Ok(Utc::now()),
        Some(s) => parse_timestamp(s).ok_or_else(|| StoreError::BadRequest(format!("fecha inválida: {}", s))),
    }
}

/// Archivo adjunto a un campo de tipo fichero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Datos a escribir en `create`/`update`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPayload {
    pub fields: JsonMap,
    pub files: Vec<FileUpload>,
}

impl RecordPayload {
    pub fn new(fields: JsonMap) -> Self {
        Self { fields, files: Vec::new() }
    }

    /// Añade un fichero para el campo `field`.
    pub fn with_file(mut self, file: FileUpload) -> Self {
        self.files.push(file);
        self
    }

    /// Campos tal como quedan guardados en un almacenamiento local: cada
    /// fichero se representa por su nombre.
    pub fn stored_fields(&self) -> JsonMap {
        let mut fields = self.fields.clone();
        for f in &self.files {
            fields.insert(f.field.clone(), JsonValue::String(f.file_name.clone()));
        }
        fields
    }
}

impl From<JsonMap> for RecordPayload {
    fn from(fields: JsonMap) -> Self {
        Self::new(fields)
    }
}

/// Opciones de `get_full_list`: filtro, orden y relaciones a expandir.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub expand: Option<String>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fija el filtro. Una cadena vacía equivale a no filtrar.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        let f = filter.into();
        self.filter = if f.trim().is_empty() { None } else { Some(f) };
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }
}

/// Resultado de una autenticación: token y registro del usuario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthData {
    pub token: String,
    pub record: Record,
}
