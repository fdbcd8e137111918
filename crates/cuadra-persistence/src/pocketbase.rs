// Cliente HTTP del servicio de registros alojado (API REST de PocketBase).
//
// Rutas usadas:
//   GET/POST        /api/collections/{c}/records
//   GET/PATCH/DELETE /api/collections/{c}/records/{id}
//   POST            /api/collections/{c}/auth-with-password
use async_trait::async_trait;
use registro::{AuthData, ListOptions, Record, RecordPayload, RecordStore, Result, SessionProvider, StoreError};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

/// Tamaño máximo de página que acepta el servicio.
pub const MAX_PER_PAGE: usize = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
  page: usize,
  total_pages: usize,
  items: Vec<JsonValue>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  message: String,
  #[serde(default)]
  data: JsonValue,
}

/// Traduce el estado HTTP de una respuesta fallida a `StoreError`.
pub fn error_from_status(status: u16, message: String) -> StoreError {
  match status {
    400 => StoreError::BadRequest(message),
    401 | 403 => StoreError::Forbidden(message),
    404 => StoreError::NotFound(message),
    409 => StoreError::Conflict(message),
    _ => StoreError::Other(format!("HTTP {}: {}", status, message)),
  }
}

fn network(e: reqwest::Error) -> StoreError {
  StoreError::Network(e.to_string())
}

/// Texto a enviar en un formulario multipart para un valor JSON.
fn form_text(value: &JsonValue) -> String {
  match value {
    JsonValue::String(s) => s.clone(),
    JsonValue::Null => String::new(),
    other => other.to_string(),
  }
}

pub struct PocketBaseStore {
  client: Client,
  base_url: String,
  session: Arc<dyn SessionProvider>,
}

impl PocketBaseStore {
  pub fn new(base_url: &str, session: Arc<dyn SessionProvider>) -> Self {
    Self { client: Client::new(),
           base_url: base_url.trim_end_matches('/').to_string(),
           session }
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// URL de los registros de una colección, o de uno de ellos.
  pub fn records_url(&self, collection: &str, id: Option<&str>) -> String {
    match id {
      Some(id) => format!("{}/api/collections/{}/records/{}", self.base_url, collection, id),
      None => format!("{}/api/collections/{}/records", self.base_url, collection),
    }
  }

  /// Petición con el token de la sesión, si lo hay.
  fn request(&self, method: Method, url: &str) -> RequestBuilder {
    let req = self.client.request(method, url);
    match self.session.token() {
      Some(token) => req.header("Authorization", token),
      None => req,
    }
  }

  /// Cuerpo de create/update: JSON si no hay ficheros, multipart si los hay.
  fn with_payload(req: RequestBuilder, payload: RecordPayload) -> RequestBuilder {
    if payload.files.is_empty() {
      return req.json(&JsonValue::Object(payload.fields));
    }
    let mut form = Form::new();
    for (k, v) in &payload.fields {
      form = form.text(k.clone(), form_text(v));
    }
    for f in payload.files {
      let part = Part::bytes(f.bytes).file_name(f.file_name);
      form = form.part(f.field, part);
    }
    req.multipart(form)
  }

  async fn send(req: RequestBuilder) -> Result<Response> {
    let resp = req.send().await.map_err(network)?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body: ErrorBody = resp.json().await.unwrap_or_default();
    let mut message = if body.message.is_empty() { status.to_string() } else { body.message };
    if let Some(campos) = body.data.as_object().filter(|d| !d.is_empty()) {
      let detalle: Vec<String> = campos.iter()
                                       .map(|(k, v)| format!("{}: {}", k, v.get("message").and_then(|m| m.as_str()).unwrap_or("inválido")))
                                       .collect();
      message = format!("{} ({})", message, detalle.join(", "));
    }
    log::debug!("respuesta {} del servicio: {}", status, message);
    Err(error_from_status(status.as_u16(), message))
  }

  async fn record_from(resp: Response) -> Result<Record> {
    let value: JsonValue = resp.json().await.map_err(network)?;
    Record::from_json(value)
  }
}

#[async_trait]
impl RecordStore for PocketBaseStore {
  async fn create(&self, collection: &str, payload: RecordPayload) -> Result<Record> {
    let req = Self::with_payload(self.request(Method::POST, &self.records_url(collection, None)), payload);
    Self::record_from(Self::send(req).await?).await
  }

  async fn get_one(&self, collection: &str, id: &str) -> Result<Record> {
    let req = self.request(Method::GET, &self.records_url(collection, Some(id)));
    Self::record_from(Self::send(req).await?).await
  }

  async fn get_full_list(&self, collection: &str, max_count: usize, options: &ListOptions) -> Result<Vec<Record>> {
    let per_page = max_count.clamp(1, MAX_PER_PAGE);
    let url = self.records_url(collection, None);
    let mut out = Vec::new();
    let mut page = 1;
    loop {
      let mut query = vec![("page", page.to_string()), ("perPage", per_page.to_string())];
      if let Some(f) = &options.filter {
        query.push(("filter", f.clone()));
      }
      if let Some(s) = &options.sort {
        query.push(("sort", s.clone()));
      }
      if let Some(e) = &options.expand {
        query.push(("expand", e.clone()));
      }
      let resp = Self::send(self.request(Method::GET, &url).query(&query)).await?;
      let lista: ListPage = resp.json().await.map_err(network)?;
      let recibidos = lista.items.len();
      for item in lista.items {
        out.push(Record::from_json(item)?);
      }
      if out.len() >= max_count || recibidos < per_page || lista.page >= lista.total_pages {
        break;
      }
      page += 1;
    }
    out.truncate(max_count);
    Ok(out)
  }

  async fn update(&self, collection: &str, id: &str, payload: RecordPayload) -> Result<Record> {
    let req = Self::with_payload(self.request(Method::PATCH, &self.records_url(collection, Some(id))), payload);
    Self::record_from(Self::send(req).await?).await
  }

  async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
    let resp = Self::send(self.request(Method::DELETE, &self.records_url(collection, Some(id)))).await?;
    Ok(resp.status() == StatusCode::NO_CONTENT || resp.status().is_success())
  }

  async fn auth_with_password(&self, collection: &str, identity: &str, password: &str) -> Result<AuthData> {
    let url = format!("{}/api/collections/{}/auth-with-password", self.base_url, collection);
    let req = self.client.post(url).json(&json!({"identity": identity, "password": password}));
    let value: JsonValue = Self::send(req).await?.json().await.map_err(network)?;
    let token = value.get("token")
                     .and_then(|t| t.as_str())
                     .ok_or_else(|| StoreError::Other("respuesta de autenticación sin token".into()))?
                     .to_string();
    let record = Record::from_json(value.get("record").cloned().unwrap_or(JsonValue::Null))?;
    Ok(AuthData { token, record })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use registro::SessionStore;

  #[test]
  fn estados_http_a_errores() {
    assert_eq!(error_from_status(404, "x".into()), StoreError::NotFound("x".into()));
    assert_eq!(error_from_status(403, "Only admins can perform this action.".into()),
               StoreError::Forbidden("Only admins can perform this action.".into()));
    assert_eq!(error_from_status(401, "x".into()), StoreError::Forbidden("x".into()));
    assert_eq!(error_from_status(400, "x".into()), StoreError::BadRequest("x".into()));
    assert!(matches!(error_from_status(500, "x".into()), StoreError::Other(_)));
  }

  #[test]
  fn urls_de_registros() {
    let store = PocketBaseStore::new("http://127.0.0.1:8090/", Arc::new(SessionStore::new()));
    assert_eq!(store.records_url("caballos", None), "http://127.0.0.1:8090/api/collections/caballos/records");
    assert_eq!(store.records_url("caballos", Some("abc")),
               "http://127.0.0.1:8090/api/collections/caballos/records/abc");
  }

  #[test]
  fn texto_de_formulario() {
    assert_eq!(form_text(&json!("hola")), "hola");
    assert_eq!(form_text(&json!(2400)), "2400");
    assert_eq!(form_text(&JsonValue::Null), "");
  }
}
