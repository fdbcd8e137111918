// Archivo: token.rs
// Propósito: tokens de sesión con forma JWT y hash de contraseñas para los
// almacenamientos locales. El servicio remoto emite sus propios tokens;
// aquí sólo se decodifica su `exp`.
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value as JsonValue};
use sha2::{Digest, Sha256};

/// Vigencia de los tokens emitidos localmente (14 días).
pub const TOKEN_TTL_SECS: i64 = 1_209_600;

/// Hash hexadecimal sha256 de `salt:password`.
pub fn hash_password(salt: &str, password: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(salt.as_bytes());
  hasher.update(b":");
  hasher.update(password.as_bytes());
  format!("{:x}", hasher.finalize())
}

/// Emite un token `header.payload.signature` para el registro indicado.
pub fn issue_token(record_id: &str, collection: &str, secret: &str) -> String {
  let exp = (Utc::now() + Duration::seconds(TOKEN_TTL_SECS)).timestamp();
  issue_token_with_exp(record_id, collection, secret, exp)
}

pub(crate) fn issue_token_with_exp(record_id: &str, collection: &str, secret: &str, exp: i64) -> String {
  let header = URL_SAFE_NO_PAD.encode(json!({"alg": "HS256", "typ": "JWT"}).to_string());
  let payload = URL_SAFE_NO_PAD.encode(json!({"id": record_id, "collectionName": collection, "exp": exp}).to_string());
  let mut hasher = Sha256::new();
  hasher.update(secret.as_bytes());
  hasher.update(header.as_bytes());
  hasher.update(b".");
  hasher.update(payload.as_bytes());
  let signature = URL_SAFE_NO_PAD.encode(hasher.finalize());
  format!("{}.{}.{}", header, payload, signature)
}

/// Decodifica el payload de un token. `None` si no tiene forma JWT.
pub fn token_claims(token: &str) -> Option<JsonValue> {
  let mut parts = token.split('.');
  let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
  if parts.next().is_some() {
    return None;
  }
  let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
  serde_json::from_slice(&bytes).ok()
}

/// Instante de expiración (`exp`) del token.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
  let exp = token_claims(token)?.get("exp")?.as_i64()?;
  Utc.timestamp_opt(exp, 0).single()
}

/// Un token es válido si se puede decodificar y no ha expirado.
pub fn token_is_valid(token: &str) -> bool {
  match token_expiry(token) {
    Some(exp) => exp > Utc::now(),
    None => false,
  }
}
