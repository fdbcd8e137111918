// Archivo: validation.rs
// Propósito: reglas de escritura comunes a los almacenamientos locales
// (memoria y SQLite): contraseñas con confirmación y email único.
use crate::domain::{JsonMap, Record};
use crate::errors::{Result, StoreError};
use crate::token::hash_password;
use serde_json::Value as JsonValue;

/// Extrae `password`/`passwordConfirm` de los campos y devuelve el hash a
/// guardar, si se pidió cambiar la contraseña. Ninguno de los dos campos
/// llega a guardarse en los datos del registro.
pub fn take_password(record_id: &str, fields: &mut JsonMap) -> Result<Option<String>> {
  let password = fields.remove("password");
  let confirm = fields.remove("passwordConfirm");
  match password {
    None | Some(JsonValue::Null) => Ok(None),
    Some(JsonValue::String(p)) => {
      if confirm.as_ref().and_then(|c| c.as_str()) != Some(p.as_str()) {
        return Err(StoreError::BadRequest("passwordConfirm: las contraseñas no coinciden".into()));
      }
      if p.is_empty() {
        return Err(StoreError::BadRequest("password: no puede estar vacía".into()));
      }
      Ok(Some(hash_password(record_id, &p)))
    }
    Some(_) => Err(StoreError::BadRequest("password: debe ser texto".into())),
  }
}

/// Falla si otro registro de `list` ya usa `email`.
pub fn check_unique_email(list: &[Record], email: Option<&JsonValue>, own_id: &str) -> Result<()> {
  if let Some(JsonValue::String(email)) = email {
    if list.iter().any(|r| r.id != own_id && r.get_str("email") == Some(email.as_str())) {
      return Err(StoreError::BadRequest(format!("email: '{}' ya está en uso", email)));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn fields(v: JsonValue) -> JsonMap {
    v.as_object().cloned().unwrap()
  }

  #[test]
  fn password_sin_confirmacion_falla() {
    let mut f = fields(json!({"password": "a1"}));
    assert!(matches!(take_password("x", &mut f), Err(StoreError::BadRequest(_))));
  }

  #[test]
  fn password_se_retira_de_los_campos() {
    let mut f = fields(json!({"email": "a@b.c", "password": "a1", "passwordConfirm": "a1"}));
    let hash = take_password("x", &mut f).unwrap();
    assert_eq!(hash, Some(hash_password("x", "a1")));
    assert_eq!(f.len(), 1);
  }

  #[test]
  fn email_repetido_en_otro_registro() {
    let r = Record::new("r1", "users", fields(json!({"email": "a@b.c"})));
    let email = json!("a@b.c");
    assert!(check_unique_email(&[r.clone()], Some(&email), "r2").is_err());
    assert!(check_unique_email(&[r], Some(&email), "r1").is_ok());
  }
}
