use registro::token::issue_token;
use registro::{FileSessionStorage, JsonMap, Record, SessionProvider, SessionStore};
use serde_json::json;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

fn user(rol: &str) -> Record {
  let data: JsonMap = json!({"email": "ana@cuadra.es", "rol": rol}).as_object().cloned().unwrap();
  Record::new("u1", "users", data)
}

#[test]
fn save_and_clear_notify_listeners() {
  let session = SessionStore::new();
  let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
  let sink = seen.clone();
  session.on_change(Box::new(move |_token, model| {
           sink.lock().unwrap().push(model.map(|m| m.id.clone()));
         }));

  assert!(!session.is_valid());
  session.save(issue_token("u1", "users", "k"), user("admin"));
  assert!(session.is_valid());
  assert_eq!(session.current().unwrap().get_str("rol"), Some("admin"));

  session.clear();
  assert!(session.current().is_none());
  assert!(session.token().is_none());
  assert_eq!(*seen.lock().unwrap(), vec![Some("u1".to_string()), None]);
}

#[test]
fn garbage_token_is_not_valid() {
  let session = SessionStore::new();
  session.save("token-opaco".into(), user("usuario"));
  assert!(!session.is_valid());
  assert!(session.current().is_some());
}

#[test]
fn file_storage_survives_restart() {
  let path = std::env::temp_dir().join(format!("cuadra_session_{}.json", Uuid::new_v4()));
  {
    let s = SessionStore::with_storage(Box::new(FileSessionStorage::new(&path)));
    s.save(issue_token("u1", "users", "k"), user("admin"));
  }
  let restored = SessionStore::with_storage(Box::new(FileSessionStorage::new(&path)));
  assert!(restored.is_valid());
  assert_eq!(restored.current().unwrap().id, "u1");

  restored.clear();
  assert!(!path.exists());
  let empty = SessionStore::with_storage(Box::new(FileSessionStorage::new(&path)));
  assert!(empty.current().is_none());
}
