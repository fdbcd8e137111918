use cuadra_domain::{DomainStubs, ADMIN_EMAIL, ADMIN_PASSWORD, SOCIO_EMAIL, SOCIO_PASSWORD};
use cuadra_stores::router::{guard, href, resolve, ADMIN_ALERT};
use cuadra_stores::{AuthStore, GuardDecision};
use registro::token::issue_token;
use registro::{FileSessionStorage, JsonMap, Record, RecordStore, SessionProvider, SessionStore};
use serde_json::json;
use std::sync::Arc;

async fn cuadra(session: Arc<dyn SessionProvider>) -> Arc<dyn RecordStore> {
  Arc::new(DomainStubs::sample_store(session).await.unwrap())
}

#[tokio::test]
async fn login_y_logout_reflejan_la_sesion() {
  let session: Arc<dyn SessionProvider> = Arc::new(SessionStore::new());
  let auth = AuthStore::new(cuadra(session.clone()).await, session.clone());
  auth.init_from_persisted_session();
  assert!(!auth.is_logged_in());
  assert_eq!(auth.role(), "usuario");

  let sesion = auth.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
  assert_eq!(session.token(), Some(sesion.token));
  assert!(auth.is_logged_in());
  assert!(auth.is_admin());
  assert_eq!(auth.snapshot().email(), ADMIN_EMAIL);

  auth.logout();
  assert!(!auth.is_logged_in());
  assert!(auth.current_user().is_none());
  assert!(session.current().is_none());
}

#[tokio::test]
async fn login_fallido_guarda_el_error() {
  let session: Arc<dyn SessionProvider> = Arc::new(SessionStore::new());
  let auth = AuthStore::new(cuadra(session.clone()).await, session);
  assert!(auth.login(SOCIO_EMAIL, "mala").await.is_err());
  assert!(auth.error().is_some());
  assert!(!auth.is_logged_in());
  assert!(!auth.snapshot().loading);
  auth.clear_error();
  assert!(auth.error().is_none());
}

#[tokio::test]
async fn los_cambios_de_sesion_llegan_al_store() {
  let session: Arc<dyn SessionProvider> = Arc::new(SessionStore::new());
  let auth = AuthStore::new(cuadra(session.clone()).await, session.clone());
  auth.init_from_persisted_session();
  auth.init_from_persisted_session();

  let data: JsonMap = json!({"email": "otra@cuadra.es", "rol": "admin"}).as_object().cloned().unwrap();
  session.save(issue_token("u9", "users", "k"), Record::new("u9", "users", data));
  assert!(auth.is_logged_in());
  assert!(auth.is_admin());

  session.clear();
  assert!(!auth.is_logged_in());
  assert_eq!(auth.role(), "usuario");
}

#[tokio::test]
async fn sesion_persistida_se_recupera_al_arrancar() {
  let path = std::env::temp_dir().join(format!("cuadra_sesion_{}.json", registro::stubs::new_record_id()));
  {
    let session: Arc<dyn SessionProvider> = Arc::new(SessionStore::with_storage(Box::new(FileSessionStorage::new(path.clone()))));
    let auth = AuthStore::new(cuadra(session.clone()).await, session);
    auth.login(SOCIO_EMAIL, SOCIO_PASSWORD).await.unwrap();
  }
  let session: Arc<dyn SessionProvider> = Arc::new(SessionStore::with_storage(Box::new(FileSessionStorage::new(path.clone()))));
  let auth = AuthStore::new(cuadra(session.clone()).await, session);
  auth.init_from_persisted_session();
  assert!(auth.is_logged_in());
  assert_eq!(auth.snapshot().email(), SOCIO_EMAIL);
  assert!(!auth.is_admin());
  let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn guarda_de_rutas_segun_el_rol() {
  let session: Arc<dyn SessionProvider> = Arc::new(SessionStore::new());
  let auth = AuthStore::new(cuadra(session.clone()).await, session);
  let nueva = resolve("/noticias/nueva").unwrap();
  let editar = resolve(&href("caballo-editar", &[("id", "abc")]).unwrap()).unwrap();

  assert_eq!(guard(&nueva, &auth.snapshot()),
             GuardDecision::RedirectToLogin { redirect: "/noticias/nueva".into() });

  auth.login(SOCIO_EMAIL, SOCIO_PASSWORD).await.unwrap();
  assert_eq!(guard(&editar, &auth.snapshot()), GuardDecision::Blocked { alert: ADMIN_ALERT.into() });
  assert_eq!(guard(&resolve("/noticias").unwrap(), &auth.snapshot()), GuardDecision::Allow);

  auth.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
  assert_eq!(guard(&editar, &auth.snapshot()), GuardDecision::Allow);
}
