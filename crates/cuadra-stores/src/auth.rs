// Archivo: auth.rs
// Propósito: `AuthStore`, reflejo de la sesión compartida (usuario actual y
// si hay sesión) con el rol derivado. La autorización real la aplica el
// servicio; aquí sólo se compara el rol.
use cuadra_domain::{DomainError, Sesion, UserService, Usuario, ROL_ADMIN, ROL_USUARIO};
use registro::{Record, RecordStore, SessionProvider};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
  pub current_user: Option<Usuario>,
  pub is_logged_in: bool,
  pub loading: bool,
  pub error: Option<String>,
}

impl AuthState {
  pub fn email(&self) -> &str {
    self.current_user.as_ref().map(|u| u.email.as_str()).unwrap_or("")
  }

  pub fn nombre(&self) -> &str {
    self.current_user.as_ref().map(|u| u.nombre.as_str()).unwrap_or("")
  }

  /// Rol del usuario; `usuario` si no tiene.
  pub fn role(&self) -> &str {
    self.current_user.as_ref().and_then(|u| u.rol.as_deref()).unwrap_or(ROL_USUARIO)
  }

  pub fn is_admin(&self) -> bool {
    self.role() == ROL_ADMIN
  }
}

fn usuario_de(model: Option<&Record>) -> Option<Usuario> {
  model.and_then(|r| match r.to_entity::<Usuario>() {
                   Ok(u) => Some(u),
                   Err(e) => {
                     log::warn!("Usuario de la sesión ilegible: {}", e);
                     None
                   }
                 })
}

fn lock(state: &Mutex<AuthState>) -> MutexGuard<'_, AuthState> {
  state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct AuthStore {
  users: UserService,
  session: Arc<dyn SessionProvider>,
  state: Arc<Mutex<AuthState>>,
  subscribed: AtomicBool,
}

impl AuthStore {
  pub fn new(store: Arc<dyn RecordStore>, session: Arc<dyn SessionProvider>) -> Self {
    Self { users: UserService::new(store, session.clone()),
           session,
           state: Arc::new(Mutex::new(AuthState::default())),
           subscribed: AtomicBool::new(false) }
  }

  /// Toma la sesión guardada (si sigue siendo válida) y se suscribe a sus
  /// cambios. La suscripción se hace una sola vez.
  pub fn init_from_persisted_session(&self) {
    {
      let mut s = lock(&self.state);
      if self.session.is_valid() {
        s.current_user = usuario_de(self.session.current().as_ref());
        s.is_logged_in = true;
      } else {
        s.current_user = None;
        s.is_logged_in = false;
      }
    }
    if self.subscribed.swap(true, Ordering::SeqCst) {
      return;
    }
    let state = Arc::clone(&self.state);
    self.session.on_change(Box::new(move |_token, model| {
                  let mut s = lock(&state);
                  s.is_logged_in = model.is_some();
                  s.current_user = usuario_de(model);
                }));
  }

  pub async fn login(&self, email: &str, password: &str) -> Result<Sesion, DomainError> {
    {
      let mut s = lock(&self.state);
      s.loading = true;
      s.error = None;
    }
    let res = self.users.login(email, password).await;
    let mut s = lock(&self.state);
    s.loading = false;
    match &res {
      Ok(sesion) => {
        s.current_user = Some(sesion.usuario.clone());
        s.is_logged_in = true;
      }
      Err(e) => s.error = Some(e.to_string()),
    }
    res
  }

  pub fn logout(&self) {
    self.users.logout();
    let mut s = lock(&self.state);
    s.current_user = None;
    s.is_logged_in = false;
    s.error = None;
  }

  pub fn clear_error(&self) {
    lock(&self.state).error = None;
  }

  pub fn snapshot(&self) -> AuthState {
    lock(&self.state).clone()
  }

  pub fn current_user(&self) -> Option<Usuario> {
    lock(&self.state).current_user.clone()
  }

  pub fn is_logged_in(&self) -> bool {
    lock(&self.state).is_logged_in
  }

  pub fn role(&self) -> String {
    lock(&self.state).role().to_string()
  }

  pub fn is_admin(&self) -> bool {
    lock(&self.state).is_admin()
  }

  pub fn error(&self) -> Option<String> {
    lock(&self.state).error.clone()
  }
}
