// user.rs
//
// Usuarios y sesión. El login deja el token y el usuario en el
// `SessionProvider` compartido.
use crate::entity::{ahora, empty_as_none, from_record, from_records, registrar, to_payload, vacio, Entidad, MAX_LISTA};
use crate::DomainError;
use registro::{ListOptions, RecordStore, SessionProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const USERS: &str = "users";

pub const ROL_ADMIN: &str = "admin";
pub const ROL_USUARIO: &str = "usuario";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usuario {
  pub id: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub nombre: String,
  #[serde(default, deserialize_with = "empty_as_none")]
  pub rol: Option<String>,
  #[serde(default)]
  pub fecha_registro: String,
  #[serde(default)]
  pub avatar_url: String,
}

impl Usuario {
  pub fn es_admin(&self) -> bool {
    self.rol.as_deref() == Some(ROL_ADMIN)
  }
}

impl Entidad for Usuario {
  fn id(&self) -> &str {
    &self.id
  }
}

/// Resultado del login.
#[derive(Debug, Clone, PartialEq)]
pub struct Sesion {
  pub token: String,
  pub usuario: Usuario,
}

/// Cambios parciales de un usuario; los campos `None` no se tocan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CambiosUsuario {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub nombre: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rol: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avatar_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
}

#[derive(Serialize)]
struct RegistroPayload<'a> {
  nombre: &'a str,
  email: &'a str,
  password: &'a str,
  #[serde(rename = "passwordConfirm")]
  password_confirm: &'a str,
  rol: &'a str,
  fecha_registro: String,
  avatar_url: &'a str,
}

#[derive(Clone)]
pub struct UserService {
  store: Arc<dyn RecordStore>,
  session: Arc<dyn SessionProvider>,
}

impl UserService {
  pub fn new(store: Arc<dyn RecordStore>, session: Arc<dyn SessionProvider>) -> Self {
    Self { store, session }
  }

  /// Iniciar sesión. Guarda token y usuario en la sesión compartida.
  pub async fn login(&self, email: &str, password: &str) -> Result<Sesion, DomainError> {
    let res = async {
                let auth = self.store.auth_with_password(USERS, email, password).await?;
                let usuario: Usuario = from_record(&auth.record)?;
                self.session.save(auth.token.clone(), auth.record);
                log::info!("Sesión iniciada: {}", usuario.email);
                Ok::<_, DomainError>(Sesion { token: auth.token,
                                              usuario })
              }.await;
    registrar("Error al iniciar sesión", res)
  }

  pub fn logout(&self) {
    self.session.clear();
  }

  /// Registrar un usuario nuevo con rol `usuario`.
  pub async fn registrar(&self, nombre: &str, email: &str, password: &str) -> Result<Usuario, DomainError> {
    let res = async {
                if vacio(email) || password.is_empty() {
                  return Err(DomainError::ValidationError("Debes pasar email y contraseña".into()));
                }
                let payload = RegistroPayload { nombre,
                                                email,
                                                password,
                                                password_confirm: password,
                                                rol: ROL_USUARIO,
                                                fecha_registro: ahora(),
                                                avatar_url: "" };
                let rec = self.store.create(USERS, to_payload(&payload)?).await?;
                from_record(&rec)
              }.await;
    registrar("Error al registrar usuario", res)
  }

  /// Usuario autenticado, si lo hay.
  pub fn actual(&self) -> Option<Usuario> {
    self.session.current().and_then(|r| r.to_entity().ok())
  }

  pub async fn todos(&self) -> Result<Vec<Usuario>, DomainError> {
    let res = async { from_records(&self.store.get_full_list(USERS, MAX_LISTA, &ListOptions::new()).await?) }.await;
    registrar("Error al obtener usuarios", res)
  }

  pub async fn por_id(&self, id: &str) -> Result<Usuario, DomainError> {
    let res = async { from_record(&self.store.get_one(USERS, id).await?) }.await;
    registrar(&format!("Error al obtener usuario con id {}", id), res)
  }

  /// Actualizar un usuario. Si cambia la contraseña se envía también su
  /// confirmación; una contraseña vacía la deja como estaba.
  pub async fn update(&self, id: &str, cambios: &CambiosUsuario) -> Result<Usuario, DomainError> {
    let res = async {
                let mut payload = to_payload(cambios)?;
                match cambios.password.as_deref() {
                  Some(p) if !p.is_empty() => {
                    payload.fields.insert("passwordConfirm".into(), p.into());
                  }
                  _ => {
                    payload.fields.remove("password");
                  }
                }
                let rec = self.store.update(USERS, id, payload).await?;
                from_record(&rec)
              }.await;
    registrar(&format!("Error al actualizar usuario con id {}", id), res)
  }

  pub async fn delete(&self, id: &str) -> Result<bool, DomainError> {
    let res = self.store.delete(USERS, id).await.map_err(DomainError::from);
    registrar(&format!("Error al eliminar usuario con id {}", id), res)
  }
}
