// comentario.rs
use crate::entity::{ahora, from_record, from_records, registrar, to_payload, vacio, Entidad, MAX_LISTA};
use crate::DomainError;
use registro::{Filter, ListOptions, RecordStore, SessionProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const COMENTARIOS: &str = "comentarios";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comentario {
  pub id: String,
  #[serde(default)]
  pub contenido: String,
  #[serde(default)]
  pub fecha: String,
  #[serde(default)]
  pub uid_usuario: String,
  #[serde(default)]
  pub id_noticia: String,
}

impl Entidad for Comentario {
  fn id(&self) -> &str {
    &self.id
  }
}

/// Datos de entrada. `uid_usuario` puede omitirse al crear: se toma del
/// usuario autenticado.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatosComentario {
  pub contenido: String,
  pub id_noticia: String,
  pub fecha: Option<String>,
  pub uid_usuario: Option<String>,
}

#[derive(Serialize)]
struct ComentarioPayload<'a> {
  contenido: &'a str,
  fecha: String,
  uid_usuario: &'a str,
  id_noticia: &'a str,
}

#[derive(Clone)]
pub struct ComentarioService {
  store: Arc<dyn RecordStore>,
  session: Arc<dyn SessionProvider>,
}

impl ComentarioService {
  pub fn new(store: Arc<dyn RecordStore>, session: Arc<dyn SessionProvider>) -> Self {
    Self { store, session }
  }

  /// Crear un comentario con el contenido recortado.
  pub async fn create(&self, datos: &DatosComentario) -> Result<Comentario, DomainError> {
    let res = async {
                let contenido = datos.contenido.trim();
                if contenido.is_empty() {
                  return Err(DomainError::ValidationError("El campo 'contenido' es obligatorio y no puede estar vacío.".into()));
                }
                if vacio(&datos.id_noticia) {
                  return Err(DomainError::ValidationError("El campo 'id_noticia' (ID de la noticia) es obligatorio.".into()));
                }
                let uid_usuario = match datos.uid_usuario.as_deref().filter(|u| !u.is_empty()) {
                  Some(u) => u.to_string(),
                  None => self.session.current().map(|u| u.id).ok_or_else(|| {
                            DomainError::ValidationError("No hay usuario autenticado. Inicia sesión o pasa 'uid_usuario' explícitamente.".into())
                          })?,
                };
                let payload = ComentarioPayload { contenido,
                                                  fecha: datos.fecha.clone().unwrap_or_else(ahora),
                                                  uid_usuario: &uid_usuario,
                                                  id_noticia: &datos.id_noticia };
                let rec = self.store.create(COMENTARIOS, to_payload(&payload)?).await?;
                from_record(&rec)
              }.await;
    registrar("Error en crear comentario", res)
  }

  pub async fn delete(&self, id: &str) -> Result<bool, DomainError> {
    let res = self.store.delete(COMENTARIOS, id).await.map_err(DomainError::from);
    registrar("Error al eliminar comentario", res)
  }

  /// Comentarios, más recientes primero; opcionalmente sólo los de una noticia.
  pub async fn lista(&self, id_noticia: Option<&str>) -> Result<Vec<Comentario>, DomainError> {
    let res = async {
                let mut opts = ListOptions::new().sort("-fecha");
                if let Some(id) = id_noticia.filter(|id| !id.is_empty()) {
                  opts = opts.filter(Filter::eq("id_noticia", id));
                }
                from_records(&self.store.get_full_list(COMENTARIOS, MAX_LISTA, &opts).await?)
              }.await;
    registrar("Error al obtener la lista de comentarios", res)
  }

  pub async fn todos(&self) -> Result<Vec<Comentario>, DomainError> {
    self.lista(None).await
  }

  /// Editar un comentario. `fecha` pasa a ser la actual si no se indica.
  pub async fn editar(&self, id: &str, datos: &DatosComentario) -> Result<Comentario, DomainError> {
    let res = async {
                if vacio(id) {
                  return Err(DomainError::ValidationError("El ID del comentario es obligatorio para editar.".into()));
                }
                let uid_usuario = datos.uid_usuario.as_deref().unwrap_or_default();
                if vacio(&datos.contenido) || vacio(&datos.id_noticia) || vacio(uid_usuario) {
                  return Err(DomainError::ValidationError("Debes proporcionar todos los campos del comentario a editar.".into()));
                }
                let payload = ComentarioPayload { contenido: &datos.contenido,
                                                  fecha: datos.fecha.clone().unwrap_or_else(ahora),
                                                  uid_usuario,
                                                  id_noticia: &datos.id_noticia };
                let rec = self.store.update(COMENTARIOS, id, to_payload(&payload)?).await?;
                from_record(&rec)
              }.await;
    registrar("Error al editar comentario", res)
  }
}
