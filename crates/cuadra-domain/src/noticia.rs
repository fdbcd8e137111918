// noticia.rs
//
// Noticias y su relación con caballos (`noticia_caballo`).
use crate::entity::{ahora, empty_as_none, from_record, from_records, registrar, to_payload, vacio, Entidad, MAX_LISTA};
use crate::DomainError;
use registro::{Filter, ListOptions, RecordStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const NOTICIAS: &str = "noticias";
pub const NOTICIA_CABALLO: &str = "noticia_caballo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Noticia {
  pub id: String,
  #[serde(default)]
  pub titulo: String,
  #[serde(default)]
  pub contenido: String,
  #[serde(default)]
  pub fecha: String,
  #[serde(default, deserialize_with = "empty_as_none")]
  pub url_video: Option<String>,
}

impl Entidad for Noticia {
  fn id(&self) -> &str {
    &self.id
  }
}

impl fmt::Display for Noticia {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.fecha.get(..10) {
      Some(dia) => write!(f, "{} [{}]", self.titulo, dia),
      None => write!(f, "{}", self.titulo),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticiaCaballo {
  pub id: String,
  pub id_noticia: String,
  pub id_caballo: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatosNoticia {
  pub titulo: String,
  pub contenido: String,
  pub fecha: Option<String>,
  pub url_video: Option<String>,
}

impl DatosNoticia {
  pub fn con_titulo(titulo: &str) -> Self {
    Self { titulo: titulo.to_string(),
           ..Self::default() }
  }
}

#[derive(Serialize)]
struct NoticiaPayload<'a> {
  titulo: &'a str,
  contenido: &'a str,
  fecha: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  url_video: Option<&'a str>,
}

impl<'a> From<&'a DatosNoticia> for NoticiaPayload<'a> {
  fn from(d: &'a DatosNoticia) -> Self {
    Self { titulo: &d.titulo,
           contenido: &d.contenido,
           fecha: d.fecha.clone().filter(|f| !f.is_empty()).unwrap_or_else(ahora),
           url_video: d.url_video.as_deref() }
  }
}

#[derive(Serialize)]
struct RelacionPayload<'a> {
  id_noticia: &'a str,
  id_caballo: &'a str,
}

#[derive(Clone)]
pub struct NoticiaService {
  store: Arc<dyn RecordStore>,
}

impl NoticiaService {
  pub fn new(store: Arc<dyn RecordStore>) -> Self {
    Self { store }
  }

  /// Crear una noticia. Sin fecha se usa la actual.
  pub async fn create(&self, datos: &DatosNoticia) -> Result<Noticia, DomainError> {
    let res = async {
                validar_titulo(datos)?;
                let rec = self.store.create(NOTICIAS, to_payload(&NoticiaPayload::from(datos))?).await?;
                from_record(&rec)
              }.await;
    registrar("Error al crear noticia", res)
  }

  /// Relacionar una noticia con un caballo.
  pub async fn create_noticia_caballo(&self, id_noticia: &str, id_caballo: &str) -> Result<NoticiaCaballo, DomainError> {
    let res = async {
                if vacio(id_noticia) || vacio(id_caballo) {
                  return Err(DomainError::ValidationError("Debes pasar id_noticia e id_caballo".into()));
                }
                let payload = RelacionPayload { id_noticia, id_caballo };
                let rec = self.store.create(NOTICIA_CABALLO, to_payload(&payload)?).await?;
                from_record(&rec)
              }.await;
    registrar("Error al crear entrada en NOTICIA_CABALLO", res)
  }

  pub async fn delete(&self, id: &str) -> Result<bool, DomainError> {
    let res = self.store.delete(NOTICIAS, id).await.map_err(DomainError::from);
    registrar("Error al eliminar noticia", res)
  }

  pub async fn delete_noticia_caballo(&self, id: &str) -> Result<bool, DomainError> {
    let res = self.store.delete(NOTICIA_CABALLO, id).await.map_err(DomainError::from);
    registrar("Error al eliminar noticia_caballo", res)
  }

  /// Noticias, las más recientes primero.
  pub async fn lista(&self) -> Result<Vec<Noticia>, DomainError> {
    let res = async {
                let opts = ListOptions::new().sort("-created");
                from_records(&self.store.get_full_list(NOTICIAS, MAX_LISTA, &opts).await?)
              }.await;
    registrar("Error al obtener la lista de noticias", res)
  }

  /// Noticias cuyo título contiene `titulo`.
  pub async fn buscar_por_titulo(&self, titulo: &str) -> Result<Vec<Noticia>, DomainError> {
    let res = async {
                let opts = ListOptions::new().filter(Filter::contains("titulo", titulo));
                from_records(&self.store.get_full_list(NOTICIAS, MAX_LISTA, &opts).await?)
              }.await;
    registrar("Error al obtener noticias", res)
  }

  pub async fn por_id(&self, id: &str) -> Result<Noticia, DomainError> {
    let res = async { from_record(&self.store.get_one(NOTICIAS, id).await?) }.await;
    registrar("Error al obtener noticia por ID", res)
  }

  pub async fn noticia_caballo_por_id(&self, id: &str) -> Result<NoticiaCaballo, DomainError> {
    let res = async { from_record(&self.store.get_one(NOTICIA_CABALLO, id).await?) }.await;
    registrar("Error al obtener noticia_caballo por ID", res)
  }

  pub async fn update(&self, id: &str, datos: &DatosNoticia) -> Result<Noticia, DomainError> {
    let res = async {
                validar_titulo(datos)?;
                let rec = self.store.update(NOTICIAS, id, to_payload(&NoticiaPayload::from(datos))?).await?;
                from_record(&rec)
              }.await;
    registrar("Error al actualizar noticia", res)
  }
}

fn validar_titulo(datos: &DatosNoticia) -> Result<(), DomainError> {
  if vacio(&datos.titulo) {
    return Err(DomainError::ValidationError("El campo 'titulo' es obligatorio.".into()));
  }
  Ok(())
}
