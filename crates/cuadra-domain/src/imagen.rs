// imagen.rs
//
// Imágenes de caballos (`imagenes`) y de noticias (`imagenes_noticias`).
// El campo `url` es un fichero: se envía como parte del formulario.
use crate::entity::{ahora, from_record, from_records, registrar, to_payload, vacio, Entidad, MAX_LISTA};
use crate::DomainError;
use registro::{FileUpload, Filter, ListOptions, RecordPayload, RecordStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const IMAGENES: &str = "imagenes";
pub const IMAGENES_NOTICIAS: &str = "imagenes_noticias";

const CAMPO_FICHERO: &str = "url";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imagen {
  pub id: String,
  pub id_caballo: String,
  /// Nombre del fichero guardado.
  #[serde(default)]
  pub url: String,
  #[serde(default)]
  pub descripcion: String,
  #[serde(default)]
  pub fecha_subida: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagenNoticia {
  pub id: String,
  pub id_noticia: String,
  #[serde(default)]
  pub url: String,
  #[serde(default)]
  pub descripcion: String,
  /// `"principal"` o `"secundaria"`.
  #[serde(default)]
  pub tipo: String,
  #[serde(default)]
  pub fecha_subida: String,
}

impl Entidad for Imagen {
  fn id(&self) -> &str {
    &self.id
  }
}

impl Entidad for ImagenNoticia {
  fn id(&self) -> &str {
    &self.id
  }
}

/// Fichero a subir.
#[derive(Debug, Clone, PartialEq)]
pub struct Archivo {
  pub nombre: String,
  pub bytes: Vec<u8>,
}

impl Archivo {
  pub fn new(nombre: &str, bytes: Vec<u8>) -> Self {
    Self { nombre: nombre.to_string(),
           bytes }
  }

  fn upload(&self) -> FileUpload {
    FileUpload { field: CAMPO_FICHERO.to_string(),
                 file_name: self.nombre.clone(),
                 bytes: self.bytes.clone() }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatosImagen {
  pub id_caballo: String,
  pub archivo: Option<Archivo>,
  pub descripcion: Option<String>,
  pub fecha_subida: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatosImagenNoticia {
  pub id_noticia: String,
  pub archivo: Option<Archivo>,
  pub descripcion: Option<String>,
  pub tipo: Option<String>,
  pub fecha_subida: Option<String>,
}

#[derive(Serialize)]
struct ImagenPayload<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  id_caballo: Option<&'a str>,
  descripcion: &'a str,
  fecha_subida: String,
}

#[derive(Serialize)]
struct ImagenNoticiaPayload<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  id_noticia: Option<&'a str>,
  descripcion: &'a str,
  tipo: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  fecha_subida: Option<String>,
}

fn con_archivo(payload: RecordPayload, archivo: Option<&Archivo>) -> RecordPayload {
  match archivo {
    Some(a) => payload.with_file(a.upload()),
    None => payload,
  }
}

#[derive(Clone)]
pub struct ImagenService {
  store: Arc<dyn RecordStore>,
}

impl ImagenService {
  pub fn new(store: Arc<dyn RecordStore>) -> Self {
    Self { store }
  }

  /// Crear una imagen para un caballo.
  pub async fn create_imagen(&self, datos: &DatosImagen) -> Result<Imagen, DomainError> {
    let res = async {
                let archivo = match &datos.archivo {
                  Some(a) if !vacio(&datos.id_caballo) => a,
                  _ => return Err(DomainError::ValidationError("Debes pasar al menos id_caballo y url (File)".into())),
                };
                let payload = ImagenPayload { id_caballo: Some(&datos.id_caballo),
                                              descripcion: datos.descripcion.as_deref().unwrap_or(""),
                                              fecha_subida: datos.fecha_subida.clone().unwrap_or_else(ahora) };
                let rec = self.store.create(IMAGENES, to_payload(&payload)?.with_file(archivo.upload())).await?;
                from_record(&rec)
              }.await;
    registrar("Error al crear imagen", res)
  }

  /// Crear una imagen para una noticia. `tipo` vale `"secundaria"` si no se indica.
  pub async fn create_imagen_noticia(&self, datos: &DatosImagenNoticia) -> Result<ImagenNoticia, DomainError> {
    let res = async {
                let archivo = match &datos.archivo {
                  Some(a) if !vacio(&datos.id_noticia) => a,
                  _ => return Err(DomainError::ValidationError("Debes pasar al menos id_noticia y url (File)".into())),
                };
                let payload = ImagenNoticiaPayload { id_noticia: Some(&datos.id_noticia),
                                                     descripcion: datos.descripcion.as_deref().unwrap_or(""),
                                                     tipo: datos.tipo.as_deref().unwrap_or("secundaria"),
                                                     fecha_subida: datos.fecha_subida.clone() };
                let rec = self.store.create(IMAGENES_NOTICIAS, to_payload(&payload)?.with_file(archivo.upload())).await?;
                from_record(&rec)
              }.await;
    registrar("Error al crear imagen de noticia", res)
  }

  pub async fn delete_imagen(&self, id: &str) -> Result<bool, DomainError> {
    let res = self.store.delete(IMAGENES, id).await.map_err(DomainError::from);
    registrar("Error al eliminar imagen", res)
  }

  pub async fn delete_imagen_noticia(&self, id: &str) -> Result<bool, DomainError> {
    let res = self.store.delete(IMAGENES_NOTICIAS, id).await.map_err(DomainError::from);
    registrar("Error al eliminar imagen de noticia", res)
  }

  /// Imágenes de un caballo, las más recientes primero.
  pub async fn por_caballo(&self, id_caballo: &str) -> Result<Vec<Imagen>, DomainError> {
    let res = async {
                let opts = ListOptions::new().filter(Filter::eq("id_caballo", id_caballo)).sort("-fecha_subida");
                from_records(&self.store.get_full_list(IMAGENES, MAX_LISTA, &opts).await?)
              }.await;
    registrar("Error al obtener imágenes de caballo", res)
  }

  /// Imágenes de una noticia ordenadas por `-tipo`: las secundarias van
  /// antes que la principal por orden alfabético inverso.
  pub async fn por_noticia(&self, id_noticia: &str) -> Result<Vec<ImagenNoticia>, DomainError> {
    let res = async {
                let opts = ListOptions::new().filter(Filter::eq("id_noticia", id_noticia)).sort("-tipo");
                from_records(&self.store.get_full_list(IMAGENES_NOTICIAS, MAX_LISTA, &opts).await?)
              }.await;
    registrar("Error al obtener imágenes de noticia", res)
  }

  pub async fn todas_caballos(&self) -> Result<Vec<Imagen>, DomainError> {
    let res = async {
                let opts = ListOptions::new().sort("-fecha_subida");
                from_records(&self.store.get_full_list(IMAGENES, MAX_LISTA, &opts).await?)
              }.await;
    registrar("Error al obtener todas las imágenes de caballos", res)
  }

  pub async fn todas_noticias(&self) -> Result<Vec<ImagenNoticia>, DomainError> {
    let res = async {
                let opts = ListOptions::new().sort("-tipo");
                from_records(&self.store.get_full_list(IMAGENES_NOTICIAS, MAX_LISTA, &opts).await?)
              }.await;
    registrar("Error al obtener todas las imágenes de noticias", res)
  }

  /// Editar una imagen de caballo. Sin archivo se conserva el actual.
  pub async fn update_imagen(&self, id: &str, datos: &DatosImagen) -> Result<Imagen, DomainError> {
    let res = async {
                if vacio(id) {
                  return Err(DomainError::ValidationError("Debes pasar el id de la imagen a editar".into()));
                }
                let payload = ImagenPayload { id_caballo: None,
                                              descripcion: datos.descripcion.as_deref().unwrap_or(""),
                                              fecha_subida: datos.fecha_subida.clone().unwrap_or_else(ahora) };
                let payload = con_archivo(to_payload(&payload)?, datos.archivo.as_ref());
                let rec = self.store.update(IMAGENES, id, payload).await?;
                from_record(&rec)
              }.await;
    registrar("Error al actualizar imagen", res)
  }

  pub async fn update_imagen_noticia(&self, id: &str, datos: &DatosImagenNoticia) -> Result<ImagenNoticia, DomainError> {
    let res = async {
                if vacio(id) {
                  return Err(DomainError::ValidationError("Debes pasar el id de la imagen de noticia a editar".into()));
                }
                let payload = ImagenNoticiaPayload { id_noticia: None,
                                                     descripcion: datos.descripcion.as_deref().unwrap_or(""),
                                                     tipo: datos.tipo.as_deref().unwrap_or("secundaria"),
                                                     fecha_subida: Some(datos.fecha_subida.clone().unwrap_or_else(ahora)) };
                let payload = con_archivo(to_payload(&payload)?, datos.archivo.as_ref());
                let rec = self.store.update(IMAGENES_NOTICIAS, id, payload).await?;
                from_record(&rec)
              }.await;
    registrar("Error al actualizar imagen de noticia", res)
  }
}
