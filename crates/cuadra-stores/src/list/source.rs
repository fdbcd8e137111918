// Archivo: list/source.rs
// Propósito: origen de datos de un listado (`ListSource`) y sus dos
// implementaciones: caballos y noticias, cada una con sus imágenes.
use async_trait::async_trait;
use cuadra_domain::{Caballo, CaballoService, DomainError, Entidad, Imagen, ImagenNoticia, ImagenService, Noticia, NoticiaService};
use registro::RecordStore;
use std::sync::Arc;

/// Lo que un `ListStore` necesita de los servicios.
#[async_trait]
pub trait ListSource: Send + Sync + 'static {
  type Item: Entidad + Clone + Send + Sync + 'static;
  type Image: Clone + Send + Sync + 'static;

  /// Lista completa en el orden del servicio.
  async fn fetch_all(&self) -> Result<Vec<Self::Item>, DomainError>;

  /// Elementos cuyo nombre o título contiene `term`.
  async fn search(&self, term: &str) -> Result<Vec<Self::Item>, DomainError>;

  async fn delete(&self, id: &str) -> Result<bool, DomainError>;

  async fn fetch_images(&self, id: &str) -> Result<Vec<Self::Image>, DomainError>;

  /// Pregunta a confirmar antes de borrar.
  fn confirm_message(&self) -> &'static str;
}

pub struct CaballosSource {
  caballos: CaballoService,
  imagenes: ImagenService,
}

impl CaballosSource {
  pub fn new(store: Arc<dyn RecordStore>) -> Self {
    Self { caballos: CaballoService::new(store.clone()),
           imagenes: ImagenService::new(store) }
  }
}

#[async_trait]
impl ListSource for CaballosSource {
  type Item = Caballo;
  type Image = Imagen;

  async fn fetch_all(&self) -> Result<Vec<Caballo>, DomainError> {
    self.caballos.lista().await
  }

  async fn search(&self, term: &str) -> Result<Vec<Caballo>, DomainError> {
    self.caballos.buscar_por_nombre(term).await
  }

  async fn delete(&self, id: &str) -> Result<bool, DomainError> {
    self.caballos.delete(id).await
  }

  async fn fetch_images(&self, id: &str) -> Result<Vec<Imagen>, DomainError> {
    self.imagenes.por_caballo(id).await
  }

  fn confirm_message(&self) -> &'static str {
    "¿Eliminar este caballo? Esta acción no se puede deshacer."
  }
}

pub struct NoticiasSource {
  noticias: NoticiaService,
  imagenes: ImagenService,
}

impl NoticiasSource {
  pub fn new(store: Arc<dyn RecordStore>) -> Self {
    Self { noticias: NoticiaService::new(store.clone()),
           imagenes: ImagenService::new(store) }
  }
}

#[async_trait]
impl ListSource for NoticiasSource {
  type Item = Noticia;
  type Image = ImagenNoticia;

  async fn fetch_all(&self) -> Result<Vec<Noticia>, DomainError> {
    self.noticias.lista().await
  }

  async fn search(&self, term: &str) -> Result<Vec<Noticia>, DomainError> {
    self.noticias.buscar_por_titulo(term).await
  }

  async fn delete(&self, id: &str) -> Result<bool, DomainError> {
    self.noticias.delete(id).await
  }

  async fn fetch_images(&self, id: &str) -> Result<Vec<ImagenNoticia>, DomainError> {
    self.imagenes.por_noticia(id).await
  }

  fn confirm_message(&self) -> &'static str {
    "¿Eliminar esta noticia?"
  }
}
