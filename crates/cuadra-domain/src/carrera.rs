// carrera.rs
use crate::entity::{from_record, from_records, registrar, to_payload, vacio, Entidad, MAX_LISTA};
use crate::DomainError;
use registro::{Filter, ListOptions, RecordStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const CARRERAS: &str = "carreras";

/// Carrera, independiente de los caballos que participan en ella.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrera {
  pub id: String,
  pub nombre: String,
  #[serde(default)]
  pub fecha: String,
  /// Distancia en metros.
  #[serde(default)]
  pub distancia: u32,
  #[serde(default)]
  pub condiciones: String,
  #[serde(default)]
  pub lugar: String,
}

impl Entidad for Carrera {
  fn id(&self) -> &str {
    &self.id
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatosCarrera {
  pub nombre: String,
  pub fecha: String,
  pub distancia: u32,
  pub condiciones: Option<String>,
  pub lugar: String,
}

#[derive(Serialize)]
struct CarreraPayload<'a> {
  nombre: &'a str,
  fecha: &'a str,
  distancia: u32,
  condiciones: &'a str,
  lugar: &'a str,
}

impl<'a> From<&'a DatosCarrera> for CarreraPayload<'a> {
  fn from(d: &'a DatosCarrera) -> Self {
    Self { nombre: &d.nombre,
           fecha: &d.fecha,
           distancia: d.distancia,
           condiciones: d.condiciones.as_deref().unwrap_or("-"),
           lugar: &d.lugar }
  }
}

#[derive(Clone)]
pub struct CarreraService {
  store: Arc<dyn RecordStore>,
}

impl CarreraService {
  pub fn new(store: Arc<dyn RecordStore>) -> Self {
    Self { store }
  }

  /// Crear una carrera. `condiciones` vale `"-"` si no se indica.
  pub async fn create(&self, datos: &DatosCarrera) -> Result<Carrera, DomainError> {
    let res = async {
                if vacio(&datos.nombre) || vacio(&datos.fecha) || datos.distancia == 0 || vacio(&datos.lugar) {
                  return Err(DomainError::ValidationError("Debes pasar al menos nombre, fecha, distancia y lugar".into()));
                }
                let rec = self.store.create(CARRERAS, to_payload(&CarreraPayload::from(datos))?).await?;
                from_record(&rec)
              }.await;
    registrar("Error al crear carrera", res)
  }

  pub async fn delete(&self, id: &str) -> Result<bool, DomainError> {
    let res = self.store.delete(CARRERAS, id).await.map_err(DomainError::from);
    registrar("Error al eliminar carrera", res)
  }

  /// Carreras ordenadas por fecha descendente.
  pub async fn lista(&self) -> Result<Vec<Carrera>, DomainError> {
    let res = async {
                let opts = ListOptions::new().sort("-fecha");
                from_records(&self.store.get_full_list(CARRERAS, MAX_LISTA, &opts).await?)
              }.await;
    registrar("Error al obtener la lista de carreras", res)
  }

  /// Carreras cuyo nombre contiene `texto`.
  pub async fn buscar(&self, texto: &str) -> Result<Vec<Carrera>, DomainError> {
    let res = async {
                let opts = ListOptions::new().filter(Filter::contains("nombre", texto));
                from_records(&self.store.get_full_list(CARRERAS, MAX_LISTA, &opts).await?)
              }.await;
    registrar("Error al obtener carreras", res)
  }

  /// Editar una carrera: se exigen todos los campos.
  pub async fn editar(&self, id: &str, datos: &DatosCarrera) -> Result<Carrera, DomainError> {
    let res = async {
                if vacio(id) {
                  return Err(DomainError::ValidationError("Debes proporcionar un ID de carrera válido".into()));
                }
                let sin_condiciones = datos.condiciones.as_deref().map(vacio).unwrap_or(true);
                if vacio(&datos.nombre) || vacio(&datos.fecha) || datos.distancia == 0 || vacio(&datos.lugar) || sin_condiciones {
                  return Err(DomainError::ValidationError("Debes proporcionar todos los campos de la carrera".into()));
                }
                let rec = self.store.update(CARRERAS, id, to_payload(&CarreraPayload::from(datos))?).await?;
                from_record(&rec)
              }.await;
    registrar("Error al editar carrera", res)
  }
}
