// participa.rs
use crate::entity::{from_record, from_records, registrar, to_payload, vacio, Entidad, MAX_LISTA};
use crate::DomainError;
use registro::{Filter, ListOptions, RecordStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const PARTICIPACIONES: &str = "participaciones";

/// Participación de un caballo en una carrera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participacion {
  pub id: String,
  pub id_caballo: String,
  pub id_carrera: String,
  #[serde(default)]
  pub posicion: u32,
  #[serde(default)]
  pub jinete: String,
}

impl Entidad for Participacion {
  fn id(&self) -> &str {
    &self.id
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatosParticipacion {
  pub id_caballo: String,
  pub id_carrera: String,
  pub posicion: u32,
  pub jinete: Option<String>,
}

#[derive(Serialize)]
struct ParticipacionPayload<'a> {
  id_caballo: &'a str,
  id_carrera: &'a str,
  posicion: u32,
  jinete: &'a str,
}

impl<'a> From<&'a DatosParticipacion> for ParticipacionPayload<'a> {
  fn from(d: &'a DatosParticipacion) -> Self {
    Self { id_caballo: &d.id_caballo,
           id_carrera: &d.id_carrera,
           posicion: d.posicion,
           jinete: d.jinete.as_deref().unwrap_or("-") }
  }
}

#[derive(Clone)]
pub struct ParticipacionService {
  store: Arc<dyn RecordStore>,
}

impl ParticipacionService {
  pub fn new(store: Arc<dyn RecordStore>) -> Self {
    Self { store }
  }

  /// Crear una participación. `jinete` vale `"-"` si no se indica.
  pub async fn create(&self, datos: &DatosParticipacion) -> Result<Participacion, DomainError> {
    let res = async {
                if vacio(&datos.id_caballo) || vacio(&datos.id_carrera) || datos.posicion == 0 {
                  return Err(DomainError::ValidationError("Debes pasar al menos id_caballo, id_carrera y posicion".into()));
                }
                let rec = self.store.create(PARTICIPACIONES, to_payload(&ParticipacionPayload::from(datos))?).await?;
                from_record(&rec)
              }.await;
    registrar("Error al crear participación", res)
  }

  pub async fn delete(&self, id: &str) -> Result<bool, DomainError> {
    let res = self.store.delete(PARTICIPACIONES, id).await.map_err(DomainError::from);
    registrar("Error al eliminar participación", res)
  }

  pub async fn todas(&self) -> Result<Vec<Participacion>, DomainError> {
    let res = async { from_records(&self.store.get_full_list(PARTICIPACIONES, MAX_LISTA, &ListOptions::new()).await?) }.await;
    registrar("Error al obtener la lista de participaciones", res)
  }

  /// Participaciones de un caballo, de una carrera o de ambos a la vez.
  pub async fn filtrar(&self, id_caballo: Option<&str>, id_carrera: Option<&str>) -> Result<Vec<Participacion>, DomainError> {
    let res = async {
                let mut filtro = Filter::default();
                if let Some(c) = id_caballo.filter(|c| !c.is_empty()) {
                  filtro = filtro.and(Filter::eq("id_caballo", c));
                }
                if let Some(c) = id_carrera.filter(|c| !c.is_empty()) {
                  filtro = filtro.and(Filter::eq("id_carrera", c));
                }
                let opts = ListOptions::new().filter(filtro);
                from_records(&self.store.get_full_list(PARTICIPACIONES, MAX_LISTA, &opts).await?)
              }.await;
    registrar("Error al obtener participaciones", res)
  }

  /// Editar una participación: se exigen todos los campos, jinete incluido.
  pub async fn editar(&self, id: &str, datos: &DatosParticipacion) -> Result<Participacion, DomainError> {
    let res = async {
                if vacio(id) {
                  return Err(DomainError::ValidationError("Debes proporcionar un ID de participación para editar".into()));
                }
                let sin_jinete = datos.jinete.as_deref().map(vacio).unwrap_or(true);
                if vacio(&datos.id_caballo) || vacio(&datos.id_carrera) || datos.posicion == 0 || sin_jinete {
                  return Err(DomainError::ValidationError("Datos incompletos para editar la participación".into()));
                }
                let rec = self.store.update(PARTICIPACIONES, id, to_payload(&ParticipacionPayload::from(datos))?).await?;
                from_record(&rec)
              }.await;
    registrar("Error al editar participación", res)
  }
}
