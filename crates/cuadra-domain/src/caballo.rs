// caballo.rs
//
// Caballos y su pedigrí. Como el pedigrí sólo relaciona caballos, su
// colección se gestiona desde este mismo servicio.
use crate::entity::{empty_as_none, from_record, from_records, registrar, to_payload, vacio, Entidad, MAX_LISTA};
use crate::DomainError;
use registro::{Filter, ListOptions, RecordStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const CABALLOS: &str = "caballos";
pub const PEDIGRI: &str = "pedigri";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caballo {
  pub id: String,
  #[serde(default)]
  pub nombre: String,
  #[serde(default)]
  pub descripcion: String,
  #[serde(default)]
  pub descripcion_larga: String,
  #[serde(default)]
  pub color: String,
  #[serde(default)]
  pub sexo: String,
  #[serde(default, deserialize_with = "empty_as_none")]
  pub fecha_nacimiento: Option<String>,
  #[serde(default, deserialize_with = "empty_as_none")]
  pub fecha_retiramiento: Option<String>,
  #[serde(default, deserialize_with = "empty_as_none")]
  pub fecha_fallecimiento: Option<String>,
  #[serde(default)]
  pub duenyo: String,
  #[serde(default)]
  pub entrenador: String,
  #[serde(default)]
  pub hogar: String,
}

impl Entidad for Caballo {
  fn id(&self) -> &str {
    &self.id
  }
}

impl fmt::Display for Caballo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.nombre)?;
    if !self.color.is_empty() || !self.sexo.is_empty() {
      write!(f, " ({} {})", self.color, self.sexo)?;
    }
    if let Some(n) = &self.fecha_nacimiento {
      write!(f, ", nacido {}", n)?;
    }
    Ok(())
  }
}

/// Campos editables de un caballo.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatosCaballo {
  pub nombre: String,
  pub descripcion: String,
  pub descripcion_larga: String,
  pub color: String,
  pub sexo: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fecha_nacimiento: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fecha_retiramiento: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fecha_fallecimiento: Option<String>,
  pub duenyo: String,
  pub entrenador: String,
  pub hogar: String,
}

impl DatosCaballo {
  pub fn con_nombre(nombre: &str) -> Self {
    Self { nombre: nombre.to_string(),
           ..Self::default() }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pedigri {
  pub id: String,
  pub id_caballo: String,
  #[serde(default)]
  pub id_ascendiente: String,
  #[serde(default)]
  pub nombre_ascendiente: String,
  #[serde(default)]
  pub tipo_relacion: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatosPedigri {
  pub id_caballo: String,
  pub id_ascendiente: String,
  pub nombre_ascendiente: String,
  pub tipo_relacion: String,
}

/// Ascendiente de un caballo tal como lo devuelve `con_ascendientes`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ascendiente {
  pub tipo_relacion: String,
  pub id_ascendiente: String,
  pub nombre_ascendiente: String,
  /// Caballo ascendiente completo, si está registrado en la cuadra.
  pub ascendiente: Option<Caballo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaballoConAscendientes {
  pub caballo: Caballo,
  pub ascendientes: Vec<Ascendiente>,
}

#[derive(Clone)]
pub struct CaballoService {
  store: Arc<dyn RecordStore>,
}

impl CaballoService {
  pub fn new(store: Arc<dyn RecordStore>) -> Self {
    Self { store }
  }

  /// Crear un nuevo caballo.
  pub async fn create(&self, datos: &DatosCaballo) -> Result<Caballo, DomainError> {
    let res = async {
                validar_nombre(datos)?;
                let rec = self.store.create(CABALLOS, to_payload(datos)?).await?;
                from_record(&rec)
              }.await;
    registrar("Error al crear caballo", res)
  }

  /// Crear una nueva entrada de pedigrí.
  pub async fn create_pedigri(&self, datos: &DatosPedigri) -> Result<Pedigri, DomainError> {
    let res = async {
                if vacio(&datos.id_caballo) || vacio(&datos.tipo_relacion) {
                  return Err(DomainError::ValidationError("Debes pasar al menos id_caballo y tipo_relacion".into()));
                }
                let rec = self.store.create(PEDIGRI, to_payload(datos)?).await?;
                from_record(&rec)
              }.await;
    registrar("Error al crear pedigrí", res)
  }

  pub async fn delete(&self, id: &str) -> Result<bool, DomainError> {
    let res = self.store.delete(CABALLOS, id).await.map_err(DomainError::from);
    registrar("Error al eliminar caballo", res)
  }

  pub async fn delete_pedigri(&self, id: &str) -> Result<bool, DomainError> {
    let res = self.store.delete(PEDIGRI, id).await.map_err(DomainError::from);
    registrar("Error al eliminar pedigrí", res)
  }

  /// Obtener un caballo con todos sus ascendientes (padre/madre).
  pub async fn con_ascendientes(&self, id_caballo: &str) -> Result<CaballoConAscendientes, DomainError> {
    let res = async {
                let caballo: Caballo = from_record(&self.store.get_one(CABALLOS, id_caballo).await?)?;
                let opts = ListOptions::new().filter(Filter::eq("id_caballo", id_caballo)).expand("id_ascendiente");
                let relaciones = self.store.get_full_list(PEDIGRI, MAX_LISTA, &opts).await?;
                let mut ascendientes = Vec::with_capacity(relaciones.len());
                for r in &relaciones {
                  let p: Pedigri = from_record(r)?;
                  let ascendiente = match r.expand.get("id_ascendiente") {
                    Some(v) => Some(serde_json::from_value::<Caballo>(v.clone())?),
                    None => None,
                  };
                  ascendientes.push(Ascendiente { tipo_relacion: p.tipo_relacion,
                                                  id_ascendiente: p.id_ascendiente,
                                                  nombre_ascendiente: p.nombre_ascendiente,
                                                  ascendiente });
                }
                Ok::<_, DomainError>(CaballoConAscendientes { caballo, ascendientes })
              }.await;
    registrar("Error al obtener caballo con ascendientes", res)
  }

  /// Lista de caballos, los más recientes primero.
  pub async fn lista(&self) -> Result<Vec<Caballo>, DomainError> {
    let res = async {
                let opts = ListOptions::new().sort("-created");
                from_records(&self.store.get_full_list(CABALLOS, MAX_LISTA, &opts).await?)
              }.await;
    registrar("Error al obtener la lista de caballos", res)
  }

  /// Caballos cuyo nombre contiene `nombre`.
  pub async fn buscar_por_nombre(&self, nombre: &str) -> Result<Vec<Caballo>, DomainError> {
    let res = async {
                let opts = ListOptions::new().filter(Filter::contains("nombre", nombre));
                from_records(&self.store.get_full_list(CABALLOS, MAX_LISTA, &opts).await?)
              }.await;
    registrar("Error al obtener caballos", res)
  }

  pub async fn por_id(&self, id: &str) -> Result<Caballo, DomainError> {
    let res = async { from_record(&self.store.get_one(CABALLOS, id).await?) }.await;
    registrar("Error al obtener caballo por ID", res)
  }

  pub async fn update(&self, id: &str, datos: &DatosCaballo) -> Result<Caballo, DomainError> {
    let res = async {
                validar_nombre(datos)?;
                let rec = self.store.update(CABALLOS, id, to_payload(datos)?).await?;
                from_record(&rec)
              }.await;
    registrar("Error al actualizar caballo", res)
  }
}

fn validar_nombre(datos: &DatosCaballo) -> Result<(), DomainError> {
  if vacio(&datos.nombre) {
    return Err(DomainError::ValidationError("El campo 'nombre' es obligatorio.".into()));
  }
  Ok(())
}
