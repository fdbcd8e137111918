use crate::caballo::{CABALLOS, PEDIGRI};
use crate::carrera::CARRERAS;
use crate::comentario::COMENTARIOS;
use crate::imagen::{IMAGENES, IMAGENES_NOTICIAS};
use crate::noticia::{NOTICIAS, NOTICIA_CABALLO};
use crate::participa::PARTICIPACIONES;
use crate::user::{ROL_ADMIN, ROL_USUARIO, USERS};
use crate::DomainError;
use registro::{AccessRule, InMemoryRecordStore, Record, RecordPayload, RecordStore, SessionProvider};
use serde_json::{json, Value};
use std::sync::Arc;

pub const ADMIN_EMAIL: &str = "admin@cuadra.es";
pub const ADMIN_PASSWORD: &str = "admin1234";
pub const SOCIO_EMAIL: &str = "socio@cuadra.es";
pub const SOCIO_PASSWORD: &str = "socio1234";

const CABALLOS_EJEMPLO: [(&str, &str, &str, &str); 12] = [("Lucero del Alba", "castaño", "macho", "2015-04-02"),
                                                            ("Brisa Marina", "tordo", "hembra", "2016-03-18"),
                                                            ("Relámpago", "negro", "macho", "2017-05-09"),
                                                            ("Duquesa", "alazán", "hembra", "2014-02-27"),
                                                            ("Trueno Real", "castaño", "macho", "2018-06-11"),
                                                            ("Estrella Fugaz", "tordo", "hembra", "2019-01-30"),
                                                            ("Viento Sur", "bayo", "macho", "2016-07-22"),
                                                            ("Perla Negra", "negro", "hembra", "2017-09-04"),
                                                            ("Capitán", "alazán", "macho", "2015-11-15"),
                                                            ("Luna Llena", "blanco", "hembra", "2018-03-03"),
                                                            ("Centella", "castaño", "hembra", "2020-04-19"),
                                                            ("Sultán", "negro", "macho", "2013-08-08")];

pub struct DomainStubs;

impl DomainStubs {
  /// Crea un almacén en memoria pre-poblado con caballos, pedigrí,
  /// carreras, noticias, imágenes y dos usuarios (un administrador y un
  /// socio). Las colecciones de contenido sólo las puede escribir un
  /// administrador, como en el servicio real.
  pub async fn sample_store(session: Arc<dyn SessionProvider>) -> Result<InMemoryRecordStore, DomainError> {
    let store = InMemoryRecordStore::new();

    crear(&store,
          USERS,
          json!({"email": ADMIN_EMAIL, "nombre": "Administración", "rol": ROL_ADMIN,
                 "password": ADMIN_PASSWORD, "passwordConfirm": ADMIN_PASSWORD})).await?;
    let socio = crear(&store,
                      USERS,
                      json!({"email": SOCIO_EMAIL, "nombre": "Socio", "rol": ROL_USUARIO,
                             "password": SOCIO_PASSWORD, "passwordConfirm": SOCIO_PASSWORD})).await?;

    let mut caballos = Vec::with_capacity(CABALLOS_EJEMPLO.len());
    for (nombre, color, sexo, nacimiento) in CABALLOS_EJEMPLO {
      let c = crear(&store,
                    CABALLOS,
                    json!({"nombre": nombre, "color": color, "sexo": sexo,
                           "fecha_nacimiento": nacimiento, "descripcion": format!("{} de la cuadra", nombre),
                           "duenyo": "Cuadra", "entrenador": "J. Romero", "hogar": "Jerez"})).await?;
      caballos.push(c);
    }

    // Centella es hija de Lucero del Alba y Duquesa; el abuelo no está en la cuadra.
    for (tipo, ascendiente) in [("padre", &caballos[0]), ("madre", &caballos[3])] {
      crear(&store,
            PEDIGRI,
            json!({"id_caballo": caballos[10].id, "id_ascendiente": ascendiente.id,
                   "nombre_ascendiente": ascendiente.get_str("nombre"), "tipo_relacion": tipo})).await?;
    }
    crear(&store,
          PEDIGRI,
          json!({"id_caballo": caballos[0].id, "id_ascendiente": "",
                 "nombre_ascendiente": "Gran Señor", "tipo_relacion": "padre"})).await?;

    let carrera = crear(&store,
                        CARRERAS,
                        json!({"nombre": "Gran Premio de Otoño", "fecha": "2024-10-12", "distancia": 2400,
                               "condiciones": "Terreno blando", "lugar": "Hipódromo de la Zarzuela"})).await?;
    crear(&store,
          CARRERAS,
          json!({"nombre": "Copa de Primavera", "fecha": "2025-04-06", "distancia": 1600,
                 "condiciones": "-", "lugar": "Hipódromo de Sanlúcar"})).await?;
    for (posicion, caballo) in caballos.iter().take(3).enumerate() {
      crear(&store,
            PARTICIPACIONES,
            json!({"id_caballo": caballo.id, "id_carrera": carrera.id,
                   "posicion": posicion + 1, "jinete": "-"})).await?;
    }

    let noticia = crear(&store,
                        NOTICIAS,
                        json!({"titulo": "Victoria en el Gran Premio", "contenido": "Lucero del Alba gana en la Zarzuela.",
                               "fecha": "2024-10-13T09:00:00.000Z"})).await?;
    crear(&store,
          NOTICIAS,
          json!({"titulo": "Nueva incorporación", "contenido": "Centella llega a la cuadra.",
                 "fecha": "2025-01-20T10:00:00.000Z", "url_video": "https://video.cuadra.es/centella"})).await?;
    crear(&store, NOTICIA_CABALLO, json!({"id_noticia": noticia.id, "id_caballo": caballos[0].id})).await?;
    crear(&store,
          IMAGENES_NOTICIAS,
          json!({"id_noticia": noticia.id, "url": "podio.jpg", "descripcion": "Podio", "tipo": "principal"})).await?;
    crear(&store,
          COMENTARIOS,
          json!({"contenido": "¡Enhorabuena!", "fecha": "2024-10-13T12:00:00.000Z",
                 "uid_usuario": socio.id, "id_noticia": noticia.id})).await?;

    for (i, caballo) in caballos.iter().enumerate().step_by(3) {
      crear(&store,
            IMAGENES,
            json!({"id_caballo": caballo.id, "url": format!("caballo_{}.jpg", i),
                   "descripcion": "", "fecha_subida": "2024-01-01T00:00:00.000Z"})).await?;
    }

    let mut store = store.with_session(session);
    for coleccion in [CABALLOS, PEDIGRI, CARRERAS, PARTICIPACIONES, NOTICIAS, NOTICIA_CABALLO, IMAGENES, IMAGENES_NOTICIAS] {
      store = store.with_rule(coleccion, AccessRule::AdminWrite);
    }
    Ok(store.with_rule(COMENTARIOS, AccessRule::AuthenticatedWrite)
            .with_rule(USERS, AccessRule::OwnerOrAdmin))
  }
}

async fn crear(store: &InMemoryRecordStore, coleccion: &str, datos: Value) -> Result<Record, DomainError> {
  match datos {
    Value::Object(fields) => Ok(store.create(coleccion, RecordPayload::new(fields)).await?),
    otro => Err(DomainError::SerializationError(format!("se esperaba un objeto, llegó {}", otro))),
  }
}
