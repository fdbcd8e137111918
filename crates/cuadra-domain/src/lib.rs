//! Servicios de entidades de la cuadra: caballos y pedigrí, carreras,
//! participaciones, noticias, imágenes, comentarios y usuarios.
//!
//! Cada servicio es una capa fina sobre `registro::RecordStore`: valida la
//! entrada, fija valores por defecto, registra el error si lo hay y lo
//! devuelve sin cambios.
mod caballo;
mod carrera;
mod comentario;
mod domain_stubs;
mod entity;
mod errors;
mod imagen;
mod noticia;
mod participa;
mod user;

pub use caballo::{Ascendiente, Caballo, CaballoConAscendientes, CaballoService, DatosCaballo, DatosPedigri, Pedigri, CABALLOS, PEDIGRI};
pub use carrera::{Carrera, CarreraService, DatosCarrera, CARRERAS};
pub use comentario::{Comentario, ComentarioService, DatosComentario, COMENTARIOS};
pub use domain_stubs::{DomainStubs, ADMIN_EMAIL, ADMIN_PASSWORD, SOCIO_EMAIL, SOCIO_PASSWORD};
pub use entity::{ahora, Entidad, MAX_LISTA};
pub use errors::DomainError;
pub use imagen::{Archivo, DatosImagen, DatosImagenNoticia, Imagen, ImagenNoticia, ImagenService, IMAGENES, IMAGENES_NOTICIAS};
pub use noticia::{DatosNoticia, Noticia, NoticiaCaballo, NoticiaService, NOTICIAS, NOTICIA_CABALLO};
pub use participa::{DatosParticipacion, Participacion, ParticipacionService, PARTICIPACIONES};
pub use user::{CambiosUsuario, Sesion, UserService, Usuario, ROL_ADMIN, ROL_USUARIO, USERS};
