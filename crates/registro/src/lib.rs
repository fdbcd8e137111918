//! Crate `registro`: cliente de registros por colección
//!
//! Define el contrato `RecordStore` contra un servicio de registros alojado
//! (CRUD por colección con filtros y orden en forma de cadena), la sesión
//! del usuario (`SessionProvider`), el lenguaje de filtros y una
//! implementación en memoria (`InMemoryRecordStore`) útil para pruebas.
//!
//! Ejemplo rápido:
//! ```rust
//! use registro::{Filter, ListOptions};
//! let opts = ListOptions::new().filter(Filter::contains("nombre", "Lucero")).sort("-created");
//! assert_eq!(opts.filter.as_deref(), Some("nombre~\"Lucero\""));
//! ```
pub mod domain;
pub mod errors;
pub mod filter;
pub mod repository;
pub mod session;
pub mod stubs;
pub mod token;
pub mod validation;

pub use domain::*;
pub use errors::*;
pub use filter::{Filter, FilterOp};
pub use repository::*;
pub use session::{FileSessionStorage, SessionState, SessionStorage, SessionStore};
pub use stubs::{AccessRule, InMemoryRecordStore, ADMIN_ONLY_MESSAGE, AUTH_REQUIRED_MESSAGE, NOT_ALLOWED_MESSAGE};
