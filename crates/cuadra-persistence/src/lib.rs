//! Almacenamientos de registros de la cuadra.
//! `DieselRecordStore` guarda las colecciones en SQLite; `PocketBaseStore`
//! habla con el servicio alojado por HTTP. `config` elige uno a partir del
//! entorno.

pub mod config;
mod pocketbase;
mod record_persistence;
pub mod schema;

pub use config::{new_store_from_env, Backend, BackendConfig};
pub use pocketbase::{error_from_status, PocketBaseStore, MAX_PER_PAGE};
pub use record_persistence::{DieselRecordStore, MIGRATIONS};
