//! Estado de la interfaz de la cuadra, independiente de la vista:
//! listados paginados de caballos y noticias (`list`), sesión (`auth`),
//! rutas con su guarda (`router`) y configuración (`config`).
pub mod auth;
pub mod config;
pub mod list;
pub mod router;

pub use auth::{AuthState, AuthStore};
pub use config::{StoresConfig, DEFAULT_PREFETCH_CONCURRENCY, MAX_PREFETCH_CONCURRENCY};
pub use list::{CaballosSource, Confirmer, ContentKey, ListSource, ListState, ListStore, NoticiasSource, PageDirection, RemoveOutcome};
pub use router::{guard, resolve, GuardDecision, Route, RouteMatch};
