mod source;
mod state;
mod store;

pub use source::{CaballosSource, ListSource, NoticiasSource};
pub use state::{is_admin_required_message, ContentKey, ListState, PageDirection, ADMIN_ERROR_HINTS, DEFAULT_PAGE_SIZE};
pub use store::{Confirmer, ListStore, RemoveOutcome};
