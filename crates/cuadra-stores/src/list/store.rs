// Archivo: list/store.rs
// Propósito: `ListStore`, listado paginado con búsqueda, borrado confirmado
// y precarga de imágenes por elemento sobre un `ListSource`.
//
// Cada `load`/`search` toma un número de petición creciente. Cuando llega
// la respuesta de una petición que ya no es la última, se descarta sin
// tocar el estado (tampoco `loading`).
use crate::config::{StoresConfig, MAX_PREFETCH_CONCURRENCY};
use crate::list::source::ListSource;
use crate::list::state::{ContentKey, ListState};
use cuadra_domain::Entidad;
use indexmap::IndexMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Confirmación interactiva (sí/no) antes de borrar.
pub trait Confirmer: Send + Sync {
  fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirmer for F where F: Fn(&str) -> bool + Send + Sync
{
  fn confirm(&self, message: &str) -> bool {
    self(message)
  }
}

/// Resultado de `ListStore::remove`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
  /// El usuario no confirmó; el estado no cambia.
  Cancelled,
  Removed,
  /// El servicio rechazó el borrado; el mensaje queda también en `error`.
  Failed(String),
}

pub struct ListStore<S: ListSource> {
  source: Arc<S>,
  state: Mutex<ListState<S::Item, S::Image>>,
  request_seq: AtomicU64,
  /// Última petición que terminó siendo la vigente.
  settled_seq: AtomicU64,
  prefetch_concurrency: usize,
}

impl<S: ListSource> ListStore<S> {
  pub fn new(source: S, config: &StoresConfig) -> Self {
    Self { source: Arc::new(source),
           state: Mutex::new(ListState::new(config.page_size)),
           request_seq: AtomicU64::new(0),
           settled_seq: AtomicU64::new(0),
           prefetch_concurrency: config.prefetch_concurrency.clamp(1, MAX_PREFETCH_CONCURRENCY) }
  }

  fn lock(&self) -> MutexGuard<'_, ListState<S::Item, S::Image>> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn is_current(&self, token: u64) -> bool {
    self.request_seq.load(Ordering::SeqCst) == token
  }

  /// Hay un `load`/`search` vigente sin terminar.
  fn refresh_pending(&self) -> bool {
    self.request_seq.load(Ordering::SeqCst) != self.settled_seq.load(Ordering::SeqCst)
  }

  /// Carga la lista completa, más recientes primero.
  pub async fn load(&self) {
    self.refresh(None, false).await
  }

  /// Busca con el término guardado; sin término equivale a `load`. Vuelve
  /// siempre a la página 1.
  pub async fn search(&self) {
    let term = self.lock().search_term.trim().to_string();
    self.refresh(Some(term).filter(|t| !t.is_empty()), true).await
  }

  pub fn set_search_term(&self, term: &str) {
    self.lock().search_term = term.to_string();
  }

  async fn refresh(&self, term: Option<String>, reset_page: bool) {
    let token = self.request_seq.fetch_add(1, Ordering::SeqCst) + 1;
    {
      let mut s = self.lock();
      s.loading = true;
      s.error = None;
    }
    let res = match &term {
      Some(t) => self.source.search(t).await,
      None => self.source.fetch_all().await,
    };
    let ids = {
      let mut s = self.lock();
      if !self.is_current(token) {
        log::debug!("respuesta de la petición {} descartada", token);
        return;
      }
      match res {
        Ok(mut items) => {
          items.reverse();
          let ids: Vec<String> = items.iter().map(|t| t.id().to_string()).collect();
          s.replace_items(items, reset_page);
          ids
        }
        Err(e) => {
          s.error = Some(e.to_string());
          s.loading = false;
          self.settled_seq.store(token, Ordering::SeqCst);
          return;
        }
      }
    };
    let images = self.prefetch_images(ids).await;
    let mut s = self.lock();
    if !self.is_current(token) {
      log::debug!("imágenes de la petición {} descartadas", token);
      return;
    }
    for (id, imgs) in images {
      s.set_images(&id, imgs);
    }
    s.loading = false;
    self.settled_seq.store(token, Ordering::SeqCst);
  }

  /// Pide las imágenes de cada elemento con un máximo de
  /// `prefetch_concurrency` peticiones a la vez. Cada id recibe exactamente
  /// una entrada, en el orden de `ids`; un fallo deja la lista vacía.
  async fn prefetch_images(&self, ids: Vec<String>) -> IndexMap<String, Vec<S::Image>> {
    let semaphore = Arc::new(Semaphore::new(self.prefetch_concurrency));
    let mut tasks = JoinSet::new();
    for (idx, id) in ids.iter().enumerate() {
      let source = self.source.clone();
      let semaphore = semaphore.clone();
      let id = id.clone();
      tasks.spawn(async move {
                   let _permit = semaphore.acquire_owned().await;
                   (idx, source.fetch_images(&id).await)
                 });
    }
    let mut slots: Vec<Option<Vec<S::Image>>> = vec![None; ids.len()];
    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok((idx, Ok(imgs))) => slots[idx] = Some(imgs),
        Ok((idx, Err(e))) => {
          log::warn!("No se pudieron cargar imágenes para {}: {}", ids[idx], e);
          slots[idx] = Some(Vec::new());
        }
        Err(e) => log::warn!("Tarea de imágenes interrumpida: {}", e),
      }
    }
    ids.into_iter().zip(slots).map(|(id, imgs)| (id, imgs.unwrap_or_default())).collect()
  }

  pub fn toggle_expanded(&self, id: &str) {
    self.lock().toggle_expanded(id);
  }

  /// Borra un elemento tras confirmarlo. Sólo se quita de la lista si el
  /// servicio lo ha borrado.
  pub async fn remove(&self, id: &str, confirmer: &dyn Confirmer) -> RemoveOutcome {
    if !confirmer.confirm(self.source.confirm_message()) {
      return RemoveOutcome::Cancelled;
    }
    self.lock().loading = true;
    let res = self.source.delete(id).await;
    let mut s = self.lock();
    // Con un `load`/`search` en curso, `loading` es suyo.
    if !self.refresh_pending() {
      s.loading = false;
    }
    match res {
      Ok(_) => {
        s.remove_item(id);
        RemoveOutcome::Removed
      }
      Err(e) => {
        let msg = e.to_string();
        s.error = Some(msg.clone());
        RemoveOutcome::Failed(msg)
      }
    }
  }

  pub fn go_prev(&self) -> bool {
    self.lock().go_prev()
  }

  pub fn go_next(&self) -> bool {
    self.lock().go_next()
  }

  pub fn go_prev_directional(&self) -> bool {
    self.lock().go_prev_directional()
  }

  pub fn go_next_directional(&self) -> bool {
    self.lock().go_next_directional()
  }

  /// Copia del estado actual.
  pub fn snapshot(&self) -> ListState<S::Item, S::Image> {
    self.lock().clone()
  }

  pub fn items(&self) -> Vec<S::Item> {
    self.lock().items.clone()
  }

  pub fn visible_items(&self) -> Vec<S::Item> {
    self.lock().visible_items().to_vec()
  }

  pub fn images_for(&self, id: &str) -> Option<Vec<S::Image>> {
    self.lock().images_by_id.get(id).cloned()
  }

  pub fn total_pages(&self) -> usize {
    self.lock().total_pages()
  }

  pub fn current_page(&self) -> usize {
    self.lock().current_page
  }

  pub fn content_key(&self) -> ContentKey {
    self.lock().content_key()
  }

  pub fn page_transition(&self) -> &'static str {
    self.lock().page_transition()
  }

  pub fn error(&self) -> Option<String> {
    self.lock().error.clone()
  }

  pub fn is_loading(&self) -> bool {
    self.lock().loading
  }

  pub fn is_admin_required_error(&self) -> bool {
    self.lock().is_admin_required_error()
  }

  pub fn expanded_id(&self) -> Option<String> {
    self.lock().expanded_id.clone()
  }
}
