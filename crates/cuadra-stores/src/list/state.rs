// Archivo: list/state.rs
// Propósito: estado puro de un listado paginado (página actual, búsqueda,
// elemento desplegado e imágenes por elemento) y sus valores derivados.
//
// Invariantes que mantienen todas las operaciones:
// - `current_page` está en `[1, total_pages()]`.
// - las claves de `images_by_id` son ids de `items`.
use cuadra_domain::Entidad;
use indexmap::IndexMap;
use std::fmt;

/// Elementos por página de los listados.
pub const DEFAULT_PAGE_SIZE: usize = 9;

/// Fragmentos (en minúsculas) que delatan un rechazo por falta de permisos.
pub const ADMIN_ERROR_HINTS: [&str; 7] =
  ["admin", "administrador", "permiso", "permission", "only admin", "solo admin", "only administrators"];

/// Sentido del último cambio de página, para la transición de la vista.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageDirection {
  #[default]
  Next,
  Prev,
}

impl PageDirection {
  pub fn transition(self) -> &'static str {
    match self {
      PageDirection::Next => "page-next",
      PageDirection::Prev => "page-prev",
    }
  }
}

/// Rama de la vista a pintar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKey {
  Loading,
  Error,
  Empty,
  Page(usize),
}

impl fmt::Display for ContentKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ContentKey::Loading => write!(f, "loading"),
      ContentKey::Error => write!(f, "error"),
      ContentKey::Empty => write!(f, "empty"),
      ContentKey::Page(n) => write!(f, "page-{}", n),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T, I> {
  pub items: Vec<T>,
  pub page_size: usize,
  pub current_page: usize,
  pub direction: PageDirection,
  pub loading: bool,
  pub error: Option<String>,
  pub search_term: String,
  pub expanded_id: Option<String>,
  pub images_by_id: IndexMap<String, Vec<I>>,
}

impl<T, I> Default for ListState<T, I> {
  fn default() -> Self {
    Self::new(DEFAULT_PAGE_SIZE)
  }
}

/// `true` si el mensaje indica que la operación exige administrador.
pub fn is_admin_required_message(message: &str) -> bool {
  let text = message.to_lowercase();
  ADMIN_ERROR_HINTS.iter().any(|h| text.contains(h))
}

impl<T, I> ListState<T, I> {
  /// Estado vacío. Un tamaño de página 0 se trata como 1.
  pub fn new(page_size: usize) -> Self {
    Self { items: Vec::new(),
           page_size: page_size.max(1),
           current_page: 1,
           direction: PageDirection::Next,
           loading: false,
           error: None,
           search_term: String::new(),
           expanded_id: None,
           images_by_id: IndexMap::new() }
  }

  pub fn total_pages(&self) -> usize {
    self.items.len().div_ceil(self.page_size).max(1)
  }

  pub fn visible_items(&self) -> &[T] {
    let start = ((self.current_page - 1) * self.page_size).min(self.items.len());
    let end = (start + self.page_size).min(self.items.len());
    &self.items[start..end]
  }

  pub fn content_key(&self) -> ContentKey {
    if self.loading {
      ContentKey::Loading
    } else if self.error.is_some() {
      ContentKey::Error
    } else if self.items.is_empty() {
      ContentKey::Empty
    } else {
      ContentKey::Page(self.current_page)
    }
  }

  pub fn page_transition(&self) -> &'static str {
    self.direction.transition()
  }

  pub fn is_admin_required_error(&self) -> bool {
    self.error.as_deref().map(is_admin_required_message).unwrap_or(false)
  }

  /// Página anterior. Devuelve `false` si ya estaba en la primera.
  pub fn go_prev(&mut self) -> bool {
    if self.current_page <= 1 {
      return false;
    }
    self.current_page -= 1;
    true
  }

  pub fn go_next(&mut self) -> bool {
    if self.current_page >= self.total_pages() {
      return false;
    }
    self.current_page += 1;
    true
  }

  /// Como `go_prev`, anotando el sentido. En el límite no cambia nada.
  pub fn go_prev_directional(&mut self) -> bool {
    if self.current_page <= 1 {
      return false;
    }
    self.direction = PageDirection::Prev;
    self.go_prev()
  }

  pub fn go_next_directional(&mut self) -> bool {
    if self.current_page >= self.total_pages() {
      return false;
    }
    self.direction = PageDirection::Next;
    self.go_next()
  }

  /// Despliega `id`, o lo pliega si ya era el desplegado.
  pub fn toggle_expanded(&mut self, id: &str) {
    if self.expanded_id.as_deref() == Some(id) {
      self.expanded_id = None;
    } else {
      self.expanded_id = Some(id.to_string());
    }
  }

  fn clamp_page(&mut self) {
    self.current_page = self.current_page.clamp(1, self.total_pages());
  }
}

impl<T: Entidad, I> ListState<T, I> {
  /// Sustituye la lista completa. Con `reset_page` vuelve a la página 1;
  /// si no, ajusta la página a las que haya. Las imágenes de elementos que
  /// ya no están se descartan.
  pub fn replace_items(&mut self, items: Vec<T>, reset_page: bool) {
    self.items = items;
    self.images_by_id.retain(|id, _| self.items.iter().any(|t| t.id() == id));
    if self.expanded_id.as_deref().map(|e| !self.items.iter().any(|t| t.id() == e)).unwrap_or(false) {
      self.expanded_id = None;
    }
    if reset_page {
      self.current_page = 1;
    } else {
      self.clamp_page();
    }
  }

  /// Guarda las imágenes de un elemento presente en la lista.
  pub fn set_images(&mut self, id: &str, images: Vec<I>) -> bool {
    if !self.items.iter().any(|t| t.id() == id) {
      return false;
    }
    self.images_by_id.insert(id.to_string(), images);
    true
  }

  /// Quita un elemento tras borrarlo. Si la página actual queda vacía y no
  /// es la primera, retrocede una.
  pub fn remove_item(&mut self, id: &str) -> bool {
    let before = self.items.len();
    self.items.retain(|t| t.id() != id);
    if self.items.len() == before {
      return false;
    }
    self.images_by_id.shift_remove(id);
    if self.expanded_id.as_deref() == Some(id) {
      self.expanded_id = None;
    }
    if self.visible_items().is_empty() && self.current_page > 1 {
      self.current_page -= 1;
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Clone, PartialEq)]
  struct Item(String);

  impl Entidad for Item {
    fn id(&self) -> &str {
      &self.0
    }
  }

  fn items(n: usize) -> Vec<Item> {
    (0..n).map(|i| Item(format!("id{}", i))).collect()
  }

  fn state(n: usize) -> ListState<Item, String> {
    let mut s = ListState::new(DEFAULT_PAGE_SIZE);
    s.replace_items(items(n), true);
    s
  }

  #[test]
  fn veinte_caballos_en_tres_paginas() {
    let mut s = state(20);
    assert_eq!(s.total_pages(), 3);
    assert_eq!(s.visible_items().len(), 9);
    assert!(s.go_next());
    assert_eq!(s.visible_items().len(), 9);
    assert!(s.go_next());
    assert_eq!(s.visible_items().len(), 2);
    assert_eq!(s.content_key().to_string(), "page-3");
    assert!(!s.go_next());
    assert_eq!(s.current_page, 3);
  }

  #[test]
  fn lista_vacia_tiene_una_pagina() {
    let s = state(0);
    assert_eq!(s.total_pages(), 1);
    assert_eq!(s.content_key(), ContentKey::Empty);
    assert!(s.visible_items().is_empty());
  }

  #[test]
  fn prioridad_de_content_key() {
    let mut s = state(3);
    s.error = Some("fallo".into());
    assert_eq!(s.content_key().to_string(), "error");
    s.loading = true;
    assert_eq!(s.content_key().to_string(), "loading");
  }

  #[test]
  fn borrar_el_unico_de_la_pagina_dos_retrocede() {
    let mut s = state(10);
    s.go_next();
    s.set_images("id9", vec!["foto".into()]);
    s.toggle_expanded("id9");
    assert!(s.remove_item("id9"));
    assert_eq!(s.current_page, 1);
    assert_eq!(s.total_pages(), 1);
    assert!(!s.images_by_id.contains_key("id9"));
    assert!(s.expanded_id.is_none());
  }

  #[test]
  fn borrar_en_la_primera_pagina_no_mueve() {
    let mut s = state(1);
    assert!(s.remove_item("id0"));
    assert_eq!(s.current_page, 1);
    assert!(!s.remove_item("id0"));
  }

  #[test]
  fn navegacion_direccional_en_los_limites() {
    let mut s = state(20);
    assert!(!s.go_prev_directional());
    assert_eq!(s.direction, PageDirection::Next);
    assert!(s.go_next_directional());
    assert!(s.go_prev_directional());
    assert_eq!(s.page_transition(), "page-prev");
    s.current_page = 3;
    s.direction = PageDirection::Prev;
    assert!(!s.go_next_directional());
    assert_eq!(s.direction, PageDirection::Prev);
    assert_eq!(s.current_page, 3);
  }

  #[test]
  fn toggle_expandido() {
    let mut s = state(2);
    s.toggle_expanded("id0");
    assert_eq!(s.expanded_id.as_deref(), Some("id0"));
    s.toggle_expanded("id1");
    assert_eq!(s.expanded_id.as_deref(), Some("id1"));
    s.toggle_expanded("id1");
    assert!(s.expanded_id.is_none());
  }

  #[test]
  fn errores_de_administrador() {
    let mut s = state(0);
    s.error = Some("Only admins can perform this action".into());
    assert!(s.is_admin_required_error());
    s.error = Some("Network timeout".into());
    assert!(!s.is_admin_required_error());
    s.error = Some("No tienes PERMISO".into());
    assert!(s.is_admin_required_error());
    s.error = None;
    assert!(!s.is_admin_required_error());
  }

  #[test]
  fn recargar_ajusta_la_pagina() {
    let mut s = state(20);
    s.current_page = 3;
    s.set_images("id19", vec![]);
    s.replace_items(items(5), false);
    assert_eq!(s.current_page, 1);
    assert!(s.images_by_id.is_empty());
  }

  #[test]
  fn imagenes_solo_de_elementos_presentes() {
    let mut s = state(1);
    assert!(!s.set_images("otro", vec![]));
    assert!(s.set_images("id0", vec!["a".into()]));
  }
}

#[cfg(test)]
mod property_tests {
  use super::*;
  use proptest::prelude::*;

  #[derive(Debug, Clone, PartialEq)]
  struct Item(String);

  impl Entidad for Item {
    fn id(&self) -> &str {
      &self.0
    }
  }

  #[derive(Debug, Clone, Copy)]
  enum Paso {
    Prev,
    Next,
    PrevDir,
    NextDir,
    Borrar(usize),
  }

  fn paso_strategy() -> impl Strategy<Value = Paso> {
    prop_oneof![Just(Paso::Prev),
                Just(Paso::Next),
                Just(Paso::PrevDir),
                Just(Paso::NextDir),
                (0usize..64).prop_map(Paso::Borrar)]
  }

  fn state(n: usize, p: usize) -> ListState<Item, ()> {
    let mut s = ListState::new(p);
    s.replace_items((0..n).map(|i| Item(i.to_string())).collect(), true);
    s
  }

  proptest! {
    #[test]
    fn total_pages_es_techo_de_la_division(n in 0usize..200, p in 1usize..20) {
      let s = state(n, p);
      prop_assert_eq!(s.total_pages(), std::cmp::max(1, n.div_ceil(p)));
    }

    #[test]
    fn paginas_llenas_salvo_la_ultima(n in 0usize..200, p in 1usize..20) {
      let mut s = state(n, p);
      let total = s.total_pages();
      for page in 1..=total {
        s.current_page = page;
        let esperado = if page < total { p } else { n - (total - 1) * p };
        prop_assert_eq!(s.visible_items().len(), esperado);
      }
    }

    #[test]
    fn la_pagina_nunca_sale_de_rango(n in 0usize..64, p in 1usize..12, pasos in prop::collection::vec(paso_strategy(), 0..40)) {
      let mut s = state(n, p);
      for paso in pasos {
        let antes = s.current_page;
        match paso {
          Paso::Prev => { s.go_prev(); }
          Paso::Next => { s.go_next(); }
          Paso::PrevDir => { s.go_prev_directional(); }
          Paso::NextDir => { s.go_next_directional(); }
          Paso::Borrar(i) => {
            let id = i.to_string();
            let estaba = s.items.iter().any(|t| t.0 == id);
            s.remove_item(&id);
            prop_assert!(!s.items.iter().any(|t| t.0 == id));
            prop_assert!(!s.images_by_id.contains_key(&id));
            if estaba {
              prop_assert!(s.current_page == antes || s.current_page + 1 == antes);
            } else {
              prop_assert_eq!(s.current_page, antes);
            }
          }
        }
        prop_assert!(s.current_page >= 1 && s.current_page <= s.total_pages());
      }
    }

    #[test]
    fn loading_manda_en_content_key(n in 0usize..20, error in proptest::option::of(".*")) {
      let mut s = state(n, 9);
      s.error = error;
      s.loading = true;
      prop_assert_eq!(s.content_key(), ContentKey::Loading);
    }
  }
}
