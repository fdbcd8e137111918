// Configuración de los listados, leída del entorno.
//
//   CUADRA_PAGE_SIZE              elementos por página (por defecto 9)
//   CUADRA_PREFETCH_CONCURRENCY   peticiones de imágenes simultáneas (por defecto 4,
//                                 como mucho MAX_PREFETCH_CONCURRENCY)
use crate::list::DEFAULT_PAGE_SIZE;

pub const DEFAULT_PREFETCH_CONCURRENCY: usize = 4;
pub const MAX_PREFETCH_CONCURRENCY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoresConfig {
  pub page_size: usize,
  pub prefetch_concurrency: usize,
}

impl Default for StoresConfig {
  fn default() -> Self {
    Self { page_size: DEFAULT_PAGE_SIZE,
           prefetch_concurrency: DEFAULT_PREFETCH_CONCURRENCY }
  }
}

impl StoresConfig {
  pub fn from_env() -> Self {
    dotenvy::dotenv().ok();
    Self::from_lookup(|k| std::env::var(k).ok())
  }

  /// Valores ausentes, no numéricos o cero se sustituyen por los de defecto.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    let leer = |clave: &str, defecto: usize| {
      match lookup(clave).map(|v| v.trim().parse::<usize>()) {
        Some(Ok(n)) if n > 0 => n,
        Some(_) => {
          log::warn!("{} no es un entero positivo; se usa {}", clave, defecto);
          defecto
        }
        None => defecto,
      }
    };
    let mut prefetch_concurrency = leer("CUADRA_PREFETCH_CONCURRENCY", DEFAULT_PREFETCH_CONCURRENCY);
    if prefetch_concurrency > MAX_PREFETCH_CONCURRENCY {
      log::warn!("CUADRA_PREFETCH_CONCURRENCY={} supera el máximo; se usa {}",
                 prefetch_concurrency,
                 MAX_PREFETCH_CONCURRENCY);
      prefetch_concurrency = MAX_PREFETCH_CONCURRENCY;
    }
    Self { page_size: leer("CUADRA_PAGE_SIZE", DEFAULT_PAGE_SIZE),
           prefetch_concurrency }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn valores_por_defecto_y_entorno() {
    assert_eq!(StoresConfig::from_lookup(|_| None), StoresConfig::default());
    let c = StoresConfig::from_lookup(|k| match k {
                                        "CUADRA_PAGE_SIZE" => Some("12".into()),
                                        _ => Some("0".into()),
                                      });
    assert_eq!(c.page_size, 12);
    assert_eq!(c.prefetch_concurrency, DEFAULT_PREFETCH_CONCURRENCY);
  }

  #[test]
  fn la_concurrencia_tiene_tope() {
    let c = StoresConfig::from_lookup(|k| match k {
                                        "CUADRA_PREFETCH_CONCURRENCY" => Some(usize::MAX.to_string()),
                                        _ => None,
                                      });
    assert_eq!(c.prefetch_concurrency, MAX_PREFETCH_CONCURRENCY);
    let c = StoresConfig::from_lookup(|k| match k {
                                        "CUADRA_PREFETCH_CONCURRENCY" => Some("16".into()),
                                        _ => None,
                                      });
    assert_eq!(c.prefetch_concurrency, 16);
  }
}
