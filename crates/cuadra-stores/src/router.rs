// Archivo: router.rs
// Propósito: tabla de rutas con nombre de la aplicación y la guarda de
// navegación: sin sesión se redirige al login, sin rol de administrador se
// bloquea con un aviso.
use crate::auth::AuthState;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

pub const LOGIN: &str = "login";
pub const ADMIN_ALERT: &str = "Necesitas permisos de administrador para acceder a esta página.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
  pub name: &'static str,
  /// Patrón con segmentos `:param`.
  pub path: &'static str,
  pub requires_auth: bool,
  pub requires_admin: bool,
}

const fn publica(name: &'static str, path: &'static str) -> Route {
  Route { name,
          path,
          requires_auth: false,
          requires_admin: false }
}

const fn de_admin(name: &'static str, path: &'static str) -> Route {
  Route { name,
          path,
          requires_auth: true,
          requires_admin: true }
}

static ROUTES: Lazy<Vec<Route>> = Lazy::new(|| {
  vec![publica("caballos", "/"),
       de_admin("caballo-nuevo", "/caballos/nuevo"),
       de_admin("caballo-editar", "/caballos/:id/editar"),
       publica("pedigri", "/caballos/:id/pedigri"),
       de_admin("pedigri-nuevo", "/caballos/:id/pedigri/nuevo"),
       publica("noticias", "/noticias"),
       de_admin("noticia-nueva", "/noticias/nueva"),
       de_admin("noticia-editar", "/noticias/:id/editar"),
       publica(LOGIN, "/login")]
});

pub fn routes() -> &'static [Route] {
  &ROUTES
}

pub fn route(name: &str) -> Option<&'static Route> {
  ROUTES.iter().find(|r| r.name == name)
}

/// Ruta encontrada para una URL, con sus parámetros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
  pub route: &'static Route,
  pub params: BTreeMap<String, String>,
  /// Ruta completa pedida (con query), para volver tras el login.
  pub full_path: String,
}

fn segmentos(path: &str) -> Vec<&str> {
  path.split('/').filter(|s| !s.is_empty()).collect()
}

fn encaja(patron: &str, path: &str) -> Option<BTreeMap<String, String>> {
  let (p, s) = (segmentos(patron), segmentos(path));
  if p.len() != s.len() {
    return None;
  }
  let mut params = BTreeMap::new();
  for (pp, sp) in p.iter().zip(s.iter()) {
    match pp.strip_prefix(':') {
      Some(nombre) => {
        params.insert(nombre.to_string(), sp.to_string());
      }
      None if pp == sp => {}
      None => return None,
    }
  }
  Some(params)
}

/// Busca la ruta de una URL. Se ignoran la query y la barra final.
pub fn resolve(full_path: &str) -> Option<RouteMatch> {
  let path = full_path.split(['?', '#']).next().unwrap_or("");
  ROUTES.iter().find_map(|route| {
                 encaja(route.path, path).map(|params| RouteMatch { route,
                                                                    params,
                                                                    full_path: full_path.to_string() })
               })
}

/// URL de una ruta con nombre, sustituyendo sus parámetros.
pub fn href(name: &str, params: &[(&str, &str)]) -> Option<String> {
  let route = route(name)?;
  let mut out = Vec::new();
  for seg in segmentos(route.path) {
    match seg.strip_prefix(':') {
      Some(p) => out.push(params.iter().find(|(k, _)| *k == p).map(|(_, v)| *v)?),
      None => out.push(seg),
    }
  }
  Some(format!("/{}", out.join("/")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
  Allow,
  /// Ir al login y volver después a `redirect`.
  RedirectToLogin { redirect: String },
  /// Navegación cancelada; mostrar `alert`.
  Blocked { alert: String },
}

impl GuardDecision {
  /// URL del login con la vuelta a la página pedida.
  pub fn login_url(&self) -> Option<String> {
    match self {
      GuardDecision::RedirectToLogin { redirect } => Some(format!("/login?redirect={}", redirect)),
      _ => None,
    }
  }
}

pub fn guard(target: &RouteMatch, auth: &AuthState) -> GuardDecision {
  let route = target.route;
  if (route.requires_auth || route.requires_admin) && !auth.is_logged_in {
    return GuardDecision::RedirectToLogin { redirect: target.full_path.clone() };
  }
  if route.requires_admin && !auth.is_admin() {
    log::info!("Acceso denegado a {} para {}", route.name, auth.email());
    return GuardDecision::Blocked { alert: ADMIN_ALERT.to_string() };
  }
  GuardDecision::Allow
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resuelve_rutas_con_parametros() {
    let m = resolve("/caballos/abc123/pedigri/nuevo").unwrap();
    assert_eq!(m.route.name, "pedigri-nuevo");
    assert_eq!(m.params.get("id").map(String::as_str), Some("abc123"));

    assert_eq!(resolve("/").unwrap().route.name, "caballos");
    assert_eq!(resolve("/noticias/").unwrap().route.name, "noticias");
    assert_eq!(resolve("/noticias/nueva?x=1").unwrap().route.name, "noticia-nueva");
    assert!(resolve("/caballos/abc/otra").is_none());
  }

  #[test]
  fn nombres_unicos() {
    let mut nombres: Vec<&str> = routes().iter().map(|r| r.name).collect();
    nombres.sort();
    nombres.dedup();
    assert_eq!(nombres.len(), routes().len());
  }

  #[test]
  fn href_sustituye_parametros() {
    assert_eq!(href("caballo-editar", &[("id", "x1")]).as_deref(), Some("/caballos/x1/editar"));
    assert_eq!(href("caballos", &[]).as_deref(), Some("/"));
    assert!(href("caballo-editar", &[]).is_none());
    assert!(href("inexistente", &[]).is_none());
  }

  #[test]
  fn guarda_sin_sesion_redirige() {
    let m = resolve("/caballos/nuevo").unwrap();
    let d = guard(&m, &AuthState::default());
    assert_eq!(d, GuardDecision::RedirectToLogin { redirect: "/caballos/nuevo".into() });
    assert_eq!(d.login_url().as_deref(), Some("/login?redirect=/caballos/nuevo"));
    assert_eq!(guard(&resolve("/").unwrap(), &AuthState::default()), GuardDecision::Allow);
  }
}
