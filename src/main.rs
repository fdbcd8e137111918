use std::fmt::Display;
use std::io::{self, Write};

use cuadra_domain::Entidad;
use cuadra_stores::{guard, resolve, AuthStore, CaballosSource, ContentKey, GuardDecision, ListSource, ListStore, NoticiasSource, RemoveOutcome, StoresConfig};

/// Menú interactivo para navegar por la cuadra con el almacenamiento que
/// indique el entorno (`CUADRA_BACKEND`, memoria por defecto).
///
/// Opciones soportadas:
/// 1) Listado de caballos
/// 2) Listado de noticias
/// 3) Iniciar sesión
/// 4) Cerrar sesión
/// 5) Comprobar acceso a una ruta
/// 6) Salir
#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let (store, session) = cuadra_persistence::new_store_from_env().await?;
  let config = StoresConfig::from_env();

  let auth = AuthStore::new(store.clone(), session);
  auth.init_from_persisted_session();
  let caballos = ListStore::new(CaballosSource::new(store.clone()), &config);
  let noticias = ListStore::new(NoticiasSource::new(store), &config);

  loop {
    let estado = auth.snapshot();
    println!("\n== Cuadra ==");
    if estado.is_logged_in {
      println!("Sesión: {} ({})", estado.email(), estado.role());
    } else {
      println!("Sin sesión");
    }
    println!("1) Caballos");
    println!("2) Noticias");
    println!("3) Iniciar sesión");
    println!("4) Cerrar sesión");
    println!("5) Comprobar acceso a una ruta");
    println!("6) Salir");

    let choice = prompt("Elige una opción: ")?;
    match choice.trim() {
      "1" => listado("Caballos", &caballos).await?,
      "2" => listado("Noticias", &noticias).await?,
      "3" => {
        let email = prompt("Email: ")?;
        let password = prompt("Contraseña: ")?;
        match auth.login(email.trim(), password.trim()).await {
          Ok(sesion) => println!("Bienvenido, {}", sesion.usuario.nombre),
          Err(e) => eprintln!("Error iniciando sesión: {}", e),
        }
      }
      "4" => {
        auth.logout();
        println!("Sesión cerrada");
      }
      "5" => {
        let path = prompt("Ruta (ej: /caballos/nuevo): ")?;
        match resolve(path.trim()) {
          None => eprintln!("Ruta desconocida: {}", path.trim()),
          Some(destino) => match guard(&destino, &auth.snapshot()) {
            GuardDecision::Allow => println!("Acceso permitido a '{}' {:?}", destino.route.name, destino.params),
            decision @ GuardDecision::RedirectToLogin { .. } => {
              println!("Hace falta iniciar sesión: {}", decision.login_url().unwrap_or_default())
            }
            GuardDecision::Blocked { alert } => println!("{}", alert),
          },
        }
      }
      "6" => {
        println!("Saliendo...");
        break;
      }
      other => println!("Opción inválida: {}", other),
    }
  }

  Ok(())
}

/// Submenú común a los dos listados.
async fn listado<S>(titulo: &str, lista: &ListStore<S>) -> io::Result<()>
  where S: ListSource,
        S::Item: Display
{
  lista.load().await;
  loop {
    mostrar(titulo, lista);
    println!("n) Siguiente  p) Anterior  b) Buscar  d) Detalle  x) Eliminar  v) Volver");
    let choice = prompt("Elige una opción: ")?;
    match choice.trim() {
      "n" => {
        if !lista.go_next_directional() {
          println!("Ya estás en la última página");
        }
      }
      "p" => {
        if !lista.go_prev_directional() {
          println!("Ya estás en la primera página");
        }
      }
      "b" => {
        let termino = prompt("Buscar (enter para todo): ")?;
        lista.set_search_term(&termino);
        lista.search().await;
      }
      "d" => {
        let id = prompt("Id: ")?;
        lista.toggle_expanded(id.trim());
      }
      "x" => {
        let id = prompt("Id a eliminar: ")?;
        let confirmar = |mensaje: &str| {
          prompt(&format!("{} escribir 'si' para confirmar: ", mensaje)).map(|r| matches!(r.trim().to_lowercase().as_str(), "si" | "sí" | "yes"))
                                                                         .unwrap_or(false)
        };
        match lista.remove(id.trim(), &confirmar).await {
          RemoveOutcome::Removed => println!("Eliminado: {}", id.trim()),
          RemoveOutcome::Cancelled => println!("Borrado cancelado"),
          RemoveOutcome::Failed(e) => eprintln!("Error eliminando: {}", e),
        }
      }
      "v" => return Ok(()),
      other => println!("Opción inválida: {}", other),
    }
  }
}

fn mostrar<S>(titulo: &str, lista: &ListStore<S>)
  where S: ListSource,
        S::Item: Display
{
  println!("\n== {} ==", titulo);
  if let Some(error) = lista.error() {
    eprintln!("Error: {}", error);
    if lista.is_admin_required_error() {
      eprintln!("(inicia sesión como administrador)");
    }
  }
  match lista.content_key() {
    ContentKey::Loading => println!("Cargando..."),
    ContentKey::Error => {}
    ContentKey::Empty => println!("No hay resultados"),
    ContentKey::Page(_) => {
      let expandido = lista.expanded_id();
      for item in lista.visible_items() {
        let imagenes = lista.images_for(item.id()).map(|v| v.len()).unwrap_or(0);
        println!("{} | {} | {} imágenes", item.id(), item, imagenes);
        if expandido.as_deref() == Some(item.id()) {
          println!("    (detalle abierto)");
        }
      }
      println!("Página {} de {}", lista.current_page(), lista.total_pages());
    }
  }
}

fn prompt(msg: &str) -> io::Result<String> {
  print!("{}", msg);
  io::stdout().flush()?;
  let mut s = String::new();
  io::stdin().read_line(&mut s)?;
  Ok(s)
}
