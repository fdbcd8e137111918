use cuadra_domain::*;
use registro::{InMemoryRecordStore, RecordStore, SessionProvider, SessionStore, StoreError, ADMIN_ONLY_MESSAGE, AUTH_REQUIRED_MESSAGE,
               NOT_ALLOWED_MESSAGE};
use std::sync::Arc;

fn almacen() -> Arc<dyn RecordStore> {
  Arc::new(InMemoryRecordStore::new())
}

async fn cuadra_de_ejemplo() -> (Arc<dyn RecordStore>, Arc<dyn SessionProvider>) {
  let session: Arc<dyn SessionProvider> = Arc::new(SessionStore::new());
  let store = DomainStubs::sample_store(session.clone()).await.expect("sample store");
  (Arc::new(store), session)
}

#[tokio::test]
async fn caballo_requiere_nombre_y_lista_los_recientes_primero() {
  let svc = CaballoService::new(almacen());

  let err = svc.create(&DatosCaballo::default()).await.unwrap_err();
  assert_eq!(err, DomainError::ValidationError("El campo 'nombre' es obligatorio.".into()));

  svc.create(&DatosCaballo::con_nombre("Primero")).await.unwrap();
  let segundo = svc.create(&DatosCaballo::con_nombre("Segundo")).await.unwrap();

  let lista = svc.lista().await.unwrap();
  assert_eq!(lista.iter().map(|c| c.nombre.as_str()).collect::<Vec<_>>(), vec!["Segundo", "Primero"]);
  assert_eq!(svc.por_id(&segundo.id).await.unwrap(), segundo);
  assert!(segundo.fecha_nacimiento.is_none());

  let encontrados = svc.buscar_por_nombre("prim").await.unwrap();
  assert_eq!(encontrados.len(), 1);

  assert!(svc.delete(&segundo.id).await.unwrap());
  assert!(matches!(svc.por_id(&segundo.id).await, Err(DomainError::Store(StoreError::NotFound(_)))));
}

#[tokio::test]
async fn ascendientes_se_expanden_si_estan_en_la_cuadra() {
  let (store, _) = cuadra_de_ejemplo().await;
  let svc = CaballoService::new(store);

  let centella = svc.buscar_por_nombre("Centella").await.unwrap().remove(0);
  let arbol = svc.con_ascendientes(&centella.id).await.unwrap();
  assert_eq!(arbol.caballo.nombre, "Centella");
  assert_eq!(arbol.ascendientes.len(), 2);
  let padre = arbol.ascendientes.iter().find(|a| a.tipo_relacion == "padre").unwrap();
  assert_eq!(padre.ascendiente.as_ref().map(|c| c.nombre.as_str()), Some("Lucero del Alba"));

  let lucero = svc.buscar_por_nombre("Lucero").await.unwrap().remove(0);
  let arbol = svc.con_ascendientes(&lucero.id).await.unwrap();
  assert_eq!(arbol.ascendientes[0].nombre_ascendiente, "Gran Señor");
  assert!(arbol.ascendientes[0].ascendiente.is_none());
}

#[tokio::test]
async fn contenido_de_ejemplo_exige_administrador() {
  let (store, session) = cuadra_de_ejemplo().await;
  let caballos = CaballoService::new(store.clone());
  let usuarios = UserService::new(store, session);

  assert_eq!(caballos.lista().await.unwrap().len(), 12);

  usuarios.login(SOCIO_EMAIL, SOCIO_PASSWORD).await.unwrap();
  let err = caballos.create(&DatosCaballo::con_nombre("Intruso")).await.unwrap_err();
  assert_eq!(err, DomainError::Store(StoreError::Forbidden(ADMIN_ONLY_MESSAGE.into())));

  usuarios.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
  assert!(caballos.create(&DatosCaballo::con_nombre("Nuevo")).await.is_ok());
}

#[tokio::test]
async fn carrera_fija_condiciones_y_valida_edicion() {
  let svc = CarreraService::new(almacen());
  let datos = DatosCarrera { nombre: "Derby".into(),
                             fecha: "2025-05-01".into(),
                             distancia: 2000,
                             condiciones: None,
                             lugar: "Madrid".into() };

  let err = svc.create(&DatosCarrera { distancia: 0, ..datos.clone() }).await.unwrap_err();
  assert_eq!(err.to_string(), "Error de validación: Debes pasar al menos nombre, fecha, distancia y lugar");

  let carrera = svc.create(&datos).await.unwrap();
  assert_eq!(carrera.condiciones, "-");
  assert_eq!(carrera.distancia, 2000);

  let err = svc.editar(&carrera.id, &datos).await.unwrap_err();
  assert_eq!(err, DomainError::ValidationError("Debes proporcionar todos los campos de la carrera".into()));
  let err = svc.editar("", &datos).await.unwrap_err();
  assert_eq!(err, DomainError::ValidationError("Debes proporcionar un ID de carrera válido".into()));

  let editada = svc.editar(&carrera.id,
                           &DatosCarrera { condiciones: Some("Pesado".into()),
                                           ..datos })
                   .await
                   .unwrap();
  assert_eq!(editada.condiciones, "Pesado");
  assert_eq!(svc.buscar("der").await.unwrap().len(), 1);
}

#[tokio::test]
async fn participaciones_se_filtran_por_caballo_y_carrera() {
  let svc = ParticipacionService::new(almacen());
  for (caballo, carrera, posicion) in [("c1", "r1", 1), ("c1", "r2", 3), ("c2", "r1", 2)] {
    svc.create(&DatosParticipacion { id_caballo: caballo.into(),
                                     id_carrera: carrera.into(),
                                     posicion,
                                     jinete: None })
       .await
       .unwrap();
  }
  assert_eq!(svc.todas().await.unwrap().len(), 3);
  assert_eq!(svc.filtrar(Some("c1"), None).await.unwrap().len(), 2);
  assert_eq!(svc.filtrar(None, Some("r1")).await.unwrap().len(), 2);
  let una = svc.filtrar(Some("c1"), Some("r2")).await.unwrap();
  assert_eq!(una.len(), 1);
  assert_eq!(una[0].posicion, 3);
  assert_eq!(una[0].jinete, "-");

  let err = svc.create(&DatosParticipacion::default()).await.unwrap_err();
  assert_eq!(err, DomainError::ValidationError("Debes pasar al menos id_caballo, id_carrera y posicion".into()));
}

#[tokio::test]
async fn comentario_toma_el_usuario_de_la_sesion() {
  let store = almacen();
  let session: Arc<dyn SessionProvider> = Arc::new(SessionStore::new());
  let usuarios = UserService::new(store.clone(), session.clone());
  let svc = ComentarioService::new(store, session);

  let datos = DatosComentario { contenido: "  Gran carrera  ".into(),
                                id_noticia: "n1".into(),
                                ..DatosComentario::default() };
  let err = svc.create(&datos).await.unwrap_err();
  assert_eq!(err,
             DomainError::ValidationError("No hay usuario autenticado. Inicia sesión o pasa 'uid_usuario' explícitamente.".into()));

  let ana = usuarios.registrar("Ana", "ana@cuadra.es", "secreta1").await.unwrap();
  usuarios.login("ana@cuadra.es", "secreta1").await.unwrap();
  let comentario = svc.create(&datos).await.unwrap();
  assert_eq!(comentario.contenido, "Gran carrera");
  assert_eq!(comentario.uid_usuario, ana.id);
  assert!(!comentario.fecha.is_empty());

  let vacio = DatosComentario { contenido: "   ".into(),
                                ..datos.clone() };
  assert!(matches!(svc.create(&vacio).await, Err(DomainError::ValidationError(_))));

  assert_eq!(svc.lista(Some("n1")).await.unwrap().len(), 1);
  assert!(svc.lista(Some("otra")).await.unwrap().is_empty());
  assert_eq!(svc.todos().await.unwrap().len(), 1);

  let err = svc.editar(&comentario.id, &datos).await.unwrap_err();
  assert_eq!(err, DomainError::ValidationError("Debes proporcionar todos los campos del comentario a editar.".into()));
}

#[tokio::test]
async fn imagenes_exigen_fichero_y_guardan_su_nombre() {
  let svc = ImagenService::new(almacen());

  let sin_fichero = DatosImagen { id_caballo: "c1".into(),
                                  ..DatosImagen::default() };
  let err = svc.create_imagen(&sin_fichero).await.unwrap_err();
  assert_eq!(err, DomainError::ValidationError("Debes pasar al menos id_caballo y url (File)".into()));

  let imagen = svc.create_imagen(&DatosImagen { archivo: Some(Archivo::new("lucero.jpg", vec![1, 2, 3])),
                                                ..sin_fichero })
                  .await
                  .unwrap();
  assert_eq!(imagen.url, "lucero.jpg");
  assert_eq!(imagen.descripcion, "");
  assert_eq!(svc.por_caballo("c1").await.unwrap(), vec![imagen.clone()]);

  let principal = DatosImagenNoticia { id_noticia: "n1".into(),
                                       archivo: Some(Archivo::new("p.jpg", vec![0])),
                                       tipo: Some("principal".into()),
                                       ..DatosImagenNoticia::default() };
  svc.create_imagen_noticia(&principal).await.unwrap();
  let secundaria = svc.create_imagen_noticia(&DatosImagenNoticia { tipo: None,
                                                                   ..principal })
                      .await
                      .unwrap();
  assert_eq!(secundaria.tipo, "secundaria");
  let tipos: Vec<String> = svc.por_noticia("n1").await.unwrap().into_iter().map(|i| i.tipo).collect();
  assert_eq!(tipos, vec!["secundaria", "principal"]);

  let editada = svc.update_imagen(&imagen.id,
                                  &DatosImagen { descripcion: Some("En la pista".into()),
                                                 ..DatosImagen::default() })
                   .await
                   .unwrap();
  assert_eq!(editada.url, "lucero.jpg");
  assert_eq!(editada.descripcion, "En la pista");
  assert!(svc.update_imagen("", &DatosImagen::default()).await.is_err());
}

#[tokio::test]
async fn noticia_usa_fecha_actual_por_defecto() {
  let svc = NoticiaService::new(almacen());
  let noticia = svc.create(&DatosNoticia::con_titulo("Presentación")).await.unwrap();
  assert!(noticia.fecha.starts_with(&ahora()[..4]));
  assert!(noticia.url_video.is_none());

  assert!(svc.create(&DatosNoticia::default()).await.is_err());

  let relacion = svc.create_noticia_caballo(&noticia.id, "c1").await.unwrap();
  assert_eq!(svc.noticia_caballo_por_id(&relacion.id).await.unwrap(), relacion);
  assert_eq!(svc.buscar_por_titulo("present").await.unwrap().len(), 1);
  assert!(svc.delete_noticia_caballo(&relacion.id).await.unwrap());
}

#[tokio::test]
async fn usuarios_registro_login_y_cambio_de_contrasena() {
  let store = almacen();
  let session: Arc<dyn SessionProvider> = Arc::new(SessionStore::new());
  let svc = UserService::new(store, session.clone());

  let ana = svc.registrar("Ana", "ana@cuadra.es", "secreta1").await.unwrap();
  assert_eq!(ana.rol.as_deref(), Some(ROL_USUARIO));
  assert!(!ana.es_admin());
  assert!(svc.actual().is_none());

  let sesion = svc.login("ana@cuadra.es", "secreta1").await.unwrap();
  assert_eq!(session.token(), Some(sesion.token));
  assert_eq!(svc.actual().map(|u| u.id), Some(ana.id.clone()));

  let cambios = CambiosUsuario { password: Some("nueva123".into()),
                                 ..CambiosUsuario::default() };
  svc.update(&ana.id, &cambios).await.unwrap();
  svc.logout();
  assert!(svc.actual().is_none());
  assert!(svc.login("ana@cuadra.es", "secreta1").await.is_err());
  assert!(svc.login("ana@cuadra.es", "nueva123").await.is_ok());

  assert_eq!(svc.todos().await.unwrap().len(), 1);
  assert!(svc.delete(&ana.id).await.unwrap());
}

#[tokio::test]
async fn contrasena_vacia_no_cambia_la_contrasena() {
  let store = almacen();
  let session: Arc<dyn SessionProvider> = Arc::new(SessionStore::new());
  let svc = UserService::new(store, session);
  let ana = svc.registrar("Ana", "ana@cuadra.es", "secreta1").await.unwrap();

  let cambios = CambiosUsuario { nombre: Some("Ana María".into()),
                                 password: Some(String::new()),
                                 ..CambiosUsuario::default() };
  let editada = svc.update(&ana.id, &cambios).await.unwrap();
  assert_eq!(editada.nombre, "Ana María");
  assert!(svc.login("ana@cuadra.es", "secreta1").await.is_ok());
}

#[tokio::test]
async fn usuarios_solo_los_edita_su_dueno_o_un_administrador() {
  let (store, session) = cuadra_de_ejemplo().await;
  let usuarios = UserService::new(store.clone(), session);
  let todos = usuarios.todos().await.unwrap();
  let id_de = |email: &str| todos.iter().find(|u| u.email == email).map(|u| u.id.clone()).unwrap();
  let socio = id_de(SOCIO_EMAIL);
  let admin = id_de(ADMIN_EMAIL);
  let ascenso = CambiosUsuario { rol: Some(ROL_ADMIN.into()),
                                 ..CambiosUsuario::default() };

  // Sin sesión nadie se cambia el rol, pero el alta sigue abierta.
  let err = usuarios.update(&socio, &ascenso).await.unwrap_err();
  assert_eq!(err, DomainError::Store(StoreError::Forbidden(AUTH_REQUIRED_MESSAGE.into())));
  assert!(usuarios.registrar("Ana", "ana@cuadra.es", "secreta1").await.is_ok());

  usuarios.login(SOCIO_EMAIL, SOCIO_PASSWORD).await.unwrap();
  let nombre = CambiosUsuario { nombre: Some("Socio Fundador".into()),
                                ..CambiosUsuario::default() };
  assert_eq!(usuarios.update(&socio, &nombre).await.unwrap().nombre, "Socio Fundador");
  let err = usuarios.update(&socio, &ascenso).await.unwrap_err();
  assert_eq!(err, DomainError::Store(StoreError::Forbidden(ADMIN_ONLY_MESSAGE.into())));
  let err = usuarios.update(&admin, &nombre).await.unwrap_err();
  assert_eq!(err, DomainError::Store(StoreError::Forbidden(NOT_ALLOWED_MESSAGE.into())));
  assert!(usuarios.delete(&admin).await.is_err());

  // Sin ascenso, el socio sigue sin poder borrar caballos.
  let caballos = CaballoService::new(store);
  let primero = caballos.lista().await.unwrap()[0].id.clone();
  assert!(caballos.delete(&primero).await.is_err());

  usuarios.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
  assert_eq!(usuarios.update(&socio, &ascenso).await.unwrap().rol.as_deref(), Some(ROL_ADMIN));
}
