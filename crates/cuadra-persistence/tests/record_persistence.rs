use cuadra_persistence::DieselRecordStore;
use registro::{FileUpload, Filter, JsonMap, ListOptions, RecordPayload, RecordStore, StoreError};
use serde_json::json;
use uuid::Uuid;

fn temp_db() -> String {
  // Fichero temporal: las bases en memoria no se comparten entre conexiones del pool.
  let tmp_path = std::env::temp_dir().join(format!("cuadra_test_{}.db", Uuid::new_v4()));
  tmp_path.to_str().unwrap().to_string()
}

fn payload(v: serde_json::Value) -> RecordPayload {
  let fields: JsonMap = v.as_object().cloned().unwrap();
  RecordPayload::new(fields)
}

#[tokio::test]
async fn ciclo_de_vida_de_un_registro() {
  let store = DieselRecordStore::new(&temp_db()).expect("store");

  let creado = store.create("caballos", payload(json!({"nombre": "Lucero", "color": "castaño"}))).await.unwrap();
  assert_eq!(creado.id.len(), 15);
  assert_eq!(creado.created, creado.updated);

  let leido = store.get_one("caballos", &creado.id).await.unwrap();
  assert_eq!(leido.get_str("nombre"), Some("Lucero"));

  let editado = store.update("caballos", &creado.id, payload(json!({"color": "tordo"}))).await.unwrap();
  assert_eq!(editado.get_str("nombre"), Some("Lucero"));
  assert_eq!(editado.get_str("color"), Some("tordo"));
  assert!(editado.updated > editado.created);

  assert!(store.delete("caballos", &creado.id).await.unwrap());
  assert!(matches!(store.get_one("caballos", &creado.id).await, Err(StoreError::NotFound(_))));
  assert!(matches!(store.delete("caballos", &creado.id).await, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn listas_con_filtro_orden_y_expansion() {
  let store = DieselRecordStore::new(&temp_db()).expect("store");
  let padre = store.create("caballos", payload(json!({"nombre": "Sultán"}))).await.unwrap();
  let hija = store.create("caballos", payload(json!({"nombre": "Centella"}))).await.unwrap();
  store.create("pedigri",
               payload(json!({"id_caballo": &hija.id, "id_ascendiente": &padre.id, "tipo_relacion": "padre"})))
       .await
       .unwrap();

  let recientes = store.get_full_list("caballos", 200, &ListOptions::new().sort("-created")).await.unwrap();
  assert_eq!(recientes.iter().map(|r| r.id.clone()).collect::<Vec<_>>(), vec![hija.id.clone(), padre.id.clone()]);

  let buscados = store.get_full_list("caballos", 200, &ListOptions::new().filter(Filter::contains("nombre", "cent")))
                      .await
                      .unwrap();
  assert_eq!(buscados.len(), 1);

  let opts = ListOptions::new().filter(Filter::eq("id_caballo", &hija.id)).expand("id_ascendiente");
  let relaciones = store.get_full_list("pedigri", 200, &opts).await.unwrap();
  assert_eq!(relaciones[0].expand["id_ascendiente"]["nombre"], json!("Sultán"));

  assert_eq!(store.get_full_list("caballos", 1, &ListOptions::new()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn ficheros_se_guardan_por_nombre() {
  let store = DieselRecordStore::new(&temp_db()).expect("store");
  let p = payload(json!({"id_caballo": "c1"})).with_file(FileUpload { field: "url".into(),
                                                                       file_name: "foto.jpg".into(),
                                                                       bytes: vec![1, 2] });
  let r = store.create("imagenes", p).await.unwrap();
  assert_eq!(r.get_str("url"), Some("foto.jpg"));
}

#[tokio::test]
async fn autenticacion_y_contrasenas() {
  let store = DieselRecordStore::new(&temp_db()).expect("store");
  let alta = json!({"email": "ana@cuadra.es", "rol": "admin", "password": "clave123", "passwordConfirm": "clave123"});
  let ana = store.create("users", payload(alta.clone())).await.unwrap();
  assert!(ana.data.get("password").is_none());

  assert!(matches!(store.create("users", payload(alta)).await, Err(StoreError::BadRequest(_))));

  let auth = store.auth_with_password("users", "ana@cuadra.es", "clave123").await.unwrap();
  assert_eq!(auth.record.id, ana.id);
  assert!(registro::token::token_is_valid(&auth.token));

  let err = store.auth_with_password("users", "ana@cuadra.es", "otra").await.unwrap_err();
  assert_eq!(err, StoreError::BadRequest("Failed to authenticate.".into()));

  store.update("users", &ana.id, payload(json!({"nombre": "Ana"}))).await.unwrap();
  assert!(store.auth_with_password("users", "ana@cuadra.es", "clave123").await.is_ok());
}

#[tokio::test]
async fn los_datos_sobreviven_a_reabrir() {
  let url = temp_db();
  let id = {
    let store = DieselRecordStore::new(&url).expect("store");
    store.create("noticias", payload(json!({"titulo": "Hola"}))).await.unwrap().id
  };
  let store = DieselRecordStore::new(&url).expect("reabrir");
  assert_eq!(store.get_one("noticias", &id).await.unwrap().get_str("titulo"), Some("Hola"));
}
