use crate::schema;
use crate::schema::records::dsl;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DieselError;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use registro::filter::{apply_query, expand_fields};
use registro::stubs::new_record_id;
use registro::token::{hash_password, issue_token};
use registro::validation::{check_unique_email, take_password};
use registro::{format_timestamp, parse_timestamp, AuthData, JsonMap, ListOptions, Record, RecordPayload, RecordStore, Result,
               StoreError};
use std::sync::{Arc, Mutex};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// `RecordStore` sobre SQLite. Las consultas son síncronas y se ejecutan
/// en el pool de bloqueo de tokio.
pub struct DieselRecordStore {
  pool: Arc<DbPool>,
  last_created: Mutex<DateTime<Utc>>,
  secret: String,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::records)]
struct RecordRow {
  pub id: String,
  pub collection: String,
  pub created: String,
  pub updated: String,
  pub data: String,
  pub password_hash: Option<String>,
}

impl RecordRow {
  fn from_record(record: &Record, password_hash: Option<String>) -> Result<Self> {
    Ok(Self { id: record.id.clone(),
              collection: record.collection.clone(),
              created: format_timestamp(&record.created),
              updated: format_timestamp(&record.updated),
              data: serde_json::to_string(&record.data)?,
              password_hash })
  }

  fn into_record(self) -> Result<Record> {
    let ts = |s: &str| parse_timestamp(s).ok_or_else(|| StoreError::Storage(format!("fecha inválida en {}: {}", self.id, s)));
    let created = ts(&self.created)?;
    let updated = ts(&self.updated)?;
    let data: JsonMap = serde_json::from_str(&self.data)?;
    Ok(Record { id: self.id,
                collection: self.collection,
                created,
                updated,
                data,
                expand: JsonMap::new() })
  }
}

fn map_db_err<T>(res: std::result::Result<T, DieselError>) -> Result<T> {
  res.map_err(|e| StoreError::Storage(format!("db: {}", e)))
}

fn not_found(collection: &str, id: &str) -> StoreError {
  StoreError::NotFound(format!("{} {}", collection, id))
}

fn load_collection(conn: &mut SqliteConnection, collection: &str) -> Result<Vec<RecordRow>> {
  map_db_err(dsl::records.filter(dsl::collection.eq(collection)).order(dsl::created.asc()).load::<RecordRow>(conn))
}

fn load_one(conn: &mut SqliteConnection, collection: &str, id: &str) -> Result<RecordRow> {
  map_db_err(dsl::records.filter(dsl::collection.eq(collection))
                         .filter(dsl::id.eq(id))
                         .first::<RecordRow>(conn)
                         .optional())?
    .ok_or_else(|| not_found(collection, id))
}

fn records_of(rows: Vec<RecordRow>) -> Result<Vec<Record>> {
  rows.into_iter().map(RecordRow::into_record).collect()
}

impl DieselRecordStore {
  /// Abre (o crea) la base de datos y aplica las migraciones pendientes.
  pub fn new(database_url: &str) -> Result<Self> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder().max_size(4)
                              .build(manager)
                              .map_err(|e| StoreError::Storage(format!("no se pudo crear el pool de conexiones: {}", e)))?;
    {
      let mut c = pool.get().map_err(|e| StoreError::Storage(format!("pool: {}", e)))?;
      let _ = diesel::sql_query("PRAGMA journal_mode = WAL;").execute(&mut c);
      let _ = diesel::sql_query("PRAGMA busy_timeout = 5000;").execute(&mut c);
      c.run_pending_migrations(MIGRATIONS)
       .map_err(|e| StoreError::Storage(format!("migraciones: {}", e)))?;
    }
    log::info!("Base de datos SQLite abierta en {}", database_url);
    Ok(Self { pool: Arc::new(pool),
              last_created: Mutex::new(DateTime::<Utc>::MIN_UTC),
              secret: new_record_id() })
  }

  /// Ejecuta `f` con una conexión del pool fuera del hilo asíncrono.
  async fn run<T, F>(&self, f: F) -> Result<T>
    where T: Send + 'static,
          F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static
  {
    let pool = self.pool.clone();
    tokio::task::spawn_blocking(move || {
      let mut conn = pool.get().map_err(|e| StoreError::Storage(format!("pool: {}", e)))?;
      f(&mut *conn)
    }).await
      .map_err(|e| StoreError::Storage(format!("tarea de base de datos: {}", e)))?
  }

  fn next_timestamp(&self) -> Result<DateTime<Utc>> {
    let mut last = self.last_created
                       .lock()
                       .map_err(|e| StoreError::Storage(format!("mutex poisoned: {:?}", e)))?;
    let mut now = Utc::now();
    if now <= *last {
      now = *last + Duration::microseconds(1);
    }
    *last = now;
    Ok(now)
  }
}

#[async_trait]
impl RecordStore for DieselRecordStore {
  async fn create(&self, collection: &str, payload: RecordPayload) -> Result<Record> {
    let id = new_record_id();
    let mut fields = payload.stored_fields();
    let hash = take_password(&id, &mut fields)?;
    let created = self.next_timestamp()?;
    let record = Record { id,
                          collection: collection.to_string(),
                          created,
                          updated: created,
                          data: fields,
                          expand: JsonMap::new() };
    self.run(move |conn| {
          if record.data.contains_key("email") {
            let existing = records_of(load_collection(conn, &record.collection)?)?;
            check_unique_email(&existing, record.data.get("email"), &record.id)?;
          }
          let row = RecordRow::from_record(&record, hash)?;
          map_db_err(diesel::insert_into(dsl::records).values(&row).execute(conn))?;
          Ok(record)
        })
        .await
  }

  async fn get_one(&self, collection: &str, id: &str) -> Result<Record> {
    let (collection, id) = (collection.to_string(), id.to_string());
    self.run(move |conn| load_one(conn, &collection, &id)?.into_record()).await
  }

  async fn get_full_list(&self, collection: &str, max_count: usize, options: &ListOptions) -> Result<Vec<Record>> {
    let collection = collection.to_string();
    let options = options.clone();
    self.run(move |conn| {
          let all = records_of(load_collection(conn, &collection)?)?;
          let mut out = apply_query(all, max_count, &options)?;
          let expand = expand_fields(&options);
          for r in out.iter_mut() {
            for field in &expand {
              let target = match r.get_str(field) {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => continue,
              };
              let found = map_db_err(dsl::records.filter(dsl::id.eq(&target)).first::<RecordRow>(conn).optional())?;
              if let Some(row) = found {
                r.expand.insert(field.clone(), row.into_record()?.to_json());
              }
            }
          }
          Ok(out)
        })
        .await
  }

  async fn update(&self, collection: &str, id: &str, payload: RecordPayload) -> Result<Record> {
    let mut fields = payload.stored_fields();
    let hash = take_password(id, &mut fields)?;
    let updated = self.next_timestamp()?;
    let (collection, id) = (collection.to_string(), id.to_string());
    self.run(move |conn| {
            let row = load_one(conn, &collection, &id)?;
            let password_hash = hash.or_else(|| row.password_hash.clone());
            let mut record = row.into_record()?;
            if fields.contains_key("email") {
              let existing = records_of(load_collection(conn, &collection)?)?;
              check_unique_email(&existing, fields.get("email"), &id)?;
            }
            for (k, v) in fields {
              record.data.insert(k, v);
            }
            record.updated = updated;
            let data = serde_json::to_string(&record.data)?;
            map_db_err(diesel::update(dsl::records.filter(dsl::collection.eq(&collection)).filter(dsl::id.eq(&id)))
                         .set((dsl::data.eq(data),
                               dsl::updated.eq(format_timestamp(&updated)),
                               dsl::password_hash.eq(password_hash)))
                         .execute(conn))?;
            Ok(record)
        })
        .await
  }

  async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
    let (collection, id) = (collection.to_string(), id.to_string());
    self.run(move |conn| {
          let n = map_db_err(diesel::delete(dsl::records.filter(dsl::collection.eq(&collection)).filter(dsl::id.eq(&id)))
                               .execute(conn))?;
          if n == 0 {
            return Err(not_found(&collection, &id));
          }
          Ok(true)
        })
        .await
  }

  async fn auth_with_password(&self, collection: &str, identity: &str, password: &str) -> Result<AuthData> {
    let (collection_s, identity, password) = (collection.to_string(), identity.to_string(), password.to_string());
    let record = self.run(move |conn| {
                       let failed = || StoreError::BadRequest("Failed to authenticate.".into());
                       for row in load_collection(conn, &collection_s)? {
                         let stored = row.password_hash.clone();
                         let record = row.into_record()?;
                         if record.get_str("email") != Some(identity.as_str()) {
                           continue;
                         }
                         return match stored {
                           Some(h) if h == hash_password(&record.id, &password) => Ok(record),
                           _ => Err(failed()),
                         };
                       }
                       Err(failed())
                     })
                     .await?;
    let token = issue_token(&record.id, collection, &self.secret);
    Ok(AuthData { token, record })
  }
}
