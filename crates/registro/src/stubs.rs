// Archivo: stubs.rs
// Propósito: implementación en memoria de `RecordStore` para pruebas, demos
// y el arranque sin servicio remoto.
//
// Imita las reglas del servicio: ids de 15 caracteres, `created`
// estrictamente creciente, contraseñas que nunca se devuelven y reglas de
// acceso por colección evaluadas contra la sesión adjunta.
use crate::domain::{AuthData, JsonMap, ListOptions, Record, RecordPayload};
use crate::errors::{Result, StoreError};
use crate::filter::{apply_query, expand_fields};
use crate::repository::{RecordStore, SessionProvider};
use crate::token::{hash_password, issue_token};
use crate::validation::{check_unique_email, take_password};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Mensaje del servicio cuando una operación exige rol de administrador.
pub const ADMIN_ONLY_MESSAGE: &str = "Only admins can perform this action.";
/// Mensaje del servicio cuando falta un token válido.
pub const AUTH_REQUIRED_MESSAGE: &str = "The request requires valid record authorization token to be set.";
/// Mensaje del servicio cuando el registro no es del usuario de la sesión.
pub const NOT_ALLOWED_MESSAGE: &str = "You are not allowed to perform this request.";

const ROL_ADMIN: &str = "admin";

/// Regla de escritura (create/update/delete) de una colección. La lectura
/// es siempre pública.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRule {
    Public,
    AuthenticatedWrite,
    AdminWrite,
    /// Alta pública; modificar o borrar sólo el propio registro o un
    /// administrador. El campo `rol` sólo lo fija un administrador.
    OwnerOrAdmin,
}

/// Genera un id con el formato del servicio (15 caracteres alfanuméricos).
pub fn new_record_id() -> String {
    Uuid::new_v4().simple().to_string()[..15].to_string()
}

// Repositorio en memoria (no durable)
pub struct InMemoryRecordStore {
    /// Registros por colección, en orden de inserción.
    collections: Mutex<HashMap<String, Vec<Record>>>,
    /// Hash de contraseña por id de registro.
    passwords: Mutex<HashMap<String, String>>,
    rules: HashMap<String, AccessRule>,
    session: Option<Arc<dyn SessionProvider>>,
    last_created: Mutex<DateTime<Utc>>,
    secret: String,
}

impl InMemoryRecordStore {
    /// Crea un almacén vacío sin reglas de acceso.
    pub fn new() -> Self {
        Self { collections: Mutex::new(HashMap::new()),
               passwords: Mutex::new(HashMap::new()),
               rules: HashMap::new(),
               session: None,
               last_created: Mutex::new(DateTime::<Utc>::MIN_UTC),
               secret: new_record_id() }
    }

    /// Adjunta la sesión contra la que se evalúan las reglas.
    pub fn with_session(mut self, session: Arc<dyn SessionProvider>) -> Self {
        self.session = Some(session);
        self
    }

    /// Fija la regla de escritura de una colección.
    pub fn with_rule(mut self, collection: &str, rule: AccessRule) -> Self {
        self.rules.insert(collection.to_string(), rule);
        self
    }

    /// Número de registros de una colección.
    pub fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.lock(&self.collections)?.get(collection).map(Vec::len).unwrap_or(0))
    }

    /// Helper para mapear `Mutex::lock()` en un `Result` con
    /// `StoreError::Storage`.
    fn lock<'a, T>(&'a self, m: &'a Mutex<T>) -> Result<MutexGuard<'a, T>> {
        m.lock().map_err(|e| StoreError::Storage(format!("mutex poisoned: {:?}", e)))
    }

    fn next_timestamp(&self) -> Result<DateTime<Utc>> {
        let mut last = self.lock(&self.last_created)?;
        let mut now = Utc::now();
        if now <= *last {
            now = *last + Duration::microseconds(1);
        }
        *last = now;
        Ok(now)
    }

    fn rule(&self, collection: &str) -> AccessRule {
        self.rules.get(collection).copied().unwrap_or(AccessRule::Public)
    }

    /// Usuario de la sesión adjunta, si el token sigue siendo válido.
    fn session_user(&self) -> Option<Record> {
        self.session.as_ref().filter(|s| s.is_valid()).and_then(|s| s.current())
    }

    fn session_is_admin(&self) -> bool {
        self.session_user().map(|u| u.get_str("rol") == Some(ROL_ADMIN)).unwrap_or(false)
    }

    /// `target` es el id del registro afectado (`None` en un alta).
    fn check_write(&self, collection: &str, target: Option<&str>) -> Result<()> {
        let rule = self.rule(collection);
        match (rule, target) {
            (AccessRule::Public, _) | (AccessRule::OwnerOrAdmin, None) => return Ok(()),
            _ => {}
        }
        let user = self.session_user().ok_or_else(|| StoreError::Forbidden(AUTH_REQUIRED_MESSAGE.into()))?;
        let is_admin = user.get_str("rol") == Some(ROL_ADMIN);
        match rule {
            AccessRule::AdminWrite if !is_admin => Err(StoreError::Forbidden(ADMIN_ONLY_MESSAGE.into())),
            AccessRule::OwnerOrAdmin if !is_admin && target != Some(user.id.as_str()) => {
                Err(StoreError::Forbidden(NOT_ALLOWED_MESSAGE.into()))
            }
            _ => Ok(()),
        }
    }

    /// Con `OwnerOrAdmin`, sólo un administrador da de alta otro
    /// administrador o cambia el `rol` de un registro existente.
    fn check_role(&self, collection: &str, fields: &JsonMap, current: Option<&Record>, is_admin: bool) -> Result<()> {
        if self.rule(collection) != AccessRule::OwnerOrAdmin || is_admin {
            return Ok(());
        }
        let requested = match fields.get("rol") {
            Some(v) => v.as_str().unwrap_or_default(),
            None => return Ok(()),
        };
        let allowed = match current {
            Some(record) => record.get_str("rol").unwrap_or_default() == requested,
            None => requested != ROL_ADMIN,
        };
        if allowed {
            Ok(())
        } else {
            Err(StoreError::Forbidden(ADMIN_ONLY_MESSAGE.into()))
        }
    }

    fn resolve_expand(all: &HashMap<String, Vec<Record>>, record: &mut Record, fields: &[String]) {
        for field in fields {
            let target = match record.data.get(field).and_then(|v| v.as_str()) {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => continue,
            };
            if let Some(found) = all.values().flatten().find(|r| r.id == target) {
                record.expand.insert(field.clone(), found.to_json());
            }
        }
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(&self, collection: &str, payload: RecordPayload) -> Result<Record> {
        self.check_write(collection, None)?;
        let id = new_record_id();
        let mut fields = payload.stored_fields();
        self.check_role(collection, &fields, None, self.session_is_admin())?;
        let hash = take_password(&id, &mut fields)?;
        let created = self.next_timestamp()?;
        let mut collections = self.lock(&self.collections)?;
        let list = collections.entry(collection.to_string()).or_default();
        check_unique_email(list, fields.get("email"), &id)?;
        let record = Record { id: id.clone(),
                              collection: collection.to_string(),
                              created,
                              updated: created,
                              data: fields,
                              expand: JsonMap::new() };
        list.push(record.clone());
        if let Some(h) = hash {
            self.lock(&self.passwords)?.insert(id, h);
        }
        Ok(record)
    }

    async fn get_one(&self, collection: &str, id: &str) -> Result<Record> {
        let collections = self.lock(&self.collections)?;
        collections.get(collection)
                   .and_then(|list| list.iter().find(|r| r.id == id))
                   .cloned()
                   .ok_or_else(|| StoreError::NotFound(format!("{} {}", collection, id)))
    }

    async fn get_full_list(&self, collection: &str, max_count: usize, options: &ListOptions) -> Result<Vec<Record>> {
        let collections = self.lock(&self.collections)?;
        let all = collections.get(collection).cloned().unwrap_or_default();
        let mut out = apply_query(all, max_count, options)?;
        let expand = expand_fields(options);
        if !expand.is_empty() {
            for r in out.iter_mut() {
                Self::resolve_expand(&collections, r, &expand);
            }
        }
        Ok(out)
    }

    async fn update(&self, collection: &str, id: &str, payload: RecordPayload) -> Result<Record> {
        self.check_write(collection, Some(id))?;
        let is_admin = self.session_is_admin();
        let mut fields = payload.stored_fields();
        let hash = take_password(id, &mut fields)?;
        let updated = self.next_timestamp()?;
        let mut collections = self.lock(&self.collections)?;
        let list = collections.get_mut(collection)
                              .ok_or_else(|| StoreError::NotFound(format!("{} {}", collection, id)))?;
        check_unique_email(list, fields.get("email"), id)?;
        let record = list.iter_mut()
                         .find(|r| r.id == id)
                         .ok_or_else(|| StoreError::NotFound(format!("{} {}", collection, id)))?;
        self.check_role(collection, &fields, Some(&*record), is_admin)?;
        for (k, v) in fields {
            record.data.insert(k, v);
        }
        record.updated = updated;
        let out = record.clone();
        if let Some(h) = hash {
            self.lock(&self.passwords)?.insert(id.to_string(), h);
        }
        Ok(out)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        self.check_write(collection, Some(id))?;
        let mut collections = self.lock(&self.collections)?;
        let list = collections.get_mut(collection)
                              .ok_or_else(|| StoreError::NotFound(format!("{} {}", collection, id)))?;
        let before = list.len();
        list.retain(|r| r.id != id);
        if list.len() == before {
            return Err(StoreError::NotFound(format!("{} {}", collection, id)));
        }
        drop(collections);
        self.lock(&self.passwords)?.remove(id);
        Ok(true)
    }

    async fn auth_with_password(&self, collection: &str, identity: &str, password: &str) -> Result<AuthData> {
        let failed = || StoreError::BadRequest("Failed to authenticate.".into());
        let record = {
            let collections = self.lock(&self.collections)?;
            collections.get(collection)
                       .and_then(|list| list.iter().find(|r| r.get_str("email") == Some(identity)))
                       .cloned()
                       .ok_or_else(failed)?
        };
        let stored = self.lock(&self.passwords)?.get(&record.id).cloned().ok_or_else(failed)?;
        if stored != hash_password(&record.id, password) {
            return Err(failed());
        }
        let token = issue_token(&record.id, collection, &self.secret);
        Ok(AuthData { token, record })
    }
}
