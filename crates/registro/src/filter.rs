// Archivo: filter.rs
// Propósito: lenguaje de filtros y ordenación de `get_full_list`.
//
// Filtros: `campo~"texto"` (subcadena, sin distinguir mayúsculas),
// `campo="valor"`, `campo!="valor"`, unidos con `&&`. Orden: campos
// separados por comas, con `-` delante para orden descendente.
use crate::domain::{ListOptions, Record};
use crate::errors::{Result, StoreError};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::fmt;

/// Operador de una condición.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Contains,
    Equals,
    NotEquals,
}

impl FilterOp {
    fn symbol(self) -> &'static str {
        match self {
            FilterOp::Contains => "~",
            FilterOp::Equals => "=",
            FilterOp::NotEquals => "!=",
        }
    }
}

/// Condición simple `campo op valor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

/// Filtro: conjunción de condiciones. Sin condiciones acepta todo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn contains(field: &str, value: &str) -> Self {
        Self::single(field, FilterOp::Contains, value)
    }

    pub fn eq(field: &str, value: &str) -> Self {
        Self::single(field, FilterOp::Equals, value)
    }

    pub fn not_eq(field: &str, value: &str) -> Self {
        Self::single(field, FilterOp::NotEquals, value)
    }

    fn single(field: &str, op: FilterOp, value: &str) -> Self {
        Self { conditions: vec![Condition { field: field.to_string(),
                                            op,
                                            value: value.to_string() }] }
    }

    /// Conjunción con otro filtro (`&&`).
    pub fn and(mut self, other: Filter) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Interpreta una cadena de filtro. Una cadena vacía es el filtro vacío.
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser { chars: input.chars().collect(),
                                  pos: 0 };
        let mut conditions = Vec::new();
        parser.skip_ws();
        if parser.at_end() {
            return Ok(Self { conditions });
        }
        loop {
            conditions.push(parser.condition()?);
            parser.skip_ws();
            if parser.at_end() {
                break;
            }
            parser.expect_str("&&")?;
        }
        Ok(Self { conditions })
    }

    /// Evalúa el filtro sobre un registro.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| condition_matches(c, record))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " && ")?;
            }
            write!(f, "{}{}\"{}\"", c.field, c.op.symbol(), escape(&c.value))?;
        }
        Ok(())
    }
}

impl From<Filter> for String {
    fn from(f: Filter) -> Self {
        f.to_string()
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn condition_matches(c: &Condition, record: &Record) -> bool {
    let texts = record.field(&c.field).map(|v| value_texts(&v)).unwrap_or_default();
    match c.op {
        FilterOp::Equals => texts.iter().any(|t| t == &c.value),
        FilterOp::NotEquals => !texts.iter().any(|t| t == &c.value),
        FilterOp::Contains => {
            let needle = c.value.to_lowercase();
            texts.iter().any(|t| t.to_lowercase().contains(&needle))
        }
    }
}

/// Representaciones de texto de un valor; los arrays aportan una por
/// elemento (relaciones múltiples).
fn value_texts(v: &JsonValue) -> Vec<String> {
    match v {
        JsonValue::Null => vec![String::new()],
        JsonValue::String(s) => vec![s.clone()],
        JsonValue::Number(n) => vec![n.to_string()],
        JsonValue::Bool(b) => vec![b.to_string()],
        JsonValue::Array(items) => items.iter().flat_map(value_texts).collect(),
        JsonValue::Object(_) => vec![v.to_string()],
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self, msg: &str) -> StoreError {
        StoreError::BadRequest(format!("filtro inválido en la posición {}: {}", self.pos, msg))
    }

    fn expect_str(&mut self, s: &str) -> Result<()> {
        for expected in s.chars() {
            if self.peek() != Some(expected) {
                return Err(self.error(&format!("se esperaba '{}'", s)));
            }
            self.pos += 1;
        }
        Ok(())
    }

    fn condition(&mut self) -> Result<Condition> {
        self.skip_ws();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '.') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("se esperaba un nombre de campo"));
        }
        let field: String = self.chars[start..self.pos].iter().collect();
        self.skip_ws();
        let op = match (self.peek(), self.chars.get(self.pos + 1).copied()) {
            (Some('!'), Some('=')) => {
                self.pos += 2;
                FilterOp::NotEquals
            }
            (Some('~'), _) => {
                self.pos += 1;
                FilterOp::Contains
            }
            (Some('='), _) => {
                self.pos += 1;
                FilterOp::Equals
            }
            _ => return Err(self.error("operador desconocido")),
        };
        self.skip_ws();
        let value = self.value()?;
        Ok(Condition { field, op, value })
    }

    fn value(&mut self) -> Result<String> {
        match self.peek() {
            Some('"') => {
                self.pos += 1;
                let mut out = String::new();
                loop {
                    match self.peek() {
                        None => return Err(self.error("cadena sin cerrar")),
                        Some('"') => {
                            self.pos += 1;
                            return Ok(out);
                        }
                        Some('\\') => {
                            self.pos += 1;
                            match self.peek() {
                                Some(c) => {
                                    out.push(c);
                                    self.pos += 1;
                                }
                                None => return Err(self.error("escape incompleto")),
                            }
                        }
                        Some(c) => {
                            out.push(c);
                            self.pos += 1;
                        }
                    }
                }
            }
            Some(_) => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '.' || c == '-' || c == '_') {
                    self.pos += 1;
                }
                if start == self.pos {
                    return Err(self.error("se esperaba un valor"));
                }
                Ok(self.chars[start..self.pos].iter().collect())
            }
            None => Err(self.error("se esperaba un valor")),
        }
    }
}

/// Clave de ordenación: campo y sentido.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

/// Interpreta `-created,nombre`.
pub fn parse_sort(input: &str) -> Result<Vec<SortKey>> {
    let mut keys = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (descending, field) = match part.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, part.strip_prefix('+').unwrap_or(part)),
        };
        if field.is_empty() || !field.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(StoreError::BadRequest(format!("orden inválido: '{}'", part)));
        }
        keys.push(SortKey { field: field.to_string(),
                            descending });
    }
    Ok(keys)
}

fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(JsonValue::Null), Some(JsonValue::Null)) => Ordering::Equal,
        (Some(JsonValue::Null), Some(_)) => Ordering::Less,
        (Some(_), Some(JsonValue::Null)) => Ordering::Greater,
        (Some(x), Some(y)) => value_texts(x).join(",").cmp(&value_texts(y).join(",")),
    }
}

/// Ordena los registros de forma estable según `keys`.
pub fn sort_records(records: &mut [Record], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    records.sort_by(|a, b| {
               for k in keys {
                   let ord = compare_values(a.field(&k.field).as_ref(), b.field(&k.field).as_ref());
                   let ord = if k.descending { ord.reverse() } else { ord };
                   if ord != Ordering::Equal {
                       return ord;
                   }
               }
               Ordering::Equal
           });
}

/// Aplica filtro, orden y límite de `ListOptions` a una colección ya
/// cargada. Lo usan los almacenamientos locales.
pub fn apply_query(records: Vec<Record>, max_count: usize, options: &ListOptions) -> Result<Vec<Record>> {
    let filter = match options.filter.as_deref() {
        Some(f) => Filter::parse(f)?,
        None => Filter::default(),
    };
    let keys = match options.sort.as_deref() {
        Some(s) => parse_sort(s)?,
        None => Vec::new(),
    };
    let mut out: Vec<Record> = records.into_iter().filter(|r| filter.matches(r)).collect();
    sort_records(&mut out, &keys);
    out.truncate(max_count);
    Ok(out)
}

/// Campos de relación pedidos en `expand`.
pub fn expand_fields(options: &ListOptions) -> Vec<String> {
    options.expand
           .as_deref()
           .map(|e| {
               e.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
           })
           .unwrap_or_default()
}
