//! The champion record: field names, validation and normalization.

use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::error::DbError;
use crate::record::{Record, ID_FIELD};

/// Primary table name.
pub const CHAMPIONS_TABLE: &str = "champions";

pub const NOME: &str = "nome";
pub const ASPECTOS: &str = "aspectos";
pub const CUSTO: &str = "custo";
pub const HABILIDADE: &str = "habilidade";

/// A validated champion, ready to be inserted.
///
/// Unknown body fields are carried in `extra` and stored as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Champion {
    pub id: String,
    pub nome: String,
    pub aspectos: Vec<String>,
    pub custo: Number,
    pub habilidade: Value,
    pub extra: Map<String, Value>,
}

impl Champion {
    /// Validates a create body and assigns a fresh id.
    ///
    /// # Errors
    /// [`DbError::Validation`] naming the first field that fails:
    /// `nome` must be a non-empty string, `aspectos` a non-empty array of
    /// strings, `custo` a non-negative number and `habilidade` a
    /// non-empty value.
    pub fn from_body(body: &Value) -> Result<Self, DbError> {
        let object = body
            .as_object()
            .ok_or_else(|| DbError::invalid("body", "expected a JSON object"))?;

        let nome = parse_nome(object.get(NOME))?;
        let aspectos = parse_aspectos(object.get(ASPECTOS), false)?;
        let custo = parse_custo(object.get(CUSTO))?;
        let habilidade = parse_habilidade(object.get(HABILIDADE))?;

        let mut extra = object.clone();
        for key in [ID_FIELD, NOME, ASPECTOS, CUSTO, HABILIDADE] {
            extra.remove(key);
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            nome,
            aspectos,
            custo,
            habilidade,
            extra,
        })
    }

    /// Converts into a store record.
    pub fn into_record(self) -> Record {
        let mut record = Record::new();
        record.insert(ID_FIELD.to_string(), Value::String(self.id));
        record.insert(NOME.to_string(), Value::String(self.nome));
        record.insert(
            ASPECTOS.to_string(),
            Value::Array(self.aspectos.into_iter().map(Value::String).collect()),
        );
        record.insert(CUSTO.to_string(), Value::Number(self.custo));
        record.insert(HABILIDADE.to_string(), self.habilidade);
        record.extend(self.extra);
        record
    }
}

/// A partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChampionPatch {
    pub nome: Option<String>,
    pub aspectos: Option<Vec<String>>,
    pub custo: Option<Number>,
    pub habilidade: Option<Value>,
}

impl ChampionPatch {
    /// Parses an update body.
    ///
    /// Absent and `null` fields are skipped; a present field must pass the
    /// same check as on create. `aspectos` may also be a comma-separated
    /// string.
    pub fn from_body(body: &Value) -> Result<Self, DbError> {
        let object = body
            .as_object()
            .ok_or_else(|| DbError::invalid("body", "expected a JSON object"))?;
        let present = |key: &str| object.get(key).filter(|v| !v.is_null());

        Ok(Self {
            nome: present(NOME).map(|v| parse_nome(Some(v))).transpose()?,
            aspectos: present(ASPECTOS)
                .map(|v| parse_aspectos(Some(v), true))
                .transpose()?,
            custo: present(CUSTO).map(|v| parse_custo(Some(v))).transpose()?,
            habilidade: present(HABILIDADE)
                .map(|v| parse_habilidade(Some(v)))
                .transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.nome.is_none()
            && self.aspectos.is_none()
            && self.custo.is_none()
            && self.habilidade.is_none()
    }

    /// Whether applying the patch can change the aspect index.
    pub fn touches_index(&self) -> bool {
        self.nome.is_some() || self.aspectos.is_some()
    }

    /// Fields to merge into the stored record.
    pub fn into_record(self) -> Record {
        let mut record = Record::new();
        if let Some(nome) = self.nome {
            record.insert(NOME.to_string(), Value::String(nome));
        }
        if let Some(aspectos) = self.aspectos {
            record.insert(
                ASPECTOS.to_string(),
                Value::Array(aspectos.into_iter().map(Value::String).collect()),
            );
        }
        if let Some(custo) = self.custo {
            record.insert(CUSTO.to_string(), Value::Number(custo));
        }
        if let Some(habilidade) = self.habilidade {
            record.insert(HABILIDADE.to_string(), habilidade);
        }
        record
    }
}

/// Removes every `/` from a tag.
pub fn strip_slashes(tag: &str) -> String {
    tag.replace('/', "")
}

/// Strips slashes from each string tag of a champion record in place.
pub fn normalize_record(record: &mut Record) {
    if let Some(Value::Array(tags)) = record.get_mut(ASPECTOS) {
        for tag in tags.iter_mut() {
            if let Value::String(s) = tag {
                if s.contains('/') {
                    *s = strip_slashes(s);
                }
            }
        }
    }
}

/// Reads the name and tags the aspect index cares about.
///
/// Returns `None` for records missing either field.
pub fn index_fields(record: &Record) -> Option<(&str, Vec<&str>)> {
    let nome = record.get(NOME)?.as_str()?;
    let aspectos = record
        .get(ASPECTOS)?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .collect();
    Some((nome, aspectos))
}

/// JavaScript-style truthiness: null, false, 0 and "" are empty.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn parse_nome(value: Option<&Value>) -> Result<String, DbError> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(_) => Err(DbError::invalid(NOME, "expected a non-empty string")),
        None => Err(DbError::invalid(NOME, "missing")),
    }
}

fn parse_aspectos(value: Option<&Value>, allow_csv: bool) -> Result<Vec<String>, DbError> {
    let tags: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item.as_str().map(strip_slashes) {
                Some(tag) if tag.is_empty() => {
                    Err(DbError::invalid(ASPECTOS, "tags must not be empty"))
                }
                Some(tag) => Ok(tag),
                None => Err(DbError::invalid(ASPECTOS, "every tag must be a string")),
            })
            .collect::<Result<_, _>>()?,
        Some(Value::String(csv)) if allow_csv => csv
            .split(',')
            .map(|tag| strip_slashes(tag.trim()))
            .filter(|tag| !tag.is_empty())
            .collect(),
        Some(_) => return Err(DbError::invalid(ASPECTOS, "expected an array of tags")),
        None => return Err(DbError::invalid(ASPECTOS, "missing")),
    };

    if tags.is_empty() {
        return Err(DbError::invalid(ASPECTOS, "at least one tag is required"));
    }
    Ok(tags)
}

fn parse_custo(value: Option<&Value>) -> Result<Number, DbError> {
    match value {
        Some(Value::Number(n)) if n.as_f64().is_some_and(|f| f >= 0.0) => Ok(n.clone()),
        Some(_) => Err(DbError::invalid(CUSTO, "expected a non-negative number")),
        None => Err(DbError::invalid(CUSTO, "missing")),
    }
}

fn parse_habilidade(value: Option<&Value>) -> Result<Value, DbError> {
    match value {
        Some(v) if is_truthy(v) => Ok(v.clone()),
        Some(_) => Err(DbError::invalid(HABILIDADE, "must not be empty")),
        None => Err(DbError::invalid(HABILIDADE, "missing")),
    }
}
