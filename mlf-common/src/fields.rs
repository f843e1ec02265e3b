//! Input field resolution
//!
//! Maps raw input keyed by field name or id onto field ids, coercing each
//! value to the type its field expects.

use crate::resource::Fields;
use crate::{Error, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Raw input record, keyed by field name or field id
pub type InputData = HashMap<String, Value>;

/// Input record keyed by field id with typed values
pub type ResolvedInput = BTreeMap<String, Value>;

/// Field metadata used to resolve input data
#[derive(Debug, Clone)]
pub struct ModelFields {
    fields: Fields,
    objective_id: Option<String>,
    name_to_id: HashMap<String, String>,
    missing_numerics: bool,
}

impl ModelFields {
    /// Build resolver for the given fields
    ///
    /// With `missing_numerics` false every numeric input field must be
    /// supplied on each prediction. A name shared by several fields resolves
    /// to the smallest of their ids.
    pub fn new(fields: Fields, objective_id: Option<String>, missing_numerics: bool) -> Self {
        let mut ids: Vec<&String> = fields.keys().collect();
        ids.sort();

        let mut name_to_id = HashMap::new();
        for id in ids {
            let name = &fields[id].name;
            if name_to_id.contains_key(name) {
                warn!("Field name '{}' is shared, keeping the lower id for lookups", name);
                continue;
            }
            name_to_id.insert(name.clone(), id.clone());
        }

        Self {
            fields,
            objective_id,
            name_to_id,
            missing_numerics,
        }
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn objective_id(&self) -> Option<&str> {
        self.objective_id.as_deref()
    }

    pub fn missing_numerics(&self) -> bool {
        self.missing_numerics
    }

    /// Field id for a name or id key
    pub fn field_id(&self, key: &str, by_name: bool) -> Result<&str> {
        let id = if by_name {
            self.name_to_id.get(key).map(String::as_str)
        } else {
            self.fields.get_key_value(key).map(|(id, _)| id.as_str())
        };
        id.ok_or_else(|| Error::UnknownField(key.to_string()))
    }

    /// Resolve raw input to typed values keyed by field id
    ///
    /// Null values count as missing and are dropped, as is any value for
    /// the objective field.
    pub fn resolve(&self, raw: &InputData, by_name: bool) -> Result<ResolvedInput> {
        let mut resolved = ResolvedInput::new();

        for (key, value) in raw {
            let id = self.field_id(key, by_name)?;
            if Some(id) == self.objective_id.as_deref() || value.is_null() {
                continue;
            }

            let field = &self.fields[id];
            let typed = if field.is_numeric() {
                coerce_numeric(key, value)?
            } else {
                coerce_text(key, value)?
            };
            resolved.insert(id.to_string(), typed);
        }

        if !self.missing_numerics {
            self.check_no_missing_numerics(&resolved)?;
        }

        debug!("Resolved {} of {} input values", resolved.len(), raw.len());
        Ok(resolved)
    }

    fn check_no_missing_numerics(&self, resolved: &ResolvedInput) -> Result<()> {
        let mut ids: Vec<&String> = self
            .fields
            .iter()
            .filter(|(id, field)| {
                field.is_numeric() && Some(id.as_str()) != self.objective_id.as_deref()
            })
            .map(|(id, _)| id)
            .collect();
        ids.sort();

        match ids.into_iter().find(|id| !resolved.contains_key(*id)) {
            Some(id) => Err(Error::MissingNumeric(self.fields[id].name.clone())),
            None => Ok(()),
        }
    }
}

fn coerce_numeric(key: &str, value: &Value) -> Result<Value> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| Error::InvalidInput(format!("{}: '{}' is not numeric", key, s))),
        other => Err(Error::InvalidInput(format!(
            "{}: expected a number, got {}",
            key, other
        ))),
    }
}

fn coerce_text(key: &str, value: &Value) -> Result<Value> {
    match value {
        Value::String(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        other => Err(Error::InvalidInput(format!(
            "{}: expected a scalar, got {}",
            key, other
        ))),
    }
}
