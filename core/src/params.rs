//! Typed access to the host's flat parameter object.
//!
//! # Design
//! The host hands over parameters as loosely typed JSON. Everything here
//! keeps the difference between "not supplied" and "supplied as false/empty"
//! visible to callers: `flag` returns `Option<bool>` and `value` returns
//! `Option<&Value>`, so the translator can decide per field whether an
//! explicit `false` or `""` should reach the request body.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{ApiError, Result};
use crate::types::CustomFieldEntry;

/// Parameters for one input item, keyed by the host's parameter names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(Map<String, Value>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and hosts assembling items.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    /// Raw value, with JSON `null` treated as absent.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// String parameter. Numbers are rendered as strings since ids arrive
    /// either way.
    pub fn text(&self, name: &str) -> Result<Option<String>> {
        match self.value(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(number_text(n))),
            Some(other) => Err(ApiError::invalid(name, format!("expected a string, got {other}"))),
        }
    }

    /// String parameter that only counts when non-empty.
    pub fn non_empty_text(&self, name: &str) -> Result<Option<String>> {
        Ok(self.text(name)?.filter(|s| !s.is_empty()))
    }

    pub fn require_text(&self, name: &str) -> Result<String> {
        self.non_empty_text(name)?
            .ok_or_else(|| ApiError::MissingRequiredParameter(name.to_string()))
    }

    pub fn flag(&self, name: &str) -> Result<Option<bool>> {
        match self.value(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(ApiError::invalid(name, format!("expected a boolean, got {other}"))),
        }
    }

    /// Non-negative integer, from a JSON number or a numeric string.
    pub fn unsigned(&self, name: &str) -> Result<Option<u64>> {
        match self.value(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| {
                    ApiError::invalid(name, format!("expected a non-negative integer, got {n}"))
                }),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| {
                    ApiError::invalid(name, format!("expected a non-negative integer, got '{s}'"))
                }),
            Some(other) => Err(ApiError::invalid(name, format!("expected a number, got {other}"))),
        }
    }

    /// List of strings. A single comma-separated string is accepted too.
    pub fn list(&self, name: &str) -> Result<Vec<String>> {
        match self.value(name) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(ApiError::invalid(
                        name,
                        format!("expected a list of strings, found {other}"),
                    )),
                })
                .filter(|item| !matches!(item, Ok(s) if s.is_empty()))
                .collect(),
            Some(Value::String(s)) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()),
            Some(other) => Err(ApiError::invalid(name, format!("expected a list, got {other}"))),
        }
    }

    /// Nested collection such as `filters` or `additionalFields`. Absent
    /// collections come back empty.
    pub fn collection(&self, name: &str) -> Result<Parameters> {
        match self.value(name) {
            None => Ok(Parameters::new()),
            Some(Value::Object(map)) => Ok(Parameters(map.clone())),
            Some(other) => Err(ApiError::invalid(name, format!("expected an object, got {other}"))),
        }
    }

    /// Entries of `customFields.field`, in input order. Entries without an
    /// id are dropped.
    pub fn custom_fields(&self) -> Result<Vec<CustomFieldEntry>> {
        let fields = self.collection("customFields")?;
        let entries = match fields.value("field") {
            None => return Ok(Vec::new()),
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                let reason = format!("expected a list, got {other}");
                return Err(ApiError::invalid("customFields.field", reason));
            }
        };

        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry: Parameters = serde_json::from_value(entry.clone())
                .map_err(|e| ApiError::invalid("customFields.field", e.to_string()))?;
            let Some(id) = entry.non_empty_text("id")? else {
                continue;
            };
            let value = entry.text("value")?.unwrap_or_default();
            out.push(CustomFieldEntry { id, value });
        }
        Ok(out)
    }

    /// Module names from `enabledModules.module[].name`, in input order.
    pub fn modules(&self) -> Result<Vec<String>> {
        let modules = self.collection("enabledModules")?;
        let entries = match modules.value("module") {
            None => return Ok(Vec::new()),
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                let reason = format!("expected a list, got {other}");
                return Err(ApiError::invalid("enabledModules.module", reason));
            }
        };

        let mut names = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry: Parameters = serde_json::from_value(entry.clone())
                .map_err(|e| ApiError::invalid("enabledModules.module", e.to_string()))?;
            if let Some(name) = entry.non_empty_text("name")? {
                names.push(name);
            }
        }
        Ok(names)
    }
}

impl From<Map<String, Value>> for Parameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Whole floats such as `12.0` render as `12`.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 9.0e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}
