//! Parameter-to-request translation.
//!
//! # Design
//! `translate` is a pure function of a `ResourceSpec` and an
//! `OperationRequest`. It validates required parameters first and only then
//! assembles the request, so an error never leaves a partial request behind.
//! The result carries a path relative to the service root; credentials are
//! added later by `RedmineClient`.

use serde_json::{Map, Number, Value};

use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, SWITCH_USER_HEADER};
use crate::params::Parameters;
use crate::resource::{BodyField, FieldKind, FilterHandler, Presence, ResourceSpec};
use crate::types::{CustomFieldEntry, DateFilterSpec, Operation, OperationRequest};

/// Page size used when `getAll` is limited but no `limit` was given.
pub const DEFAULT_LIMIT: u64 = 50;

/// Translate one operation request into an HTTP request plan.
pub fn translate(spec: &ResourceSpec, request: &OperationRequest) -> Result<HttpRequest> {
    if !spec.supports(request.operation) {
        return Err(ApiError::UnsupportedOperation {
            resource: spec.resource.to_string(),
            operation: request.operation.to_string(),
        });
    }

    let params = &request.parameters;
    let mut plan = match request.operation {
        Operation::Get => {
            let id = params.require_text(spec.id_param)?;
            let mut plan = HttpRequest::new(HttpMethod::Get, spec.member_path(&id));
            apply_includes(&mut plan, spec.fixed_includes, params)?;
            plan
        }
        Operation::GetCurrent => {
            let mut plan = HttpRequest::new(HttpMethod::Get, spec.member_path("current"));
            apply_includes(&mut plan, spec.fixed_includes, params)?;
            plan
        }
        Operation::GetAll => build_get_all(spec, params)?,
        Operation::Create => {
            let object = create_object(spec, params)?;
            let mut plan = HttpRequest::new(HttpMethod::Post, spec.collection_path());
            plan.body = wrap_body(spec.body_key, object);
            plan
        }
        Operation::Update => {
            let id = params.require_text(spec.id_param)?;
            let object = update_object(spec, params)?;
            let mut plan = HttpRequest::new(HttpMethod::Put, spec.member_path(&id));
            plan.body = wrap_body(spec.body_key, object);
            plan
        }
        Operation::Delete => {
            let id = params.require_text(spec.id_param)?;
            HttpRequest::new(HttpMethod::Delete, spec.member_path(&id))
        }
    };

    plan.headers
        .push(("Content-Type".to_string(), "application/json".to_string()));
    let options = params.collection("options")?;
    if let Some(login) = options.non_empty_text("impersonateUser")? {
        plan.headers.push((SWITCH_USER_HEADER.to_string(), login));
    }

    Ok(plan)
}

/// Fixed includes first, then the caller's, without repeats. No key at all
/// when both are empty.
fn apply_includes(plan: &mut HttpRequest, fixed: &[&str], params: &Parameters) -> Result<()> {
    let mut includes: Vec<String> = fixed.iter().map(|s| s.to_string()).collect();
    for extra in params.list("include")? {
        if !includes.contains(&extra) {
            includes.push(extra);
        }
    }
    if !includes.is_empty() {
        plan.query.insert("include".to_string(), includes.join(","));
    }
    Ok(())
}

fn build_get_all(spec: &ResourceSpec, params: &Parameters) -> Result<HttpRequest> {
    let mut plan = HttpRequest::new(HttpMethod::Get, spec.collection_path());

    if !params.flag("returnAll")?.unwrap_or(false) {
        let limit = params.unsigned("limit")?.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(ApiError::invalid("limit", "must be at least 1"));
        }
        let offset = params.unsigned("offset")?.unwrap_or(0);
        plan.query.insert("limit".to_string(), limit.to_string());
        plan.query.insert("offset".to_string(), offset.to_string());
    }

    if let Some(sort) = params.non_empty_text("sort")? {
        plan.query.insert("sort".to_string(), sort);
    }
    apply_includes(&mut plan, &[], params)?;

    let filters = params.collection("filters")?;
    for handler in spec.filters {
        apply_filter(handler, &filters, &mut plan)?;
    }
    Ok(plan)
}

fn apply_filter(
    handler: &FilterHandler,
    filters: &Parameters,
    plan: &mut HttpRequest,
) -> Result<()> {
    match handler {
        FilterHandler::Text(name) => {
            if let Some(value) = filters.non_empty_text(name)? {
                plan.query.insert(name.to_string(), value);
            }
        }
        FilterHandler::Status { param, custom } => {
            if let Some(status) = filters.non_empty_text(param)? {
                let value = match filters.non_empty_text(custom)? {
                    Some(custom_id) if status == "custom" => custom_id,
                    _ => status,
                };
                plan.query.insert(param.to_string(), value);
            }
        }
        FilterHandler::Date(names) => {
            let filter = DateFilterSpec {
                enabled: filters.flag(names.toggle)?.unwrap_or(false),
                mode: filters.text(names.mode)?.and_then(|mode| mode.parse().ok()),
                value: filters.text(names.value)?,
                range_start: filters.text(names.start)?,
                range_end: filters.text(names.end)?,
            };
            if let Some(value) = filter.query_value() {
                plan.query.insert(names.key.to_string(), value);
            }
        }
        FilterHandler::CustomFields => {
            for entry in filters.custom_fields()? {
                plan.query.insert(format!("cf_{}", entry.id), entry.value);
            }
        }
    }
    Ok(())
}

fn create_object(spec: &ResourceSpec, params: &Parameters) -> Result<Map<String, Value>> {
    let mut object = Map::new();
    for field in spec.required_fields {
        let value = params.require_text(field.param)?;
        object.insert(field.key.to_string(), Value::String(value));
    }

    let additional = params.collection("additionalFields")?;
    insert_fields(&mut object, spec.body_fields, &additional, Presence::NonEmpty)?;
    insert_collections(&mut object, spec, &additional)?;
    Ok(object)
}

fn update_object(spec: &ResourceSpec, params: &Parameters) -> Result<Map<String, Value>> {
    let mut object = Map::new();
    insert_fields(&mut object, spec.update_fields, params, spec.update_presence)?;

    let additional = params.collection("additionalFields")?;
    insert_fields(&mut object, spec.body_fields, &additional, spec.update_presence)?;
    insert_collections(&mut object, spec, &additional)?;
    Ok(object)
}

fn insert_fields(
    object: &mut Map<String, Value>,
    fields: &[BodyField],
    source: &Parameters,
    presence: Presence,
) -> Result<()> {
    for field in fields {
        if let Some(value) = field_value(field, source, presence)? {
            object.insert(field.key.to_string(), value);
        }
    }
    Ok(())
}

/// Body value for one optional field. Booleans are tri-state: an explicit
/// `false` is sent, an absent flag is not.
fn field_value(
    field: &BodyField,
    source: &Parameters,
    presence: Presence,
) -> Result<Option<Value>> {
    match field.kind {
        FieldKind::Bool => Ok(source.flag(field.param)?.map(Value::Bool)),
        FieldKind::Text => Ok(source
            .text(field.param)?
            .filter(|s| presence == Presence::Explicit || !s.is_empty())
            .map(Value::String)),
        FieldKind::Number => match source.value(field.param) {
            None => Ok(None),
            Some(Value::Number(n)) => {
                let is_zero = n.as_f64() == Some(0.0);
                if is_zero && presence == Presence::NonEmpty {
                    Ok(None)
                } else {
                    Ok(Some(Value::Number(n.clone())))
                }
            }
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => {
                let parsed: f64 = s.trim().parse().map_err(|_| {
                    ApiError::invalid(field.param, format!("expected a number, got '{s}'"))
                })?;
                if parsed == 0.0 && presence == Presence::NonEmpty {
                    return Ok(None);
                }
                Number::from_f64(parsed)
                    .map(|n| Some(Value::Number(n)))
                    .ok_or_else(|| {
                        ApiError::invalid(field.param, format!("'{s}' is not a finite number"))
                    })
            }
            Some(other) => {
                Err(ApiError::invalid(field.param, format!("expected a number, got {other}")))
            }
        },
    }
}

fn insert_collections(
    object: &mut Map<String, Value>,
    spec: &ResourceSpec,
    additional: &Parameters,
) -> Result<()> {
    let custom_fields = additional.custom_fields()?;
    if !custom_fields.is_empty() {
        object.insert("custom_fields".to_string(), custom_fields_body(&custom_fields));
    }

    if spec.enabled_modules {
        let modules = additional.modules()?;
        if !modules.is_empty() {
            let modules = modules
                .into_iter()
                .map(|name| {
                    let mut entry = Map::new();
                    entry.insert("name".to_string(), Value::String(name));
                    Value::Object(entry)
                })
                .collect();
            object.insert("enabled_modules".to_string(), Value::Array(modules));
        }
    }
    Ok(())
}

fn custom_fields_body(entries: &[CustomFieldEntry]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|entry| {
                let mut item = Map::new();
                item.insert("id".to_string(), Value::String(entry.id.clone()));
                item.insert("value".to_string(), Value::String(entry.value.clone()));
                Value::Object(item)
            })
            .collect(),
    )
}

/// `{<key>: object}`. The wrapper is always present for create/update, even
/// around an empty object; only a wholly empty body would be dropped.
fn wrap_body(key: &str, object: Map<String, Value>) -> Option<Value> {
    let mut body = Map::new();
    body.insert(key.to_string(), Value::Object(object));
    Some(Value::Object(body)).filter(|b| b.as_object().is_some_and(|m| !m.is_empty()))
}
