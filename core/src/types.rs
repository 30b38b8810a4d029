//! Domain types shared by the translator and its callers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::params::Parameters;

/// A category of remote entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Issue,
    Project,
    User,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Issue => "issue",
            Resource::Project => "project",
            Resource::User => "user",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issue" => Ok(Resource::Issue),
            "project" => Ok(Resource::Project),
            "user" => Ok(Resource::User),
            other => Err(ApiError::UnknownResource(other.to_string())),
        }
    }
}

/// The CRUD-style action requested on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Get,
    GetAll,
    GetCurrent,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::GetAll => "getAll",
            Operation::GetCurrent => "getCurrent",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// Parse an operation name in the context of a resource, so the error
    /// can say which resource rejected it.
    pub fn parse_for(resource: Resource, name: &str) -> Result<Self, ApiError> {
        name.parse().map_err(|_| ApiError::UnsupportedOperation {
            resource: resource.to_string(),
            operation: name.to_string(),
        })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(Operation::Get),
            "getAll" => Ok(Operation::GetAll),
            "getCurrent" => Ok(Operation::GetCurrent),
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            other => Err(ApiError::UnknownOperation(other.to_string())),
        }
    }
}

/// Input to one translation. `item_index` is carried through untouched so
/// results can be paired with the input item that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    pub resource: Resource,
    pub operation: Operation,
    pub item_index: usize,
    pub parameters: Parameters,
}

impl OperationRequest {
    pub fn new(resource: Resource, operation: Operation, parameters: Parameters) -> Self {
        Self {
            resource,
            operation,
            item_index: 0,
            parameters,
        }
    }

    pub fn at_index(mut self, item_index: usize) -> Self {
        self.item_index = item_index;
        self
    }
}

/// A service-defined attribute value, identified by its numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldEntry {
    pub id: String,
    pub value: String,
}

/// How a date filter compares against the stored timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilterMode {
    Exact,
    Range,
    After,
    Before,
}

impl FromStr for DateFilterMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(DateFilterMode::Exact),
            "range" => Ok(DateFilterMode::Range),
            "after" => Ok(DateFilterMode::After),
            "before" => Ok(DateFilterMode::Before),
            _ => Err(()),
        }
    }
}

/// A created/updated date filter as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFilterSpec {
    pub enabled: bool,
    pub mode: Option<DateFilterMode>,
    pub value: Option<String>,
    pub range_start: Option<String>,
    pub range_end: Option<String>,
}

impl DateFilterSpec {
    /// Redmine's operator syntax for this filter, or `None` when the filter
    /// is disabled or incomplete. Incomplete filters are ignored rather than
    /// rejected, like every other optional filter.
    pub fn query_value(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let value = self.value.as_deref().filter(|v| !v.is_empty());
        match self.mode? {
            DateFilterMode::Exact => value.map(str::to_string),
            DateFilterMode::After => value.map(|v| format!(">={v}")),
            DateFilterMode::Before => value.map(|v| format!("<={v}")),
            DateFilterMode::Range => {
                let start = self.range_start.as_deref().filter(|v| !v.is_empty())?;
                let end = self.range_end.as_deref().filter(|v| !v.is_empty())?;
                Some(format!("><{start}|{end}"))
            }
        }
    }
}
