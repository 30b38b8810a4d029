//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The translator fills in an
//! `HttpRequest` with a path relative to the service root; `RedmineClient`
//! then turns that path into an absolute URL and adds the API key. The host
//! executes the request and hands back an `HttpResponse`.
//!
//! `query` is a `BTreeMap` so identical input always renders the same query
//! string, and a later write to the same key replaces the earlier one.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::{ApiError, Result};

/// Header carrying the API key. Its value is never printed.
pub const API_KEY_HEADER: &str = "X-Redmine-API-Key";

/// Header naming the user an admin key acts as.
pub const SWITCH_USER_HEADER: &str = "X-Redmine-Switch-User";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `body` is `None` when the operation carries no payload. An update with no
/// fields still has `Some`, holding an empty resource object.
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Absolute URL with the percent-encoded query string appended.
    ///
    /// Only meaningful once `path` is absolute, i.e. after
    /// `RedmineClient::build_request`.
    pub fn url(&self) -> Result<String> {
        let mut url = url::Url::parse(&self.path)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.path)))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url.into())
    }

    /// Serialized body, if any.
    pub fn body_string(&self) -> Option<String> {
        self.body.as_ref().map(Value::to_string)
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(key, value)| {
                if key.eq_ignore_ascii_case(API_KEY_HEADER) {
                    (key.as_str(), "[redacted]")
                } else {
                    (key.as_str(), value.as_str())
                }
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the caller after executing an `HttpRequest`, then passed
/// to `RedmineClient::parse_response`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}
