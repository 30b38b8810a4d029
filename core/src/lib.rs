//! Request translator core for the Redmine REST API.
//!
//! # Overview
//! Turns a flat set of host parameters (resource, operation, filters,
//! additional fields, custom fields) into a plain-data `HttpRequest`, and a
//! plain-data `HttpResponse` back into JSON. The caller executes the actual
//! HTTP round-trip (host-does-IO pattern), so everything here is
//! deterministic and testable without a network.
//!
//! # Design
//! - Issues, projects and users are static `ResourceSpec` tables; one
//!   generic `translate` function interprets them.
//! - `RedmineClient` binds a translated request to an instance URL and API
//!   key, and checks response statuses.
//! - `run_batch` drives one operation over many input items through a
//!   caller-supplied `Transport`.

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod resource;
pub mod translator;
pub mod types;

pub use batch::{run_batch, BatchOptions, ItemResult, Transport};
pub use client::RedmineClient;
pub use config::Credentials;
pub use error::{ApiError, BatchError, ConfigError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::Parameters;
pub use resource::{spec_for, ResourceSpec};
pub use translator::translate;
pub use types::{
    CustomFieldEntry, DateFilterMode, DateFilterSpec, Operation, OperationRequest, Resource,
};
