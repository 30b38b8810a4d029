//! Stateless request builder and response parser for a Redmine instance.
//!
//! # Design
//! `RedmineClient` holds only the base URL and API key. `build_request`
//! runs the translator and then binds the result to the instance: absolute
//! URL, API key header. `parse_response` checks the status and hands the
//! JSON back untouched. The caller executes the HTTP round-trip in between.

use serde_json::Value;
use tracing::debug;

use crate::config::Credentials;
use crate::error::{ApiError, Result};
use crate::http::{HttpRequest, HttpResponse, API_KEY_HEADER};
use crate::resource::spec_for;
use crate::translator::translate;
use crate::types::OperationRequest;

/// Synchronous, stateless client for the Redmine REST API.
#[derive(Clone)]
pub struct RedmineClient {
    base_url: String,
    api_key: String,
}

impl RedmineClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self::new(&credentials.url, &credentials.api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_request(&self, request: &OperationRequest) -> Result<HttpRequest> {
        let spec = spec_for(request.resource);
        let mut plan = translate(spec, request)?;

        plan.path = join_url(&self.base_url, &plan.path);
        plan.headers.insert(0, (API_KEY_HEADER.to_string(), self.api_key.clone()));

        debug!(
            item = request.item_index,
            resource = %request.resource,
            operation = %request.operation,
            method = %plan.method,
            path = %plan.path,
            "built Redmine request"
        );
        Ok(plan)
    }

    /// Check the status and return the body as JSON. Empty bodies, which
    /// Redmine sends for PUT and DELETE, come back as `Value::Null`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value> {
        check_status(&response)?;
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&response.body)?)
    }
}

impl std::fmt::Debug for RedmineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedmineClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Join with exactly one slash between base and path.
fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<()> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::params::Parameters;
    use crate::types::{Operation, Resource};

    fn client() -> RedmineClient {
        RedmineClient::new("http://localhost:3000", "test-key")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_request_binds_url_and_key() {
        let params = Parameters::new().with("issueId", "3");
        let req = OperationRequest::new(Resource::Issue, Operation::Get, params);
        let plan = client().build_request(&req).unwrap();
        assert_eq!(plan.method, HttpMethod::Get);
        assert_eq!(plan.path, "http://localhost:3000/issues/3.json");
        assert_eq!(plan.header(API_KEY_HEADER), Some("test-key"));
        assert_eq!(plan.headers[0].0, API_KEY_HEADER);
    }

    #[test]
    fn encoded_id_survives_url_rendering() {
        let req = OperationRequest::new(
            Resource::Issue,
            Operation::Delete,
            Parameters::new().with("issueId", "1/../../users/2"),
        );
        let url = client().build_request(&req).unwrap().url().unwrap();
        assert_eq!(url, "http://localhost:3000/issues/1%2F..%2F..%2Fusers%2F2.json");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = RedmineClient::new("http://localhost:3000/redmine/", "k");
        let req = OperationRequest::new(Resource::Project, Operation::GetAll, Parameters::new());
        let plan = client.build_request(&req).unwrap();
        assert_eq!(plan.path, "http://localhost:3000/redmine/projects.json");
    }

    #[test]
    fn join_url_never_doubles_slashes() {
        assert_eq!(join_url("http://h", "/issues.json"), "http://h/issues.json");
        assert_eq!(join_url("http://h/", "/issues.json"), "http://h/issues.json");
        assert_eq!(join_url("http://h", "issues.json"), "http://h/issues.json");
    }

    #[test]
    fn build_request_propagates_validation_errors() {
        let req = OperationRequest::new(Resource::User, Operation::Delete, Parameters::new());
        let err = client().build_request(&req).unwrap_err();
        assert!(matches!(err, ApiError::MissingRequiredParameter(_)));
    }

    #[test]
    fn debug_does_not_show_key() {
        assert!(!format!("{:?}", client()).contains("test-key"));
    }

    #[test]
    fn parse_response_passes_json_through() {
        let value = client()
            .parse_response(response(200, r#"{"issue":{"id":1,"subject":"x"}}"#))
            .unwrap();
        assert_eq!(value["issue"]["subject"], "x");
    }

    #[test]
    fn parse_response_empty_body_is_null() {
        assert_eq!(client().parse_response(response(204, "")).unwrap(), Value::Null);
    }

    #[test]
    fn parse_response_not_found() {
        let err = client().parse_response(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_response_unprocessable() {
        let err = client()
            .parse_response(response(422, r#"{"errors":["Subject cannot be blank"]}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 422, .. }));
    }

    #[test]
    fn parse_response_bad_json() {
        let err = client().parse_response(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }
}
