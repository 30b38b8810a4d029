//! Per-item execution loop.
//!
//! # Design
//! The host runs one operation over a list of input items. Each item is
//! translated, executed through the caller's `Transport`, and parsed on its
//! own. A failure is tagged with the item's index; with
//! `continue_on_fail` it becomes an `{"error": ...}` result for that item,
//! otherwise the loop stops there.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::client::RedmineClient;
use crate::error::{ApiError, BatchError};
use crate::http::{HttpRequest, HttpResponse};
use crate::params::Parameters;
use crate::types::{Operation, OperationRequest, Resource};

/// Executes a request against the network. Non-2xx statuses are data, not
/// errors; only failures to get a response at all should be `Err`.
pub trait Transport {
    type Error: fmt::Display;

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Self::Error>;
}

/// Output for one input item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    pub json: Value,
    pub paired_item: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    pub continue_on_fail: bool,
}

/// Run `operation` on `resource` once per item, in order.
pub fn run_batch<T: Transport>(
    client: &RedmineClient,
    transport: &T,
    resource: Resource,
    operation: Operation,
    items: &[Parameters],
    options: BatchOptions,
) -> Result<Vec<ItemResult>, BatchError> {
    let mut results = Vec::with_capacity(items.len());

    for (index, parameters) in items.iter().enumerate() {
        let request =
            OperationRequest::new(resource, operation, parameters.clone()).at_index(index);
        match run_item(client, transport, &request) {
            Ok(json) => results.push(ItemResult { json, paired_item: index }),
            Err(source) => {
                let error = BatchError { item_index: index, source };
                if !options.continue_on_fail {
                    return Err(error);
                }
                warn!(item = index, error = %error, "item failed, continuing");
                results.push(ItemResult {
                    json: json!({ "error": error.to_string() }),
                    paired_item: index,
                });
            }
        }
    }

    debug!(%resource, %operation, items = results.len(), "batch finished");
    Ok(results)
}

fn run_item<T: Transport>(
    client: &RedmineClient,
    transport: &T,
    request: &OperationRequest,
) -> Result<Value, ApiError> {
    let plan = client.build_request(request)?;
    let response = transport
        .execute(&plan)
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    client.parse_response(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use std::cell::RefCell;

    /// Replays canned responses and records what it was asked to send.
    struct Scripted {
        responses: RefCell<Vec<Result<HttpResponse, String>>>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<HttpResponse, String>>) -> Self {
            Self {
                responses: RefCell::new(responses.into_iter().rev().collect()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Scripted {
        type Error = String;

        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
            self.seen.borrow_mut().push(request.clone());
            self.responses.borrow_mut().pop().expect("no scripted response left")
        }
    }

    fn ok(status: u16, body: &str) -> Result<HttpResponse, String> {
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    fn client() -> RedmineClient {
        RedmineClient::new("http://redmine.test", "key")
    }

    fn issue(id: &str) -> Parameters {
        Parameters::new().with("issueId", id)
    }

    #[test]
    fn results_are_paired_with_items() {
        let transport = Scripted::new(vec![
            ok(200, r#"{"issue":{"id":1}}"#),
            ok(200, r#"{"issue":{"id":2}}"#),
        ]);
        let results = run_batch(
            &client(),
            &transport,
            Resource::Issue,
            Operation::Get,
            &[issue("1"), issue("2")],
            BatchOptions::default(),
        )
        .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[1].paired_item, 1);
        assert_eq!(results[1].json["issue"]["id"], 2);
        let seen = transport.seen.borrow();
        assert_eq!(seen[0].method, HttpMethod::Get);
        assert_eq!(seen[1].path, "http://redmine.test/issues/2.json");
    }

    #[test]
    fn failure_aborts_with_item_index() {
        let transport = Scripted::new(vec![ok(200, "{}"), ok(500, "boom")]);
        let err = run_batch(
            &client(),
            &transport,
            Resource::Issue,
            Operation::Get,
            &[issue("1"), issue("2"), issue("3")],
            BatchOptions::default(),
        )
        .unwrap_err();

        assert_eq!(err.item_index, 1);
        assert!(matches!(err.source, ApiError::HttpError { status: 500, .. }));
        assert_eq!(err.to_string(), "Redmine API error: HTTP 500: boom");
        assert_eq!(transport.seen.borrow().len(), 2);
    }

    #[test]
    fn continue_on_fail_records_error_items() {
        let transport = Scripted::new(vec![Err("connection refused".to_string()), ok(204, "")]);
        let results = run_batch(
            &client(),
            &transport,
            Resource::Issue,
            Operation::Delete,
            &[issue("1"), Parameters::new(), issue("3")],
            BatchOptions { continue_on_fail: true },
        )
        .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].json,
            json!({"error": "Redmine API error: transport error: connection refused"})
        );
        assert_eq!(
            results[1].json,
            json!({"error": "Redmine API error: missing required parameter: issueId"})
        );
        assert_eq!(results[2], ItemResult { json: Value::Null, paired_item: 2 });
        // the item with no id never reached the transport
        assert_eq!(transport.seen.borrow().len(), 2);
    }

    #[test]
    fn item_result_serializes_for_the_host() {
        let result = ItemResult { json: json!({"ok": true}), paired_item: 4 };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"json": {"ok": true}, "pairedItem": 4})
        );
    }
}
