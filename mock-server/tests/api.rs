use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::{json, Value};
use tower::ServiceExt;

const KEY: &str = "test-key";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Redmine-API-Key", KEY)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Redmine-API-Key", KEY)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

async fn send(app: &Router, req: Request<String>) -> axum::response::Response {
    app.clone().oneshot(req).await.unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_api_key_is_401() {
    let app = app(KEY);
    let resp = app
        .oneshot(Request::builder().uri("/issues.json").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_api_key_is_401() {
    let app = app(KEY);
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/issues.json")
                .header("X-Redmine-API-Key", "nope")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- issues ---

#[tokio::test]
async fn list_issues_empty() {
    let app = app(KEY);
    let resp = send(&app, request("GET", "/issues.json")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["issues"], json!([]));
    assert_eq!(body["total_count"], 0);
    assert_eq!(body["limit"], 25);
}

#[tokio::test]
async fn create_issue_returns_201() {
    let app = app(KEY);
    let resp = send(
        &app,
        json_request(
            "POST",
            "/issues.json",
            json!({"issue": {"project_id": "1", "subject": "Crash"}}),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["issue"]["id"], 1);
    assert_eq!(body["issue"]["subject"], "Crash");
}

#[tokio::test]
async fn create_issue_without_subject_is_422() {
    let app = app(KEY);
    let body = json!({"issue": {"project_id": "1"}});
    let resp = send(&app, json_request("POST", "/issues.json", body)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["errors"], json!(["subject cannot be blank"]));
}

#[tokio::test]
async fn update_then_filter_closed_issues() {
    let app = app(KEY);
    send(
        &app,
        json_request("POST", "/issues.json", json!({"issue": {"project_id": "1", "subject": "a"}})),
    )
    .await;
    send(
        &app,
        json_request("POST", "/issues.json", json!({"issue": {"project_id": "1", "subject": "b"}})),
    )
    .await;

    let body = json!({"issue": {"status_id": "5"}});
    let resp = send(&app, json_request("PUT", "/issues/2.json", body)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let open = body_json(send(&app, request("GET", "/issues.json")).await).await;
    assert_eq!(open["total_count"], 1);
    let closed = body_json(send(&app, request("GET", "/issues.json?status_id=closed")).await).await;
    assert_eq!(closed["issues"][0]["subject"], "b");
    let all = request("GET", "/issues.json?status_id=*&limit=1&offset=1");
    let all = body_json(send(&app, all).await).await;
    assert_eq!(all["total_count"], 2);
    assert_eq!(all["issues"].as_array().unwrap().len(), 1);
    assert_eq!(all["offset"], 1);
}

#[tokio::test]
async fn get_missing_issue_is_404() {
    let app = app(KEY);
    let resp = send(&app, request("GET", "/issues/99.json")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_issue_twice() {
    let app = app(KEY);
    send(
        &app,
        json_request("POST", "/issues.json", json!({"issue": {"project_id": "1", "subject": "a"}})),
    )
    .await;
    let resp = send(&app, request("DELETE", "/issues/1.json")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = send(&app, request("DELETE", "/issues/1.json")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- projects ---

#[tokio::test]
async fn project_lookup_by_identifier() {
    let app = app(KEY);
    send(
        &app,
        json_request(
            "POST",
            "/projects.json",
            json!({"project": {"name": "Demo", "identifier": "demo"}}),
        ),
    )
    .await;
    let resp = send(&app, request("GET", "/projects/demo.json?include=trackers")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["project"]["name"], "Demo");
}

#[tokio::test]
async fn project_update_and_delete_by_identifier() {
    let app = app(KEY);
    let project = json!({"project": {"name": "Demo", "identifier": "demo"}});
    send(&app, json_request("POST", "/projects.json", project)).await;

    let body = json!({"project": {"description": "Tracker"}});
    let resp = send(&app, json_request("PUT", "/projects/demo.json", body)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let fetched = body_json(send(&app, request("GET", "/projects/1.json")).await).await;
    assert_eq!(fetched["project"]["description"], "Tracker");

    let resp = send(&app, request("DELETE", "/projects/demo.json")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = send(&app, request("GET", "/projects/demo.json")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_project_identifier_is_422() {
    let app = app(KEY);
    let project = json!({"project": {"name": "Demo", "identifier": "demo"}});
    send(&app, json_request("POST", "/projects.json", project.clone())).await;
    let resp = send(&app, json_request("POST", "/projects.json", project)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- users ---

#[tokio::test]
async fn current_user_defaults_to_admin() {
    let app = app(KEY);
    let resp = send(&app, request("GET", "/users/current.json")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["user"]["login"], "admin");
}

#[tokio::test]
async fn current_user_follows_switch_user() {
    let app = app(KEY);
    send(
        &app,
        json_request(
            "POST",
            "/users.json",
            json!({"user": {
                "login": "jsmith",
                "firstname": "John",
                "lastname": "Smith",
                "mail": "j@example.net"
            }}),
        ),
    )
    .await;

    let mut req = request("GET", "/users/current.json");
    req.headers_mut()
        .insert("X-Redmine-Switch-User", "jsmith".parse().unwrap());
    let resp = send(&app, req).await;
    assert_eq!(body_json(resp).await["user"]["login"], "jsmith");

    let mut req = request("GET", "/users/current.json");
    req.headers_mut()
        .insert("X-Redmine-Switch-User", "ghost".parse().unwrap());
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn list_users_by_name() {
    let app = app(KEY);
    send(
        &app,
        json_request(
            "POST",
            "/users.json",
            json!({"user": {
                "login": "jsmith",
                "firstname": "John",
                "lastname": "Smith",
                "mail": "j@example.net"
            }}),
        ),
    )
    .await;
    let body = body_json(send(&app, request("GET", "/users.json?name=smi")).await).await;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["users"][0]["login"], "jsmith");
}
