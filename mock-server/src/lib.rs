//! In-memory stand-in for the parts of the Redmine REST API the translator
//! targets: issues, projects and users as `.json` endpoints.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub const API_KEY_HEADER: &str = "x-redmine-api-key";
pub const SWITCH_USER_HEADER: &str = "x-redmine-switch-user";

/// Page size Redmine applies when the client sends no `limit`.
const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Issue,
    Project,
    User,
}

impl Kind {
    fn singular(self) -> &'static str {
        match self {
            Kind::Issue => "issue",
            Kind::Project => "project",
            Kind::User => "user",
        }
    }

    fn plural(self) -> &'static str {
        match self {
            Kind::Issue => "issues",
            Kind::Project => "projects",
            Kind::User => "users",
        }
    }

    fn required(self) -> &'static [&'static str] {
        match self {
            Kind::Issue => &["project_id", "subject"],
            Kind::Project => &["name", "identifier"],
            Kind::User => &["login", "firstname", "lastname", "mail"],
        }
    }
}

/// Records of one kind, keyed by id.
#[derive(Debug, Default)]
struct Table {
    next_id: u64,
    rows: BTreeMap<u64, Map<String, Value>>,
}

impl Table {
    fn insert(&mut self, mut record: Map<String, Value>) -> Map<String, Value> {
        self.next_id += 1;
        record.insert("id".to_string(), json!(self.next_id));
        self.rows.insert(self.next_id, record.clone());
        record
    }
}

#[derive(Debug)]
pub struct Store {
    api_key: String,
    issues: Table,
    projects: Table,
    users: Table,
}

impl Store {
    /// Empty store with a single admin user, id 1.
    pub fn new(api_key: &str) -> Self {
        let mut users = Table::default();
        let admin = json!({
            "login": "admin",
            "firstname": "Redmine",
            "lastname": "Admin",
            "mail": "admin@example.net",
            "admin": true,
            "status": 1
        });
        if let Value::Object(admin) = admin {
            users.insert(admin);
        }
        Self {
            api_key: api_key.to_string(),
            issues: Table::default(),
            projects: Table::default(),
            users,
        }
    }

    fn table(&self, kind: Kind) -> &Table {
        match kind {
            Kind::Issue => &self.issues,
            Kind::Project => &self.projects,
            Kind::User => &self.users,
        }
    }

    fn table_mut(&mut self, kind: Kind) -> &mut Table {
        match kind {
            Kind::Issue => &mut self.issues,
            Kind::Project => &mut self.projects,
            Kind::User => &mut self.users,
        }
    }

    fn user_by_login(&self, login: &str) -> Option<&Map<String, Value>> {
        self.users
            .rows
            .values()
            .find(|user| user.get("login").and_then(Value::as_str) == Some(login))
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app(api_key: &str) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::new(api_key)));
    let mut router = Router::new();
    for kind in [Kind::Issue, Kind::Project, Kind::User] {
        router = router.merge(routes(kind));
    }
    router
        .layer(middleware::from_fn_with_state(db.clone(), require_api_key))
        .with_state(db)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    info!(address = %listener.local_addr()?, "mock Redmine listening");
    axum::serve(listener, app(api_key)).await
}

fn routes(kind: Kind) -> Router<Db> {
    let collection = format!("/{}.json", kind.plural());
    let member = format!("/{}/{{file}}", kind.plural());
    Router::new()
        .route(
            &collection,
            get(move |State(db): State<Db>, Query(q): Query<HashMap<String, String>>| {
                list(kind, db, q)
            })
            .post(move |State(db): State<Db>, Json(body): Json<Value>| create(kind, db, body)),
        )
        .route(
            &member,
            get(move |State(db): State<Db>, Path(file): Path<String>, headers: HeaderMap| {
                fetch(kind, db, file, headers)
            })
            .put(move |State(db): State<Db>, Path(file): Path<String>, Json(body): Json<Value>| {
                update(kind, db, file, body)
            })
            .delete(move |State(db): State<Db>, Path(file): Path<String>| remove(kind, db, file)),
        )
}

async fn require_api_key(State(db): State<Db>, request: Request, next: Next) -> Response {
    let expected = db.read().await.api_key.clone();
    let supplied = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    if supplied != Some(expected.as_str()) {
        debug!(path = %request.uri().path(), "rejected request without a valid API key");
        return StatusCode::UNAUTHORIZED.into_response();
    }
    next.run(request).await
}

/// `42.json` → `42`. Anything without the suffix is not a member route.
fn member_id(file: &str) -> Option<&str> {
    file.strip_suffix(".json")
}

fn unprocessable(errors: Vec<String>) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "errors": errors }))).into_response()
}

async fn list(kind: Kind, db: Db, query: HashMap<String, String>) -> Response {
    let limit = query
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);

    let store = db.read().await;
    let matching: Vec<&Map<String, Value>> = store
        .table(kind)
        .rows
        .values()
        .filter(|row| matches_filters(kind, row, &query))
        .collect();
    let total = matching.len();
    let page: Vec<Value> = matching
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|row| Value::Object(row.clone()))
        .collect();

    Json(json!({
        kind.plural(): page,
        "total_count": total,
        "offset": offset,
        "limit": limit
    }))
    .into_response()
}

fn field_text(row: &Map<String, Value>, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn matches_filters(kind: Kind, row: &Map<String, Value>, query: &HashMap<String, String>) -> bool {
    match kind {
        Kind::Issue => {
            if let Some(project) = query.get("project_id") {
                if field_text(row, "project_id").as_ref() != Some(project) {
                    return false;
                }
            }
            let closed = row.get("closed").and_then(Value::as_bool).unwrap_or(false);
            match query.get("status_id").map(String::as_str) {
                None | Some("open") => !closed,
                Some("closed") => closed,
                Some("*") => true,
                Some(id) => field_text(row, "status_id").as_deref() == Some(id),
            }
        }
        Kind::User => {
            let name_matches = query.get("name").map_or(true, |needle| {
                ["login", "firstname", "lastname", "mail"]
                    .iter()
                    .filter_map(|key| field_text(row, key))
                    .any(|value| value.to_lowercase().contains(&needle.to_lowercase()))
            });
            let status = query.get("status").map(String::as_str).unwrap_or("1");
            name_matches && field_text(row, "status").as_deref().unwrap_or("1") == status
        }
        Kind::Project => true,
    }
}

async fn create(kind: Kind, db: Db, body: Value) -> Response {
    let Some(Value::Object(fields)) = body.get(kind.singular()).cloned() else {
        return unprocessable(vec![format!("missing '{}' object", kind.singular())]);
    };

    let missing: Vec<String> = kind
        .required()
        .iter()
        .filter(|key| field_text(&fields, key).map_or(true, |v| v.is_empty()))
        .map(|key| format!("{key} cannot be blank"))
        .collect();
    if !missing.is_empty() {
        return unprocessable(missing);
    }

    let mut store = db.write().await;
    if kind == Kind::Project {
        let identifier = field_text(&fields, "identifier");
        let taken = store
            .projects
            .rows
            .values()
            .any(|row| field_text(row, "identifier") == identifier);
        if taken {
            return unprocessable(vec!["Identifier has already been taken".to_string()]);
        }
    }

    let mut record = fields;
    if kind == Kind::Issue {
        refresh_closed(&mut record);
    }
    let created = store.table_mut(kind).insert(record);
    debug!(kind = kind.singular(), id = ?created.get("id"), "created record");
    (StatusCode::CREATED, Json(json!({ kind.singular(): created }))).into_response()
}

/// Statuses 5 and 6 are Redmine's stock closed statuses.
fn refresh_closed(issue: &mut Map<String, Value>) {
    let closed = matches!(field_text(issue, "status_id").as_deref(), Some("5" | "6"));
    issue.insert("closed".to_string(), Value::Bool(closed));
}

/// Row key for a member id. Projects also answer to their identifier.
fn resolve_id(kind: Kind, table: &Table, id: &str) -> Option<u64> {
    if let Ok(id) = id.parse::<u64>() {
        return Some(id);
    }
    match kind {
        Kind::Project => table
            .rows
            .iter()
            .find(|(_, row)| field_text(row, "identifier").as_deref() == Some(id))
            .map(|(key, _)| *key),
        _ => None,
    }
}

async fn fetch(kind: Kind, db: Db, file: String, headers: HeaderMap) -> Response {
    let Some(id) = member_id(&file) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let store = db.read().await;

    if kind == Kind::User && id == "current" {
        let login = headers
            .get(SWITCH_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("admin");
        return match store.user_by_login(login) {
            Some(user) => Json(json!({ "user": user })).into_response(),
            // Redmine answers an unknown switch-user login with 412.
            None => StatusCode::PRECONDITION_FAILED.into_response(),
        };
    }

    let table = store.table(kind);
    match resolve_id(kind, table, id).and_then(|id| table.rows.get(&id)) {
        Some(row) => Json(json!({ kind.singular(): row })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn update(kind: Kind, db: Db, file: String, body: Value) -> Response {
    let Some(Value::Object(fields)) = body.get(kind.singular()).cloned() else {
        return unprocessable(vec![format!("missing '{}' object", kind.singular())]);
    };

    let mut store = db.write().await;
    let Some(id) = member_id(&file).and_then(|id| resolve_id(kind, store.table(kind), id)) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(row) = store.table_mut(kind).rows.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    for (key, value) in fields {
        row.insert(key, value);
    }
    if kind == Kind::Issue {
        refresh_closed(row);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn remove(kind: Kind, db: Db, file: String) -> Response {
    let mut store = db.write().await;
    let Some(id) = member_id(&file).and_then(|id| resolve_id(kind, store.table(kind), id)) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match store.table_mut(kind).rows.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
