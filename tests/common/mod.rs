#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use raftstore_cli::upload;

pub const USER: &str = "usr";
pub const PASSWORD: &str = "passwd";
pub const DB: &str = "testdb";
/// Database name for which every endpoint answers with a non-JSON body.
pub const GARBAGE_DB: &str = "garbage";

const OK: i64 = 0;
const INVALID_ARGUMENT: i64 = 1;
const OPERATION_ERROR: i64 = 2;

/// A request as seen by the fake server.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: String,
    pub db: Option<String>,
    pub op: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub authorization: Option<String>,
}

impl Recorded {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct FakeState {
    data: Mutex<BTreeMap<String, Vec<u8>>>,
    requests: Mutex<Vec<Recorded>>,
    credentials: Option<(String, String)>,
}

/// In-process stand-in for the raftstore HTTP service.
///
/// Runs an axum server on its own thread and tokio runtime, so blocking
/// clients in the test thread can talk to it.
pub struct FakeRaftStore {
    pub addr: SocketAddr,
    state: Arc<FakeState>,
}

impl FakeRaftStore {
    pub fn start() -> Self {
        Self::spawn(FakeState::default())
    }

    pub fn with_credentials(user: &str, password: &str) -> Self {
        Self::spawn(FakeState {
            credentials: Some((user.to_owned(), password.to_owned())),
            ..FakeState::default()
        })
    }

    fn spawn(state: FakeState) -> Self {
        let state = Arc::new(state);
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new()
            .route("/raftstore/api/v1/stat", any(stat))
            .route("/raftstore/api/:db/v1/:op", any(api))
            .with_state(state.clone());

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });

        FakeRaftStore { addr, state }
    }

    pub fn base_url(&self) -> String {
        self.db_url(DB)
    }

    pub fn db_url(&self, db: &str) -> String {
        format!("http://{}/raftstore/api/{}/v1/", self.addr, db)
    }

    pub fn insert(&self, key: &str, value: &[u8]) {
        self.state
            .data
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_vec());
    }

    pub fn value(&self, key: &str) -> Option<Vec<u8>> {
        self.state.data.lock().unwrap().get(key).cloned()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().pop().expect("no request recorded")
    }
}

fn envelope(body: Value) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        format!("{}\n", body),
    )
        .into_response()
}

fn status(code: i64, info: &str) -> Value {
    json!({ "code": code, "info": info })
}

/// Parameter lookup that ignores the casing of the name.
fn param(query: &[(String, String)], name: &str) -> String {
    query
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

fn authorized(state: &FakeState, headers: &HeaderMap) -> bool {
    match &state.credentials {
        None => true,
        Some((user, password)) => {
            let expected = format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password)));
            headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .map(|h| h == expected)
                .unwrap_or(false)
        }
    }
}

fn record(
    state: &FakeState,
    method: &Method,
    db: Option<String>,
    op: &str,
    headers: &HeaderMap,
    query: &[(String, String)],
    body: &str,
) {
    let recorded = Recorded {
        method: method.to_string(),
        db,
        op: op.to_owned(),
        query: query.to_vec(),
        body: serde_json::from_str(body).ok(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned),
    };
    state.requests.lock().unwrap().push(recorded);
}

async fn stat(
    State(state): State<Arc<FakeState>>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: String,
) -> Response {
    record(&state, &method, None, "stat", &headers, &query, &body);
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let keys = state.data.lock().unwrap().len();
    let client = param(&query, "client");
    envelope(json!({
        "code": OK,
        "info": "",
        "value": format!("client={} keys={}", client, keys),
    }))
}

async fn api(
    State(state): State<Arc<FakeState>>,
    Path((db, op)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: String,
) -> Response {
    record(&state, &method, Some(db.clone()), &op, &headers, &query, &body);
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if db == GARBAGE_DB {
        return (StatusCode::OK, "<html>upstream unavailable</html>").into_response();
    }

    match (method, op.as_str()) {
        (Method::GET, "get") => get_key(&state, &query),
        (Method::GET, "set") => set_key(&state, &query),
        (Method::POST, "set") => post_set(&state, &body),
        (Method::GET, "remove") => remove_key(&state, &query),
        (Method::GET, "range") => range(&state, &query),
        (Method::GET, "search") => search(&state, &query),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

fn get_key(state: &FakeState, query: &[(String, String)]) -> Response {
    let key = param(query, "key");
    let get_type = param(query, "type");
    let raw = get_type == "raw" || get_type == "deflate";

    if key.is_empty() || !["", "compact", "raw", "deflate"].contains(&get_type.as_str()) {
        if raw {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        return envelope(status(INVALID_ARGUMENT, "invalid argument"));
    }

    let value = state.data.lock().unwrap().get(&key).cloned();
    match (value, get_type.as_str()) {
        (None, "raw") | (None, "deflate") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        (None, _) => envelope(status(OPERATION_ERROR, "key not found")),
        (Some(value), "raw") => (StatusCode::OK, value).into_response(),
        (Some(value), "deflate") => (
            StatusCode::OK,
            [(header::CONTENT_ENCODING, "deflate")],
            upload::deflate(&value).unwrap(),
        )
            .into_response(),
        (Some(value), "compact") => envelope(json!({
            "code": OK,
            "info": "",
            "value": STANDARD.encode(upload::deflate(&value).unwrap()),
        })),
        (Some(value), _) => envelope(json!({
            "code": OK,
            "info": "",
            "value": String::from_utf8_lossy(&value),
        })),
    }
}

fn set_key(state: &FakeState, query: &[(String, String)]) -> Response {
    let key = param(query, "key");
    let value = param(query, "value");
    if key.is_empty() || value.is_empty() {
        return envelope(status(INVALID_ARGUMENT, "invalid argument"));
    }
    state.data.lock().unwrap().insert(key, value.into_bytes());
    envelope(status(OK, ""))
}

fn post_set(state: &FakeState, body: &str) -> Response {
    let root: Value = match serde_json::from_str(body) {
        Ok(root) => root,
        Err(_) => return envelope(status(INVALID_ARGUMENT, "bad json")),
    };
    let field = |name: &str| -> String {
        root.as_object()
            .and_then(|o| o.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)))
            .and_then(|(_, v)| v.as_str())
            .unwrap_or_default()
            .to_owned()
    };

    let get_type = field("type");
    let key = field("key");
    let value = field("value");
    let md5sum = field("md5sum");
    if key.is_empty() || value.is_empty() || md5sum.is_empty() || (!get_type.is_empty() && get_type != "compact") {
        return envelope(status(INVALID_ARGUMENT, "param error"));
    }

    let data = if get_type == "compact" {
        match upload::decode_compact(&value) {
            Ok(data) => data,
            Err(_) => return envelope(status(INVALID_ARGUMENT, "decode error")),
        }
    } else {
        value.into_bytes()
    };
    if data.is_empty() || !upload::content_hash(&data).eq_ignore_ascii_case(&md5sum) {
        return envelope(status(INVALID_ARGUMENT, "md5sum mismatch"));
    }

    state.data.lock().unwrap().insert(key, data);
    envelope(json!({ "code": OK, "info": "", "md5sum": md5sum }))
}

fn remove_key(state: &FakeState, query: &[(String, String)]) -> Response {
    let key = param(query, "key");
    if key.is_empty() {
        return envelope(status(INVALID_ARGUMENT, "invalid argument"));
    }
    match state.data.lock().unwrap().remove(&key) {
        Some(_) => envelope(status(OK, "")),
        None => envelope(status(OPERATION_ERROR, "key not found")),
    }
}

fn limited(keys: impl Iterator<Item = String>, limit: &str) -> Vec<String> {
    match limit.parse::<usize>() {
        Ok(limit) if limit > 0 => keys.take(limit).collect(),
        _ => keys.collect(),
    }
}

/// Like the real server, `value` is only present for a non-empty result.
fn list_envelope(keys: Vec<String>) -> Response {
    if keys.is_empty() {
        return envelope(status(OK, ""));
    }
    envelope(json!({
        "code": OK,
        "info": "",
        "value": Value::from(keys).to_string(),
    }))
}

fn range(state: &FakeState, query: &[(String, String)]) -> Response {
    let start = param(query, "start");
    let end = param(query, "end");
    let data = state.data.lock().unwrap();
    let keys = data
        .keys()
        .filter(|k| k.as_str() >= start.as_str())
        .filter(|k| end.is_empty() || k.as_str() < end.as_str())
        .cloned();
    list_envelope(limited(keys, &param(query, "limit")))
}

fn search(state: &FakeState, query: &[(String, String)]) -> Response {
    let term = param(query, "search");
    if term.is_empty() {
        return envelope(status(INVALID_ARGUMENT, "invalid argument"));
    }
    let data = state.data.lock().unwrap();
    let keys = data.keys().filter(|k| k.starts_with(&term)).cloned();
    list_envelope(limited(keys, &param(query, "limit")))
}
