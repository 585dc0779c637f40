//! End-to-end session flows against an in-process fake of the dashboard API.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;

use dalli::state::guard::{GuardDecision, SIGN_IN_PATH};
use dalli::state::users::{NoticeKind, UsersScreen};
use dalli::i18n::Language;
use dalli::storage::TOKEN_KEY;
use dalli::{ClientConfig, FileStore, HttpApi, KeyValueStore, MemoryStore, RouteGuard, SessionStore, UserForm};

// =============================================================================
// FAKE API
// =============================================================================

#[derive(Clone)]
struct Account {
    id: i64,
    email: String,
    name: String,
    password: String,
    role: &'static str,
}

#[derive(Default)]
struct FakeDb {
    accounts: Vec<Account>,
    tokens: HashMap<String, String>,
    /// Simulates a registration that is not yet visible to login.
    reject_logins: bool,
}

type Db = Arc<Mutex<FakeDb>>;

fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    let mut s = String::with_capacity(32);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn unauthorized() -> Response {
    detail(StatusCode::UNAUTHORIZED, "Could not validate credentials")
}

fn account_json(a: &Account) -> serde_json::Value {
    json!({
        "id": a.id,
        "email": a.email,
        "name": a.name,
        "role": a.role,
        "is_active": true,
        "created_at": "2024-01-01T00:00:00",
    })
}

fn bearer_email(db: &FakeDb, headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ")?;
    db.tokens.get(token).cloned()
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct UserBody {
    name: String,
    email: String,
    password: String,
}

async fn login(State(db): State<Db>, Json(body): Json<LoginBody>) -> Response {
    let mut db = db.lock().unwrap();
    let ok = !db.reject_logins
        && db.accounts.iter().any(|a| a.email == body.email && a.password == body.password);
    if !ok {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect email or password");
    }
    let token = generate_token();
    db.tokens.insert(token.clone(), body.email);
    Json(json!({ "access_token": token, "token_type": "bearer" })).into_response()
}

fn insert_account(db: &mut FakeDb, body: UserBody) -> Result<Account, Response> {
    if db.accounts.iter().any(|a| a.email == body.email) {
        return Err(detail(StatusCode::BAD_REQUEST, "Email already registered"));
    }
    let id = db.accounts.iter().map(|a| a.id).max().unwrap_or(0) + 1;
    let account = Account { id, email: body.email, name: body.name, password: body.password, role: "user" };
    db.accounts.push(account.clone());
    Ok(account)
}

async fn register(State(db): State<Db>, Json(body): Json<UserBody>) -> Response {
    let mut db = db.lock().unwrap();
    match insert_account(&mut db, body) {
        Ok(account) => (StatusCode::CREATED, Json(account_json(&account))).into_response(),
        Err(resp) => resp,
    }
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> Response {
    let db = db.lock().unwrap();
    let Some(email) = bearer_email(&db, &headers) else {
        return unauthorized();
    };
    match db.accounts.iter().find(|a| a.email == email) {
        Some(a) => Json(json!({ "id": a.id, "email": a.email, "name": a.name, "is_active": true })).into_response(),
        None => unauthorized(),
    }
}

async fn list_users(State(db): State<Db>, headers: HeaderMap) -> Response {
    let db = db.lock().unwrap();
    if bearer_email(&db, &headers).is_none() {
        return unauthorized();
    }
    let rows: Vec<_> = db.accounts.iter().map(account_json).collect();
    Json(rows).into_response()
}

async fn create_user(State(db): State<Db>, headers: HeaderMap, Json(body): Json<UserBody>) -> Response {
    let mut db = db.lock().unwrap();
    if bearer_email(&db, &headers).is_none() {
        return unauthorized();
    }
    match insert_account(&mut db, body) {
        Ok(account) => Json(account_json(&account)).into_response(),
        Err(resp) => resp,
    }
}

async fn update_user(
    State(db): State<Db>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<UserBody>,
) -> Response {
    let mut db = db.lock().unwrap();
    if bearer_email(&db, &headers).is_none() {
        return unauthorized();
    }
    let Some(account) = db.accounts.iter_mut().find(|a| a.id == id) else {
        return detail(StatusCode::NOT_FOUND, "User not found");
    };
    account.name = body.name;
    account.email = body.email;
    if !body.password.is_empty() {
        account.password = body.password;
    }
    let updated = account.clone();
    Json(account_json(&updated)).into_response()
}

async fn delete_user(State(db): State<Db>, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    let mut db = db.lock().unwrap();
    if bearer_email(&db, &headers).is_none() {
        return unauthorized();
    }
    let before = db.accounts.len();
    db.accounts.retain(|a| a.id != id);
    if db.accounts.len() == before {
        return detail(StatusCode::NOT_FOUND, "User not found");
    }
    Json(json!({ "message": "User deleted successfully" })).into_response()
}

/// Start the fake API with one seeded account; returns its base URL.
async fn spawn_fake_api() -> (String, Db) {
    let db: Db = Arc::new(Mutex::new(FakeDb {
        accounts: vec![Account {
            id: 1,
            email: "a@b.com".into(),
            name: "A".into(),
            password: "pw".into(),
            role: "admin",
        }],
        ..FakeDb::default()
    }));

    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/me", get(me))
        .route("/api/users/", get(list_users).post(create_user))
        .route("/api/users/{id}", put(update_user).delete(delete_user))
        .with_state(db.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), db)
}

fn http_api(base_url: &str) -> Arc<HttpApi> {
    Arc::new(HttpApi::new(&ClientConfig::new(base_url).unwrap()).unwrap())
}

// =============================================================================
// SESSION SCENARIOS
// =============================================================================

#[tokio::test]
async fn login_persists_token_and_opens_dashboard() {
    let (url, _db) = spawn_fake_api().await;
    let api = http_api(&url);
    let storage = Arc::new(MemoryStore::new());
    let store = SessionStore::new(api.clone(), storage.clone());
    let guard = RouteGuard::new(store.clone());

    store.login("a@b.com", "pw").await.unwrap();

    let token = storage.get(TOKEN_KEY).unwrap();
    assert_eq!(store.token().as_deref(), Some(token.as_str()));
    assert_eq!(api.default_bearer().as_deref(), Some(token.as_str()));
    assert!(store.is_authenticated());
    assert_eq!(store.user().unwrap().email, "a@b.com");
    assert_eq!(guard.check("/dashboard"), GuardDecision::Allow);
}

#[tokio::test]
async fn rejected_credentials_surface_server_detail() {
    let (url, _db) = spawn_fake_api().await;
    let storage = Arc::new(MemoryStore::new());
    let store = SessionStore::new(http_api(&url), storage.clone());

    let err = store.login("a@b.com", "nope").await.unwrap_err();

    assert_eq!(err.detail(), Some("Incorrect email or password"));
    assert!(!store.is_authenticated());
    assert_eq!(storage.get(TOKEN_KEY), None);
}

#[tokio::test]
async fn stale_persisted_token_is_cleared_on_hydration() {
    let (url, _db) = spawn_fake_api().await;
    let storage = Arc::new(MemoryStore::with_entries([(TOKEN_KEY, "T0")]));
    let store = SessionStore::new(http_api(&url), storage.clone());
    let guard = RouteGuard::new(store.clone());

    store.hydrate().await;

    assert_eq!(storage.get(TOKEN_KEY), None);
    assert!(!store.is_authenticated());
    assert_eq!(guard.check("/dashboard"), GuardDecision::Redirect(SIGN_IN_PATH));
}

#[tokio::test]
async fn session_survives_restart_through_file_store() {
    let (url, _db) = spawn_fake_api().await;
    let dir = std::env::temp_dir().join(format!("dalli-it-restart-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    {
        let storage = Arc::new(FileStore::open(&dir).unwrap());
        let store = SessionStore::new(http_api(&url), storage);
        store.login("a@b.com", "pw").await.unwrap();
        assert!(store.is_authenticated());
    }

    let storage = Arc::new(FileStore::open(&dir).unwrap());
    let store = SessionStore::new(http_api(&url), storage);
    assert!(!store.is_authenticated());
    store.hydrate().await;
    assert!(store.is_authenticated());
    assert_eq!(store.user().unwrap().name, "A");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn register_signs_in_new_account() {
    let (url, _db) = spawn_fake_api().await;
    let storage = Arc::new(MemoryStore::new());
    let store = SessionStore::new(http_api(&url), storage.clone());

    store.register("New", "new@b.com", "pw2").await.unwrap();

    assert!(store.is_authenticated());
    assert_eq!(store.user().unwrap().name, "New");
    assert!(storage.get(TOKEN_KEY).is_some());
}

#[tokio::test]
async fn register_duplicate_email_is_rejected() {
    let (url, _db) = spawn_fake_api().await;
    let store = SessionStore::new(http_api(&url), Arc::new(MemoryStore::new()));

    let err = store.register("Dup", "a@b.com", "pw").await.unwrap_err();

    assert_eq!(err.detail(), Some("Email already registered"));
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn register_ok_but_login_rejected_propagates() {
    let (url, db) = spawn_fake_api().await;
    db.lock().unwrap().reject_logins = true;
    let storage = Arc::new(MemoryStore::new());
    let store = SessionStore::new(http_api(&url), storage.clone());

    let err = store.register("A2", "a2@b.com", "pw").await.unwrap_err();

    assert_eq!(err.detail(), Some("Incorrect email or password"));
    assert_eq!(storage.get(TOKEN_KEY), None);
    assert!(db.lock().unwrap().accounts.iter().any(|a| a.email == "a2@b.com"));
}

// =============================================================================
// USERS SCREEN
// =============================================================================

#[tokio::test]
async fn users_screen_crud_uses_session_bearer() {
    let (url, _db) = spawn_fake_api().await;
    let api = http_api(&url);
    let store = SessionStore::new(api.clone(), Arc::new(MemoryStore::new()));
    store.login("a@b.com", "pw").await.unwrap();

    let mut screen = UsersScreen::new(api.clone(), Language::En);
    assert!(screen.refresh().await);
    assert_eq!(screen.users().len(), 1);
    assert!(screen.users()[0].is_admin());

    screen.open_create();
    *screen.form_mut() = UserForm { name: "B".into(), email: "b@b.com".into(), password: "pw".into() };
    assert!(screen.submit().await);
    assert_eq!(screen.users().len(), 2);

    let new_id = screen.users()[1].id;
    assert!(screen.open_edit(new_id));
    screen.form_mut().name = "Bee".into();
    assert!(screen.submit().await);
    assert_eq!(screen.users()[1].name, "Bee");

    assert!(screen.delete(new_id).await);
    assert_eq!(screen.users().len(), 1);
    assert_eq!(screen.notice().unwrap().kind, NoticeKind::Success);
}

#[tokio::test]
async fn users_screen_after_logout_reports_error_without_touching_session() {
    let (url, _db) = spawn_fake_api().await;
    let api = http_api(&url);
    let store = SessionStore::new(api.clone(), Arc::new(MemoryStore::new()));
    store.login("a@b.com", "pw").await.unwrap();
    store.logout();

    let mut screen = UsersScreen::new(api.clone(), Language::En);
    assert!(!screen.refresh().await);

    let notice = screen.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Danger);
    assert_eq!(notice.message, "Could not validate credentials");
    assert!(!store.is_authenticated());
}
