#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tollgate::{
    ServerConfig,
    auth::{
        AUTHORIZATION_COOKIE_NAME, DEFAULT_PUBLIC_PREFIXES, Identity, IdentityResolver,
        ResolveError, encode_token,
    },
    create_app, create_app_with_identities,
    db::{Database, UserRole},
    jwt::{DEFAULT_TOKEN_TTL, JwtConfig},
    password::hash_password,
};

pub const TEST_SECRET: &[u8] = b"test-jwt-secret-for-testing-0123456789";

pub fn test_config(db: Database) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: TEST_SECRET.to_vec(),
        token_ttl: DEFAULT_TOKEN_TTL,
        public_prefixes: DEFAULT_PUBLIC_PREFIXES
            .iter()
            .map(|s| s.to_string())
            .collect(),
        resolve_timeout: Duration::from_secs(2),
        secure_cookies: false,
        login_attempts_per_minute: 100,
    }
}

/// JWT config sharing the test app's secret.
pub fn test_jwt() -> JwtConfig {
    JwtConfig::new(TEST_SECRET, DEFAULT_TOKEN_TTL)
}

/// Create a test app and return (app, db).
pub async fn create_test_app() -> (Router, Database) {
    let db = open_db().await;
    (create_app(&test_config(db.clone())), db)
}

/// Create a test app whose identity lookups are counted.
pub async fn create_counting_app() -> (Router, Database, Arc<CountingResolver>) {
    let db = open_db().await;
    let resolver = Arc::new(CountingResolver::new(db.clone()));
    let app = create_app_with_identities(&test_config(db.clone()), resolver.clone());
    (app, db, resolver)
}

pub async fn open_db() -> Database {
    Database::open(":memory:")
        .await
        .expect("Failed to open test database")
}

/// Create a user with a real bcrypt hash. Returns the user ID.
pub async fn create_user(db: &Database, username: &str, password: &str, role: UserRole) -> i64 {
    let hash = hash_password(password).expect("Failed to hash password");
    db.users()
        .create(username, &hash, role)
        .await
        .expect("Failed to create user")
}

/// Cookie header value carrying a prefixed token.
pub fn auth_cookie(token: &str) -> String {
    format!("{}={}", AUTHORIZATION_COOKIE_NAME, encode_token(token))
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/user/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "username={}&password={}",
            urlencoding::encode(username),
            urlencoding::encode(password)
        )))
        .unwrap()
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Decoded value of the token cookie set by a response, if any.
pub fn token_from_set_cookie(response: &Response<Body>) -> Option<String> {
    let prefix = format!("{}=", AUTHORIZATION_COOKIE_NAME);
    extract_set_cookies(response).into_iter().find_map(|c| {
        let pair = c.split(';').next()?.to_string();
        let value = pair.strip_prefix(&prefix)?;
        urlencoding::decode(value).ok().map(|v| v.into_owned())
    })
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Resolver backed by the user store that counts lookups.
pub struct CountingResolver {
    db: Database,
    calls: AtomicUsize,
}

impl CountingResolver {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityResolver for CountingResolver {
    async fn resolve(&self, subject: &str) -> Result<Identity, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.db.users().resolve(subject).await
    }
}
