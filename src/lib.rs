pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit;

use api::{AppState, create_api_router};
use auth::{IdentityResolver, RoutePolicy, authenticate, log_request};
use axum::{Router, http::StatusCode, middleware};
use db::Database;
use jwt::JwtConfig;
use rate_limit::RateLimitConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;

/// Default bound on a single identity lookup.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Decoded JWT signing secret
    pub jwt_secret: Vec<u8>,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
    /// Path prefixes reachable without a token
    pub public_prefixes: Vec<String>,
    /// Upper bound on a single identity lookup
    pub resolve_timeout: Duration,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
    /// Login submissions allowed per client IP per minute
    pub login_attempts_per_minute: u32,
}

/// Create the application router, resolving identities from the database.
pub fn create_app(config: &ServerConfig) -> Router {
    create_app_with_identities(config, Arc::new(config.db.users()))
}

/// Create the application router with a custom identity resolver.
pub fn create_app_with_identities(
    config: &ServerConfig,
    identities: Arc<dyn IdentityResolver>,
) -> Router {
    password::prepare_dummy_hash();

    let state = AppState {
        jwt: Arc::new(JwtConfig::new(&config.jwt_secret, config.token_ttl)),
        identities,
        policy: Arc::new(RoutePolicy::new(config.public_prefixes.iter().cloned())),
        resolve_timeout: config.resolve_timeout,
        secure_cookies: config.secure_cookies,
        rate_limit_config: Arc::new(RateLimitConfig::new(config.login_attempts_per_minute)),
    };

    // Layers listed outermost first: logging wraps authentication, which
    // wraps every route and the fallback.
    create_api_router(state.clone())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(log_request))
                .layer(middleware::from_fn_with_state(
                    state,
                    authenticate::<AppState>,
                )),
        )
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
