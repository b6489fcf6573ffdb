mod profile;
mod user;

use axum::Router;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{HasAuthBackend, IdentityResolver, RoutePolicy};
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitConfig;

/// State shared by the authentication stage and the handlers.
#[derive(Clone)]
pub struct AppState {
    pub jwt: Arc<JwtConfig>,
    pub identities: Arc<dyn IdentityResolver>,
    pub policy: Arc<RoutePolicy>,
    pub resolve_timeout: Duration,
    pub secure_cookies: bool,
    pub rate_limit_config: Arc<RateLimitConfig>,
}

impl HasAuthBackend for AppState {
    fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }

    fn identities(&self) -> &dyn IdentityResolver {
        self.identities.as_ref()
    }

    fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    fn resolve_timeout(&self) -> Duration {
        self.resolve_timeout
    }
}

/// Create the router with every route; the interceptor stages are layered
/// on top by the caller.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/user", user::router(state))
        .merge(profile::router())
}
