//! Request interceptor stages.
//!
//! Applied to every request in a fixed order: [`log_request`] first, then
//! [`authenticate`]. Each stage either delegates to the rest of the chain or
//! ends it with a response.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use super::cookie::{extract_token, strip_bearer};
use super::errors::{AuthErrorKind, AuthRejection};
use super::resolver::resolve_with_timeout;
use super::state::HasAuthBackend;
use super::types::AuthenticatedUser;

/// Stage 1: record the request path before delegating and a completion
/// marker once the rest of the chain, handler included, has returned.
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    info!(%method, %path, "Request received");

    let response = next.run(request).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        "Request completed"
    );

    response
}

/// Stage 2: public paths pass straight through. Everything else must carry a
/// valid token for a known subject; the resolved user is attached to the
/// request extensions before delegating.
pub async fn authenticate<S>(State(state): State<S>, mut request: Request, next: Next) -> Response
where
    S: HasAuthBackend + Clone + Send + Sync + 'static,
{
    if state.policy().is_public(request.uri().path()) {
        return next.run(request).await;
    }

    match authenticate_request(request.headers(), &state).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(kind) => {
            let rejection = AuthRejection::new(kind);
            warn!(
                path = %request.uri().path(),
                reason = %rejection.kind(),
                "Authentication rejected"
            );
            rejection.into_response()
        }
    }
}

/// Token extraction, verification and subject lookup, in that order. The
/// first failure ends the check.
pub async fn authenticate_request<S>(
    headers: &HeaderMap,
    state: &S,
) -> Result<AuthenticatedUser, AuthErrorKind>
where
    S: HasAuthBackend + Send + Sync,
{
    let raw = extract_token(headers).ok_or(AuthErrorKind::NoTokenPresented)?;

    let body = strip_bearer(&raw).map_err(|_| AuthErrorKind::TokenMalformed)?;

    let claims = state
        .jwt()
        .verify(body)
        .map_err(AuthErrorKind::TokenInvalid)?;

    let identity = resolve_with_timeout(state.identities(), &claims.sub, state.resolve_timeout())
        .await
        .map_err(AuthErrorKind::UnknownSubject)?;

    Ok(AuthenticatedUser { identity, claims })
}
