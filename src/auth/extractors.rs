//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::{AuthErrorKind, AuthRejection};
use super::types::AuthenticatedUser;

/// Extractor for handlers behind the authentication stage.
/// Reads the identity the stage attached; rejects with 401 if there is none
/// (e.g. the handler was mounted on a public path).
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| AuthRejection::new(AuthErrorKind::NoTokenPresented))
    }
}
