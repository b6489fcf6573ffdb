//! Authentication error types.

use axum::{
    Json,
    http::{StatusCode, header::InvalidHeaderValue},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::resolver::ResolveError;
use crate::jwt::JwtError;

/// Why a request was rejected by the authentication stage.
///
/// The sub-kind is logged; callers only ever see [`AuthRejection`].
#[derive(Debug)]
pub enum AuthErrorKind {
    NoTokenPresented,
    TokenMalformed,
    TokenInvalid(JwtError),
    UnknownSubject(ResolveError),
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthErrorKind::NoTokenPresented => write!(f, "No token presented"),
            AuthErrorKind::TokenMalformed => write!(f, "Token missing scheme prefix"),
            AuthErrorKind::TokenInvalid(e) => write!(f, "Token invalid: {}", e),
            AuthErrorKind::UnknownSubject(e) => write!(f, "Unknown subject: {}", e),
        }
    }
}

impl std::error::Error for AuthErrorKind {}

/// Why a login attempt failed. Every kind redirects to the same failure page.
#[derive(Debug)]
pub enum LoginErrorKind {
    CredentialMismatch,
    StoreUnavailable(ResolveError),
    TokenIssue(JwtError),
    TokenCookie(InvalidHeaderValue),
}

impl std::fmt::Display for LoginErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginErrorKind::CredentialMismatch => write!(f, "Credential mismatch"),
            LoginErrorKind::StoreUnavailable(e) => write!(f, "User lookup failed: {}", e),
            LoginErrorKind::TokenIssue(e) => write!(f, "Failed to issue token: {}", e),
            LoginErrorKind::TokenCookie(e) => write!(f, "Failed to build token cookie: {}", e),
        }
    }
}

impl std::error::Error for LoginErrorKind {}

/// Generic 401 returned for every authentication failure.
#[derive(Debug)]
pub struct AuthRejection {
    pub(super) kind: AuthErrorKind,
}

impl AuthRejection {
    pub fn new(kind: AuthErrorKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> &AuthErrorKind {
        &self.kind
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Authentication required",
            }),
        )
            .into_response()
    }
}
