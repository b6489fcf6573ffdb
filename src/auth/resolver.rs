//! Subject → identity lookup.

use async_trait::async_trait;
use std::time::Duration;

use crate::db::UserRole;

/// Authoritative view of an authenticated caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    /// Opaque password hash, only compared at login.
    pub password_hash: String,
    pub role: UserRole,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Maps a token subject to an identity. Implemented by the user store; any
/// other backing store can be swapped in.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, subject: &str) -> Result<Identity, ResolveError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    NotFound,
    Store(String),
    Timeout,
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::NotFound => write!(f, "Subject not found"),
            ResolveError::Store(e) => write!(f, "Identity store error: {}", e),
            ResolveError::Timeout => write!(f, "Identity lookup timed out"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Resolve a subject, giving up after `timeout`.
///
/// The lookup future is dropped on timeout, cancelling it.
pub async fn resolve_with_timeout(
    resolver: &dyn IdentityResolver,
    subject: &str,
    timeout: Duration,
) -> Result<Identity, ResolveError> {
    tokio::time::timeout(timeout, resolver.resolve(subject))
        .await
        .map_err(|_| ResolveError::Timeout)?
}
