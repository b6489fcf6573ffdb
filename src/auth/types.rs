//! Authentication user types.

use super::resolver::Identity;
use crate::jwt::Claims;

/// Per-request authentication context, attached to the request extensions by
/// the authentication stage once the token and subject check out.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Resolved identity of the caller
    pub identity: Identity,
    /// Claims from the verified token
    pub claims: Claims,
}
