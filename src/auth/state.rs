//! Authentication state trait.

use std::time::Duration;

use super::policy::RoutePolicy;
use super::resolver::IdentityResolver;
use crate::jwt::JwtConfig;

/// Trait for state types that provide what the authentication stage needs.
pub trait HasAuthBackend {
    fn jwt(&self) -> &JwtConfig;
    fn identities(&self) -> &dyn IdentityResolver;
    fn policy(&self) -> &RoutePolicy;
    fn resolve_timeout(&self) -> Duration;
}
