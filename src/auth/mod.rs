//! Cookie-carried JWT authentication.
//!
//! Login issues a signed token that travels back in the `Authorization`
//! cookie. Every later request passes the logging and authentication
//! stages; non-public paths only reach their handler with a resolved
//! identity attached.

mod cookie;
mod errors;
mod extractors;
mod middleware;
mod policy;
mod resolver;
mod state;
mod types;

pub use cookie::{
    AUTHORIZATION_COOKIE_NAME, BEARER_PREFIX, attach_token, encode_token, extract_token,
    get_cookie, strip_bearer, token_cookie,
};
pub use errors::{AuthErrorKind, AuthRejection, LoginErrorKind};
pub use extractors::Auth;
pub use middleware::{authenticate, authenticate_request, log_request};
pub use policy::{
    DEFAULT_PUBLIC_PREFIXES, LOGIN_FAILURE_PATH, LOGIN_PAGE_PATH, LOGIN_PATH, LOGIN_SUCCESS_PATH,
    RoutePolicy,
};
pub use resolver::{Identity, IdentityResolver, ResolveError, resolve_with_timeout};
pub use state::HasAuthBackend;
pub use types::AuthenticatedUser;
