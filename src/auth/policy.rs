//! Route access policy.

/// Login form page.
pub const LOGIN_PAGE_PATH: &str = "/api/user/login-page";

/// Login form submission.
pub const LOGIN_PATH: &str = "/api/user/login";

/// Where a successful login redirects.
pub const LOGIN_SUCCESS_PATH: &str = "/";

/// Where a failed login redirects.
pub const LOGIN_FAILURE_PATH: &str = "/api/user/login-page?error";

/// Prefixes reachable without a token unless configured otherwise.
pub const DEFAULT_PUBLIC_PREFIXES: &[&str] = &[
    "/api/user",
    "/css",
    "/js",
    "/images",
    "/webjars",
    "/favicon.ico",
];

/// Decides which paths are reachable without an identity.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    public_prefixes: Vec<String>,
}

impl RoutePolicy {
    pub fn new<I, S>(public_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            public_prefixes: public_prefixes
                .into_iter()
                .map(Into::into)
                .map(|p: String| p.trim_end_matches('/').to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Public paths skip token inspection entirely. The login routes are
    /// always public.
    pub fn is_public(&self, path: &str) -> bool {
        if path == LOGIN_PAGE_PATH || path == LOGIN_PATH {
            return true;
        }
        self.public_prefixes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_PREFIXES.iter().copied())
    }
}

/// Prefix match on a path segment boundary.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
