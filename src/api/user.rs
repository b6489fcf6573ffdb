//! Login endpoints.
//!
//! - GET `/login-page` - Login form
//! - POST `/login` - Verify credentials, set the token cookie, redirect

use axum::{
    Form, Router,
    extract::{RawQuery, State},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::AppState;
use crate::auth::{
    Identity, LOGIN_FAILURE_PATH, LOGIN_PATH, LOGIN_SUCCESS_PATH, LoginErrorKind, ResolveError,
    attach_token, resolve_with_timeout,
};
use crate::password::{verify_dummy, verify_password};
use crate::rate_limit::rate_limit_login;

pub fn router(state: AppState) -> Router {
    let login_router = Router::new()
        .route("/login", post(login))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config,
            rate_limit_login,
        ));

    Router::new()
        .route("/login-page", get(login_page))
        .merge(login_router)
}

async fn login_page(RawQuery(query): RawQuery) -> Html<String> {
    let failed = query
        .as_deref()
        .is_some_and(|q| q.split('&').any(|pair| pair.split('=').next() == Some("error")));

    let banner = if failed {
        r#"<p class="error">Invalid username or password</p>"#
    } else {
        ""
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Login</title></head>
<body>
<h1>Login</h1>
{banner}
<form method="post" action="{action}">
<label>Username <input type="text" name="username" autocomplete="username" required></label>
<label>Password <input type="password" name="password" autocomplete="current-password" required></label>
<button type="submit">Log in</button>
</form>
</body>
</html>"#,
        banner = banner,
        action = LOGIN_PATH,
    ))
}

/// Missing fields deserialize as empty and fail the credential check.
#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let username = form.username.trim().to_string();

    let identity = match verify_credentials(&state, &username, form.password).await {
        Ok(identity) => identity,
        Err(kind) => return login_failed(&username, kind),
    };

    let issued = match state.jwt.issue(&identity.username, identity.role) {
        Ok(issued) => issued,
        Err(e) => return login_failed(&username, LoginErrorKind::TokenIssue(e)),
    };

    let mut response = Redirect::to(LOGIN_SUCCESS_PATH).into_response();
    if let Err(e) = attach_token(&mut response, &issued, state.secure_cookies) {
        return login_failed(&username, LoginErrorKind::TokenCookie(e));
    }

    info!(username = %identity.username, role = %identity.role, "Login succeeded");
    response
}

/// Look the user up and check the password. Unknown users are checked
/// against a dummy hash and reported exactly like a wrong password.
async fn verify_credentials(
    state: &AppState,
    username: &str,
    password: String,
) -> Result<Identity, LoginErrorKind> {
    let lookup =
        resolve_with_timeout(state.identities.as_ref(), username, state.resolve_timeout).await;

    let identity = match lookup {
        Ok(identity) => Some(identity),
        Err(ResolveError::NotFound) => None,
        Err(e) => return Err(LoginErrorKind::StoreUnavailable(e)),
    };

    let hash = identity.as_ref().map(|i| i.password_hash.clone());
    let matches = tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => verify_dummy(&password),
    })
    .await
    .unwrap_or(false);

    match identity {
        Some(identity) if matches => Ok(identity),
        _ => Err(LoginErrorKind::CredentialMismatch),
    }
}

fn login_failed(username: &str, kind: LoginErrorKind) -> Response {
    match kind {
        LoginErrorKind::CredentialMismatch => {
            warn!(username = %username, reason = %kind, "Login failed")
        }
        _ => error!(username = %username, reason = %kind, "Login failed"),
    }
    Redirect::to(LOGIN_FAILURE_PATH).into_response()
}
