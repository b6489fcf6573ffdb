//! Protected endpoints exposing the caller's identity.
//!
//! - GET `/` - Greeting page
//! - GET `/api/me` - Current identity as JSON

use axum::{
    Json, Router,
    response::{Html, IntoResponse},
    routing::get,
};
use serde::Serialize;

use crate::auth::Auth;
use crate::db::UserRole;

pub fn router() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/me", get(me))
}

#[derive(Serialize)]
struct MeResponse {
    username: String,
    role: UserRole,
    issued_at: u64,
    expires_at: u64,
}

async fn me(Auth(user): Auth) -> impl IntoResponse {
    Json(MeResponse {
        username: user.identity.username,
        role: user.identity.role,
        issued_at: user.claims.iat,
        expires_at: user.claims.exp,
    })
}

async fn home(Auth(user): Auth) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html><html><body><p>Signed in as {}</p></body></html>",
        escape_html(&user.identity.username)
    ))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
