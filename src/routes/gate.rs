//! Access gate — request-time auth enforcement and security headers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs ahead of every handler. Redirect decisions and header injection are
//! pure functions; the middleware itself only does session resolution and
//! response plumbing. A session-check failure is treated as "no session",
//! failing closed toward the login redirect. Static asset paths skip the
//! gate entirely.

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::services::identity::User;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session_token";

pub const LOGIN_PATH: &str = "/login";
pub const VAULT_PATH: &str = "/vault";

/// Fixed header set attached to every non-asset response, redirects included.
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("X-XSS-Protection", "1; mode=block"),
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("Referrer-Policy", "strict-origin-when-cross-origin"),
    (
        "Content-Security-Policy",
        "default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; \
         img-src 'self' data: blob: https:; font-src 'self' data:; connect-src 'self'; \
         media-src 'self' blob:; object-src 'none'; base-uri 'self'; form-action 'self'; \
         frame-ancestors 'none'; upgrade-insecure-requests",
    ),
    ("Strict-Transport-Security", "max-age=31536000; includeSubDomains; preload"),
    (
        "Permissions-Policy",
        "camera=(), microphone=(), geolocation=(), payment=(), usb=(), magnetometer=(), gyroscope=(), accelerometer=()",
    ),
    ("Cross-Origin-Embedder-Policy", "require-corp"),
    ("Cross-Origin-Opener-Policy", "same-origin"),
    ("Cross-Origin-Resource-Policy", "same-origin"),
];

// =============================================================================
// DECISIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Protected,
    Login,
    Asset,
    Other,
}

#[must_use]
pub fn classify_path(path: &str) -> PathClass {
    if is_asset_path(path) {
        PathClass::Asset
    } else if path == LOGIN_PATH {
        PathClass::Login
    } else if path == VAULT_PATH || path.starts_with("/vault/") {
        PathClass::Protected
    } else {
        PathClass::Other
    }
}

fn is_asset_path(path: &str) -> bool {
    const ASSET_EXTENSIONS: &[&str] = &[".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp", ".ico", ".css", ".js"];
    path.starts_with("/assets/")
        || path == "/favicon.ico"
        || ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    Allow,
    RedirectToLogin,
    RedirectToVault,
}

/// The decision table from the route contract: protected paths require a
/// session, the login path rejects one, everything else passes.
#[must_use]
pub fn gate_action(class: PathClass, has_session: bool) -> GateAction {
    match (class, has_session) {
        (PathClass::Protected, false) => GateAction::RedirectToLogin,
        (PathClass::Login, true) => GateAction::RedirectToVault,
        _ => GateAction::Allow,
    }
}

/// Whether the gate's decision for this path class depends on the session.
/// Classes that pass through either way never cost a provider round trip.
#[must_use]
pub fn needs_session(class: PathClass) -> bool {
    matches!(class, PathClass::Protected | PathClass::Login)
}

/// Attach the fixed header set. Existing values are overwritten.
pub fn apply_security_headers(response: &mut Response) {
    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(*name, HeaderValue::from_static(value));
    }
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Identity resolved by the gate, stashed on the request so downstream
/// extractors reuse it instead of validating the token a second time.
#[derive(Clone)]
pub struct ResolvedSession {
    pub user: User,
    pub token: String,
}

pub async fn access_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let class = classify_path(request.uri().path());
    if class == PathClass::Asset {
        return next.run(request).await;
    }

    let mut response = if needs_session(class) {
        let jar = CookieJar::from_headers(request.headers());
        let token = jar
            .get(SESSION_COOKIE)
            .map(Cookie::value)
            .unwrap_or_default()
            .to_owned();
        let user = resolve_session(&state, &token).await;

        match gate_action(class, user.is_some()) {
            GateAction::Allow => {
                if let Some(user) = user {
                    request.extensions_mut().insert(ResolvedSession { user, token });
                }
                next.run(request).await
            }
            GateAction::RedirectToLogin => Redirect::temporary(LOGIN_PATH).into_response(),
            GateAction::RedirectToVault => Redirect::temporary(VAULT_PATH).into_response(),
        }
    } else {
        next.run(request).await
    };
    apply_security_headers(&mut response);
    response
}

/// Validate the request's token with the identity provider. Any failure is
/// "no session".
async fn resolve_session(state: &AppState, token: &str) -> Option<User> {
    if token.is_empty() {
        return None;
    }
    match state.identity.get_user(token).await {
        Ok(user) => user,
        Err(error) => {
            tracing::warn!(%error, "session check failed; treating as unauthenticated");
            None
        }
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
