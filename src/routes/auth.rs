//! Login routes — credential form, sign-in submission, sign-out.

use std::fmt::Write;

use askama::Template;
use axum::Form;
use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::Rng;
use serde::Deserialize;
use time::Duration;

use crate::routes::gate::{LOGIN_PATH, ResolvedSession, SESSION_COOKIE, VAULT_PATH};
use crate::services::identity::User;
use crate::state::AppState;
use crate::templates::LoginTemplate;

/// Scopes the attempt counter to one rendered login view.
const LOGIN_VIEW_COOKIE: &str = "login_view";

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

pub(crate) fn cookie_secure() -> bool {
    env_bool("COOKIE_SECURE").unwrap_or(false)
}

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Random 16-byte hex token naming one login view's attempt scope.
#[must_use]
pub(crate) fn generate_view_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes_to_hex(&bytes)
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated admin extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        // The gate already validated protected requests; reuse its answer.
        if let Some(resolved) = parts.extensions.get::<ResolvedSession>() {
            return Ok(Self { user: resolved.user.clone(), token: resolved.token.clone() });
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(Redirect::temporary(LOGIN_PATH));
        }

        let app_state = AppState::from_ref(state);
        let user = match app_state.identity.get_user(token).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(Redirect::temporary(LOGIN_PATH)),
            Err(error) => {
                // Fail closed: an unreachable provider means no session.
                tracing::warn!(%error, "session check failed; treating as unauthenticated");
                return Err(Redirect::temporary(LOGIN_PATH));
            }
        };

        Ok(Self { user, token: token.to_owned() })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /login` — mint a fresh attempt scope and render the credential form.
pub async fn login_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    // A reload tears the old view down; its counter goes with it.
    if let Some(cookie) = jar.get(LOGIN_VIEW_COOKIE) {
        state.attempts.reset(cookie.value());
    }

    let view_cookie = Cookie::build((LOGIN_VIEW_COOKIE, generate_view_token()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cookie_secure());
    let jar = jar.add(view_cookie);

    (jar, render_login(&LoginTemplate::fresh())).into_response()
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// `POST /login` — submit credentials.
///
/// A saturated view is rejected before any provider contact. A credential
/// failure yields one generic denial message whatever the cause, keeps the
/// email, and never echoes the password.
pub async fn login_submit(State(state): State<AppState>, jar: CookieJar, Form(form): Form<LoginForm>) -> Response {
    let view_id = jar
        .get(LOGIN_VIEW_COOKIE)
        .map(Cookie::value)
        .unwrap_or_default()
        .to_owned();

    if state.attempts.check(&view_id).is_err() {
        return render_login(&LoginTemplate::blocked(&form.email));
    }

    match state
        .session
        .sign_in(state.identity.as_ref(), &form.email, &form.password)
        .await
    {
        Ok(session) => {
            state.attempts.reset(&view_id);
            tracing::info!(user = %session.user.id, "admin sign-in");

            let session_cookie = Cookie::build((SESSION_COOKIE, session.access_token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(cookie_secure());
            let clear_view_cookie = Cookie::build((LOGIN_VIEW_COOKIE, ""))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(cookie_secure())
                .max_age(Duration::ZERO);

            let jar = jar.add(session_cookie).add(clear_view_cookie);
            (jar, Redirect::to(VAULT_PATH)).into_response()
        }
        Err(error) => {
            tracing::warn!(%error, "sign-in rejected");
            let count = state.attempts.record_failure(&view_id);
            if count >= state.attempts.max() {
                render_login(&LoginTemplate::blocked(&form.email))
            } else {
                render_login(&LoginTemplate::denied(&form.email))
            }
        }
    }
}

/// `POST /logout` — terminate the provider session, clear local state and
/// the cookie, land back on the login form.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    state.session.sign_out(state.identity.as_ref(), &auth.token).await;
    state.attempts.reset_all();

    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cookie_secure())
        .max_age(Duration::ZERO);

    let jar = CookieJar::new().add(cookie);
    (jar, Redirect::to(LOGIN_PATH))
}

fn render_login(template: &LoginTemplate) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(error) => {
            tracing::error!(%error, "login template render failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
