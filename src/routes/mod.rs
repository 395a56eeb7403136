//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every request passes the access gate before any handler runs; static
//! assets under `/assets` are recognized inside the gate and pass through
//! untouched. The landing page only redirects — the real surfaces are the
//! login form and the protected vault view.

pub mod auth;
pub mod gate;
pub mod vault;

use std::path::PathBuf;

use axum::Router;
use axum::extract::State;
use axum::middleware;
use axum::response::Redirect;
use axum::routing::{get, post};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/login", get(auth::login_form).post(auth::login_submit))
        .route("/logout", post(auth::logout))
        .route("/vault", get(vault::dashboard))
        .route("/vault/{*rest}", get(vault::dashboard))
        .nest_service("/assets", ServeDir::new(assets_dir()))
        .layer(middleware::from_fn_with_state(state.clone(), gate::access_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /` — authenticated visitors land on the vault, everyone else on the
/// login form.
async fn landing(State(state): State<AppState>, jar: CookieJar) -> Redirect {
    let token = jar.get(gate::SESSION_COOKIE).map(Cookie::value).unwrap_or_default();
    let signed_in = !token.is_empty() && matches!(state.identity.get_user(token).await, Ok(Some(_)));
    if signed_in {
        Redirect::to(gate::VAULT_PATH)
    } else {
        Redirect::to(gate::LOGIN_PATH)
    }
}

/// Resolve the static asset directory.
fn assets_dir() -> PathBuf {
    std::env::var("ASSETS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"))
}
