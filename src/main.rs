mod attempts;
mod config;
mod routes;
mod services;
mod state;
mod templates;

use std::sync::Arc;

use crate::services::identity::HttpIdentityProvider;
use crate::services::storage::HttpStorageProvider;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env().expect("provider configuration required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let identity = HttpIdentityProvider::new(&config).expect("identity client init failed");
    let storage = HttpStorageProvider::new(&config).expect("storage client init failed");
    let state = state::AppState::new(Arc::new(identity), Arc::new(storage));

    // No token survives a process start, but the startup query still flips
    // the holder out of its loading state for observers.
    state.session.initialize(state.identity.as_ref(), None).await;

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "vaultgate listening");
    axum::serve(listener, app).await.expect("server failed");
}
