//! Protected dashboard — one listing pass per render.

use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::routes::auth::AuthUser;
use crate::services::listing::{self, ListedObject};
use crate::services::storage::original_file_name;
use crate::state::AppState;
use crate::templates::{FileRow, VaultTemplate};

/// Rows rendered on the dashboard; the full pass is still cached.
const DISPLAY_LIMIT: usize = 10;

const LISTING_CACHE_KEY: &str = "vault.listing";

/// `GET /vault` — run an aggregation pass and render the result.
///
/// Each pass replaces whatever the previous render cached; results are never
/// merged across passes.
pub async fn dashboard(State(state): State<AppState>, auth: AuthUser) -> Response {
    let objects = listing::list_accessible_objects(state.storage.as_ref(), &state.listing).await;
    tracing::info!(user = %auth.user.id, count = objects.len(), "listing pass complete");

    let previous = state
        .session
        .get_local(LISTING_CACHE_KEY)
        .await
        .and_then(|value| serde_json::from_value::<Vec<ListedObject>>(value).ok());
    if let Some(previous) = previous {
        if previous != objects {
            tracing::info!(previous = previous.len(), current = objects.len(), "listing changed since last pass");
        }
    }
    if let Ok(value) = serde_json::to_value(&objects) {
        state.session.put_local(LISTING_CACHE_KEY, value).await;
    }

    let template = VaultTemplate {
        user_email: auth.user.email.clone().unwrap_or_else(|| "administrator".to_owned()),
        total: objects.len(),
        files: display_rows(&objects),
    };
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(error) => {
            tracing::error!(%error, "vault template render failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn display_rows(objects: &[ListedObject]) -> Vec<FileRow> {
    objects.iter().take(DISPLAY_LIMIT).map(file_row).collect()
}

fn file_row(object: &ListedObject) -> FileRow {
    FileRow {
        name: original_file_name(&object.name).to_owned(),
        bucket: object.bucket.clone(),
        url: object.access_url.clone(),
    }
}

#[cfg(test)]
#[path = "vault_test.rs"]
mod tests;
