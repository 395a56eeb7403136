//! Server-rendered page templates.

use askama::Template;

/// Login page — credential form plus denial/blocked messaging.
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    /// Generic denial or blocked message; never reveals which factor failed.
    pub error: Option<String>,
    /// Retained across failed submissions. The password never is.
    pub email: String,
    pub blocked: bool,
}

impl LoginTemplate {
    #[must_use]
    pub fn fresh() -> Self {
        Self { error: None, email: String::new(), blocked: false }
    }

    #[must_use]
    pub fn denied(email: &str) -> Self {
        Self {
            error: Some("Invalid admin credentials. Access denied.".to_owned()),
            email: email.to_owned(),
            blocked: false,
        }
    }

    #[must_use]
    pub fn blocked(email: &str) -> Self {
        Self {
            error: Some("Too many failed attempts. Please refresh the page and try again.".to_owned()),
            email: email.to_owned(),
            blocked: true,
        }
    }
}

/// One dashboard row.
pub struct FileRow {
    pub name: String,
    pub bucket: String,
    /// Absent when the object grants no access; the row still renders.
    pub url: Option<String>,
}

/// Vault dashboard.
#[derive(Template)]
#[template(path = "vault.html")]
pub struct VaultTemplate {
    pub user_email: String,
    /// Size of the full aggregation pass, not just the rendered rows.
    pub total: usize,
    pub files: Vec<FileRow>,
}
