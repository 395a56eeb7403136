//! Provider configuration loaded from the environment.
//!
//! Two values are required — the backend endpoint URL and its public API
//! key. Their absence is a fatal startup misconfiguration; everything else
//! in the app has a default.

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, without a trailing slash.
    pub provider_url: String,
    /// Public (anon) API key sent with every provider request.
    pub provider_anon_key: String,
}

impl Config {
    /// Load from `PROVIDER_URL` and `PROVIDER_ANON_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable is unset or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider_url = required("PROVIDER_URL")?;
        let provider_anon_key = required("PROVIDER_ANON_KEY")?;
        Ok(Self { provider_url: normalize_base_url(&provider_url), provider_anon_key })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingVar(key))
}

/// Strip trailing slashes so endpoint paths can be appended verbatim.
pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

/// Parse an env var with a fallback default.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
