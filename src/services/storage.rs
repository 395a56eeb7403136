//! Storage provider client — bucket enumeration, object listing, URL issuance.
//!
//! Public URLs are derived, never fetched: the derivation is deterministic in
//! `(bucket, name)` so a URL can always be traced back to the object it was
//! built from.

use std::time::Duration;

use serde::Deserialize;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// TYPES
// =============================================================================

/// A named partition of the storage service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Bucket {
    pub name: String,
    /// Whether the bucket allows unauthenticated reads.
    #[serde(default)]
    pub public: bool,
}

/// One entry from a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageObject {
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("bucket not found: {0}")]
    BucketNotFound(String),
    #[error("storage request failed: {0}")]
    Request(String),
    #[error("storage api error: status {status}")]
    Api { status: u16 },
    #[error("storage response parse failed: {0}")]
    Parse(String),
    #[error("http client build failed: {0}")]
    HttpClientBuild(String),
}

/// Narrow contract over the hosted object-storage service.
#[async_trait::async_trait]
pub trait StorageProvider: Send + Sync {
    /// Enumerate every bucket the caller can see.
    ///
    /// # Errors
    ///
    /// Returns an error for transport or server faults.
    async fn list_buckets(&self) -> Result<Vec<Bucket>, StorageError>;

    /// List up to `limit` objects under `prefix` in the named bucket.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::BucketNotFound`] for unknown buckets, other
    /// variants for transport or server faults.
    async fn list_objects(&self, bucket: &str, prefix: &str, limit: usize) -> Result<Vec<StorageObject>, StorageError>;

    /// Deterministic public URL for an object. No network round trip.
    fn public_url(&self, bucket: &str, name: &str) -> String;

    /// Request a time-bounded signed URL.
    ///
    /// # Errors
    ///
    /// Returns an error when the service refuses to sign (treated by callers
    /// as "no access", never fatal).
    async fn create_signed_url(&self, bucket: &str, name: &str, ttl_secs: u64) -> Result<String, StorageError>;
}

// =============================================================================
// HTTP IMPLEMENTATION
// =============================================================================

pub struct HttpStorageProvider {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl HttpStorageProvider {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &crate::config::Config) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.provider_url.clone(),
            anon_key: config.provider_anon_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/storage/v1{path}", self.base_url)
    }
}

#[async_trait::async_trait]
impl StorageProvider for HttpStorageProvider {
    async fn list_buckets(&self) -> Result<Vec<Bucket>, StorageError> {
        let response = self
            .http
            .get(self.endpoint("/bucket"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        if status != 200 {
            return Err(StorageError::Api { status });
        }
        parse_bucket_list(&text)
    }

    async fn list_objects(&self, bucket: &str, prefix: &str, limit: usize) -> Result<Vec<StorageObject>, StorageError> {
        let response = self
            .http
            .post(self.endpoint(&format!("/object/list/{bucket}")))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&serde_json::json!({ "prefix": prefix, "limit": limit }))
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        if matches!(status, 400 | 404) {
            return Err(StorageError::BucketNotFound(bucket.to_owned()));
        }
        if status != 200 {
            return Err(StorageError::Api { status });
        }
        parse_object_list(&text)
    }

    fn public_url(&self, bucket: &str, name: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{name}", self.base_url)
    }

    async fn create_signed_url(&self, bucket: &str, name: &str, ttl_secs: u64) -> Result<String, StorageError> {
        let response = self
            .http
            .post(self.endpoint(&format!("/object/sign/{bucket}/{name}")))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&serde_json::json!({ "expiresIn": ttl_secs }))
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        if status != 200 {
            return Err(StorageError::Api { status });
        }
        parse_signed_url(&self.base_url, &text)
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_bucket_list(json: &str) -> Result<Vec<Bucket>, StorageError> {
    serde_json::from_str(json).map_err(|e| StorageError::Parse(e.to_string()))
}

fn parse_object_list(json: &str) -> Result<Vec<StorageObject>, StorageError> {
    serde_json::from_str(json).map_err(|e| StorageError::Parse(e.to_string()))
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// The service returns a path relative to its own root; join it to the base.
fn parse_signed_url(base_url: &str, json: &str) -> Result<String, StorageError> {
    let resp: SignedUrlResponse = serde_json::from_str(json).map_err(|e| StorageError::Parse(e.to_string()))?;
    Ok(format!("{base_url}/storage/v1{}", resp.signed_url))
}

/// Display name for a stored path (`{user_id}/{file_name}` and deeper): the
/// final path segment.
#[must_use]
pub fn original_file_name(stored_path: &str) -> &str {
    stored_path.rsplit('/').next().unwrap_or(stored_path)
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
