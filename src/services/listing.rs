//! Storage discovery and listing aggregation.
//!
//! DESIGN
//! ======
//! Best-effort by contract: the aggregator never fails its caller. A bucket
//! that errors contributes zero objects and the pass moves on to the next
//! one. Discovery prefers full enumeration and falls back to a fixed
//! candidate list only when enumeration itself fails; a candidate that turns
//! out not to exist is tolerated like any other per-bucket error.
//!
//! The scan is exhaustive by default. `first_match` stops after the first
//! bucket that yields retained objects — the two policies produce different
//! result sets when several buckets are non-empty, so the choice is
//! configuration, not chance.

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::config::env_parse;
use crate::services::storage::{Bucket, StorageProvider};

const DEFAULT_CANDIDATE_BUCKETS: &[&str] = &["files", "photos", "pdf"];
const DEFAULT_PER_BUCKET_LIMIT: usize = 100;
const DEFAULT_SIGNED_TTL_SECS: u64 = 3600;

// =============================================================================
// CONFIG
// =============================================================================

/// How an access URL is issued for each retained object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlMode {
    /// Deterministic public URL; absent when the bucket is not public.
    Public,
    /// Time-bounded signed URL; issuance failure leaves the URL absent.
    Signed { ttl_secs: u64 },
}

#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// Probed in order when bucket enumeration is unavailable.
    pub candidate_buckets: Vec<String>,
    pub per_bucket_limit: usize,
    /// Lowercased extension allow-list; `None` keeps everything.
    pub extensions: Option<Vec<String>>,
    pub url_mode: UrlMode,
    /// Stop after the first bucket that yields retained objects.
    pub first_match: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            candidate_buckets: DEFAULT_CANDIDATE_BUCKETS.iter().map(|s| (*s).to_owned()).collect(),
            per_bucket_limit: DEFAULT_PER_BUCKET_LIMIT,
            extensions: None,
            url_mode: UrlMode::Public,
            first_match: false,
        }
    }
}

impl ListingConfig {
    /// Load overrides from `LISTING_*` environment variables; anything
    /// missing or unparseable keeps its default.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let url_mode = match std::env::var("LISTING_URL_MODE").as_deref() {
            Ok("signed") => UrlMode::Signed {
                ttl_secs: env_parse("LISTING_SIGNED_TTL_SECS", DEFAULT_SIGNED_TTL_SECS),
            },
            _ => UrlMode::Public,
        };
        Self {
            candidate_buckets: std::env::var("LISTING_BUCKETS")
                .ok()
                .map(|raw| parse_name_list(&raw))
                .filter(|list| !list.is_empty())
                .unwrap_or(defaults.candidate_buckets),
            per_bucket_limit: env_parse("LISTING_LIMIT", DEFAULT_PER_BUCKET_LIMIT),
            extensions: std::env::var("LISTING_EXTENSIONS")
                .ok()
                .map(|raw| parse_name_list(&raw.to_ascii_lowercase()))
                .filter(|list| !list.is_empty()),
            url_mode,
            first_match: env_parse("LISTING_FIRST_MATCH", false),
        }
    }
}

fn parse_name_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

// =============================================================================
// AGGREGATION
// =============================================================================

/// One row of the dashboard listing. Rebuilt wholesale on every pass; rows
/// have no identity across passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedObject {
    pub name: String,
    pub bucket: String,
    /// Absent when the object grants no access; the row still appears.
    pub access_url: Option<String>,
}

/// Run one aggregation pass over every discoverable bucket.
///
/// Never fails: every error degrades to "no objects from that bucket" or
/// "no URL for that object". Results come back in discovery order.
pub async fn list_accessible_objects(storage: &dyn StorageProvider, config: &ListingConfig) -> Vec<ListedObject> {
    let buckets = discover_buckets(storage, config).await;
    let mut results = Vec::new();

    for bucket in &buckets {
        let objects = match storage.list_objects(&bucket.name, "", config.per_bucket_limit).await {
            Ok(objects) => objects,
            Err(error) => {
                tracing::warn!(bucket = %bucket.name, %error, "bucket listing failed; skipping");
                continue;
            }
        };
        if objects.is_empty() {
            continue;
        }

        let retained: Vec<_> = objects
            .into_iter()
            .filter(|object| matches_extension(&object.name, config.extensions.as_deref()))
            .collect();

        // Per-object URL issuance runs concurrently; join_all keeps order.
        let resolved = join_all(
            retained
                .iter()
                .map(|object| resolve_access_url(storage, bucket, &object.name, config.url_mode)),
        )
        .await;

        let before = results.len();
        for (object, access_url) in retained.into_iter().zip(resolved) {
            results.push(ListedObject { name: object.name, bucket: bucket.name.clone(), access_url });
        }
        if config.first_match && results.len() > before {
            break;
        }
    }

    results
}

async fn discover_buckets(storage: &dyn StorageProvider, config: &ListingConfig) -> Vec<Bucket> {
    match storage.list_buckets().await {
        Ok(buckets) => buckets,
        Err(error) => {
            tracing::warn!(%error, "bucket enumeration failed; probing candidate list");
            config
                .candidate_buckets
                .iter()
                .map(|name| Bucket { name: name.clone(), public: true })
                .collect()
        }
    }
}

async fn resolve_access_url(
    storage: &dyn StorageProvider,
    bucket: &Bucket,
    name: &str,
    mode: UrlMode,
) -> Option<String> {
    match mode {
        UrlMode::Public => {
            if bucket.public {
                Some(storage.public_url(&bucket.name, name))
            } else {
                None
            }
        }
        UrlMode::Signed { ttl_secs } => match storage.create_signed_url(&bucket.name, name, ttl_secs).await {
            Ok(url) => Some(url),
            Err(error) => {
                tracing::warn!(bucket = %bucket.name, object = %name, %error, "signed url issuance failed");
                None
            }
        },
    }
}

fn matches_extension(name: &str, allow: Option<&[String]>) -> bool {
    let Some(allow) = allow else { return true };
    let Some((_, ext)) = name.rsplit_once('.') else { return false };
    allow.iter().any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
#[path = "listing_test.rs"]
mod tests;
