use super::*;

fn test_config() -> crate::config::Config {
    crate::config::Config {
        provider_url: "https://project.example.co".to_owned(),
        provider_anon_key: "anon-key".to_owned(),
    }
}

// =============================================================================
// public_url — deterministic derivation, round-trippable
// =============================================================================

#[test]
fn public_url_is_deterministic() {
    let provider = HttpStorageProvider::new(&test_config()).unwrap();
    let a = provider.public_url("photos", "a.png");
    let b = provider.public_url("photos", "a.png");
    assert_eq!(a, b);
    assert_eq!(a, "https://project.example.co/storage/v1/object/public/photos/a.png");
}

#[test]
fn public_url_round_trips_to_bucket_and_name() {
    let provider = HttpStorageProvider::new(&test_config()).unwrap();
    let url = provider.public_url("photos", "vacation/a.png");

    let suffix = url
        .strip_prefix("https://project.example.co/storage/v1/object/public/")
        .unwrap();
    let (bucket, name) = suffix.split_once('/').unwrap();
    assert_eq!(bucket, "photos");
    assert_eq!(name, "vacation/a.png");
}

#[test]
fn distinct_objects_get_distinct_public_urls() {
    let provider = HttpStorageProvider::new(&test_config()).unwrap();
    assert_ne!(provider.public_url("photos", "a.png"), provider.public_url("photos", "b.png"));
    assert_ne!(provider.public_url("photos", "a.png"), provider.public_url("files", "a.png"));
}

// =============================================================================
// parsing
// =============================================================================

#[test]
fn bucket_list_parses_with_public_flag() {
    let json = r#"[{"name":"photos","public":true},{"name":"files","public":false}]"#;
    let buckets = parse_bucket_list(json).unwrap();
    assert_eq!(buckets.len(), 2);
    assert!(buckets[0].public);
    assert!(!buckets[1].public);
}

#[test]
fn bucket_list_public_defaults_to_false() {
    let json = r#"[{"name":"photos"}]"#;
    let buckets = parse_bucket_list(json).unwrap();
    assert!(!buckets[0].public);
}

#[test]
fn bucket_list_garbage_is_parse_error() {
    assert!(matches!(parse_bucket_list("{}"), Err(StorageError::Parse(_))));
}

#[test]
fn object_list_parses_names() {
    let json = r#"[{"name":"a.png","id":"x","metadata":{}},{"name":"b.pdf"}]"#;
    let objects = parse_object_list(json).unwrap();
    assert_eq!(objects[0].name, "a.png");
    assert_eq!(objects[1].name, "b.pdf");
}

#[test]
fn empty_object_list_parses() {
    assert!(parse_object_list("[]").unwrap().is_empty());
}

#[test]
fn signed_url_joins_base() {
    let json = r#"{"signedURL":"/object/sign/photos/a.png?token=abc"}"#;
    let url = parse_signed_url("https://project.example.co", json).unwrap();
    assert_eq!(
        url,
        "https://project.example.co/storage/v1/object/sign/photos/a.png?token=abc"
    );
}

#[test]
fn signed_url_missing_field_is_parse_error() {
    assert!(matches!(
        parse_signed_url("https://project.example.co", r#"{"error":"denied"}"#),
        Err(StorageError::Parse(_))
    ));
}

// =============================================================================
// endpoints
// =============================================================================

#[test]
fn endpoint_joins_storage_surface() {
    let provider = HttpStorageProvider::new(&test_config()).unwrap();
    assert_eq!(provider.endpoint("/bucket"), "https://project.example.co/storage/v1/bucket");
    assert_eq!(
        provider.endpoint("/object/list/photos"),
        "https://project.example.co/storage/v1/object/list/photos"
    );
}

// =============================================================================
// display names
// =============================================================================

#[test]
fn original_file_name_takes_last_segment() {
    assert_eq!(original_file_name("user-1/a.png"), "a.png");
    assert_eq!(original_file_name("deep/nested/path/b.pdf"), "b.pdf");
}

#[test]
fn original_file_name_of_bare_name_is_identity() {
    assert_eq!(original_file_name("a.png"), "a.png");
}
