use super::*;

fn test_config() -> crate::config::Config {
    crate::config::Config {
        provider_url: "https://project.example.co".to_owned(),
        provider_anon_key: "anon-key".to_owned(),
    }
}

// =============================================================================
// parse_token_response
// =============================================================================

#[test]
fn token_response_parses() {
    let json = r#"{
        "access_token": "abc123",
        "token_type": "bearer",
        "expires_in": 3600,
        "user": { "id": "00000000-0000-0000-0000-000000000001", "email": "admin@example.com" }
    }"#;
    let session = parse_token_response(json).unwrap();
    assert_eq!(session.access_token, "abc123");
    assert_eq!(session.user.email.as_deref(), Some("admin@example.com"));
}

#[test]
fn token_response_without_email() {
    let json = r#"{
        "access_token": "abc123",
        "user": { "id": "00000000-0000-0000-0000-000000000001", "email": null }
    }"#;
    let session = parse_token_response(json).unwrap();
    assert!(session.user.email.is_none());
}

#[test]
fn token_response_garbage_is_parse_error() {
    assert!(matches!(parse_token_response("not json"), Err(IdentityError::Parse(_))));
}

#[test]
fn token_response_missing_user_is_parse_error() {
    let json = r#"{ "access_token": "abc123" }"#;
    assert!(matches!(parse_token_response(json), Err(IdentityError::Parse(_))));
}

// =============================================================================
// parse_user
// =============================================================================

#[test]
fn user_parses() {
    let json = r#"{ "id": "00000000-0000-0000-0000-000000000002", "email": "admin@example.com" }"#;
    let user = parse_user(json).unwrap();
    assert_eq!(user.email.as_deref(), Some("admin@example.com"));
}

#[test]
fn user_with_bad_id_is_parse_error() {
    let json = r#"{ "id": "not-a-uuid", "email": "admin@example.com" }"#;
    assert!(matches!(parse_user(json), Err(IdentityError::Parse(_))));
}

// =============================================================================
// endpoints / error opacity
// =============================================================================

#[test]
fn endpoint_joins_auth_surface() {
    let provider = HttpIdentityProvider::new(&test_config()).unwrap();
    assert_eq!(provider.endpoint("/user"), "https://project.example.co/auth/v1/user");
    assert_eq!(
        provider.endpoint("/token?grant_type=password"),
        "https://project.example.co/auth/v1/token?grant_type=password"
    );
}

#[test]
fn invalid_credentials_message_is_opaque() {
    let message = IdentityError::InvalidCredentials.to_string();
    assert_eq!(message, "invalid credentials");
    assert!(!message.contains("email"));
    assert!(!message.contains("password"));
}
