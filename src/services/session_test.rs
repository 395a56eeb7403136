use super::*;
use crate::state::test_helpers::MockIdentity;
use uuid::Uuid;

fn session_for(user: &User) -> Session {
    Session { access_token: "tok".to_owned(), user: user.clone() }
}

fn some_user() -> User {
    User { id: Uuid::new_v4(), email: Some("admin@example.com".to_owned()) }
}

// =============================================================================
// initialize
// =============================================================================

#[tokio::test]
async fn initialize_without_token_clears_loading() {
    let provider = MockIdentity::new("admin@example.com", "hunter2");
    let holder = SessionHolder::new();
    assert!(holder.current().loading);

    holder.initialize(&provider, None).await;
    let state = holder.current();
    assert!(!state.loading);
    assert!(state.user.is_none());
}

#[tokio::test]
async fn initialize_with_valid_token_restores_user() {
    let provider = MockIdentity::new("admin@example.com", "hunter2");
    let session = provider
        .sign_in_with_password("admin@example.com", "hunter2")
        .await
        .unwrap();

    let holder = SessionHolder::new();
    holder.initialize(&provider, Some(&session.access_token)).await;
    assert_eq!(holder.current().user, Some(provider.user.clone()));
}

#[tokio::test]
async fn initialize_with_dead_token_leaves_user_absent() {
    let provider = MockIdentity::new("admin@example.com", "hunter2");
    let holder = SessionHolder::new();
    holder.initialize(&provider, Some("stale-token")).await;
    let state = holder.current();
    assert!(state.user.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn last_writer_wins_between_notify_and_initialize() {
    let provider = MockIdentity::new("admin@example.com", "hunter2");
    let holder = SessionHolder::new();

    // A notification can land while the startup query is still in flight;
    // whichever write applies last defines the state.
    let user = some_user();
    holder.notify(AuthEvent::SignedIn, Some(&session_for(&user)));
    holder.initialize(&provider, None).await;
    assert!(holder.current().user.is_none());
}

// =============================================================================
// sign_in
// =============================================================================

#[tokio::test]
async fn sign_in_success_sets_user_via_notification() {
    let provider = MockIdentity::new("admin@example.com", "hunter2");
    let holder = SessionHolder::new();
    let mut subscription = holder.subscribe();

    let session = holder
        .sign_in(&provider, "admin@example.com", "hunter2")
        .await
        .unwrap();
    assert!(!session.access_token.is_empty());

    let observed = subscription.changed().await.unwrap();
    assert_eq!(observed.user, Some(provider.user.clone()));
    assert!(!observed.loading);
}

#[tokio::test]
async fn sign_in_failure_is_opaque_and_leaves_user_unset() {
    let provider = MockIdentity::new("admin@example.com", "hunter2");
    let holder = SessionHolder::new();

    let err = holder
        .sign_in(&provider, "admin@example.com", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid credentials");
    assert!(holder.current().user.is_none());
    assert_eq!(provider.sign_in_count(), 1);
}

#[tokio::test]
async fn sign_in_works_with_no_subscribers() {
    let provider = MockIdentity::new("admin@example.com", "hunter2");
    let holder = SessionHolder::new();
    holder
        .sign_in(&provider, "admin@example.com", "hunter2")
        .await
        .unwrap();
    assert!(holder.current().user.is_some());
}

// =============================================================================
// notify
// =============================================================================

#[test]
fn notify_with_none_session_clears_user() {
    let holder = SessionHolder::new();
    let user = some_user();
    holder.notify(AuthEvent::SignedIn, Some(&session_for(&user)));
    assert!(holder.current().user.is_some());

    holder.notify(AuthEvent::SignedOut, None);
    assert!(holder.current().user.is_none());
}

#[test]
fn token_refresh_keeps_user() {
    let holder = SessionHolder::new();
    let user = some_user();
    holder.notify(AuthEvent::SignedIn, Some(&session_for(&user)));
    holder.notify(AuthEvent::TokenRefreshed, Some(&session_for(&user)));
    assert_eq!(holder.current().user, Some(user));
}

#[test]
fn notify_clears_loading() {
    let holder = SessionHolder::new();
    holder.notify(AuthEvent::InitialSession, None);
    assert!(!holder.current().loading);
}

// =============================================================================
// subscriptions
// =============================================================================

#[tokio::test]
async fn subscription_sees_each_transition() {
    let holder = SessionHolder::new();
    let mut subscription = holder.subscribe();
    let user = some_user();

    holder.notify(AuthEvent::SignedIn, Some(&session_for(&user)));
    assert!(subscription.changed().await.unwrap().user.is_some());

    holder.notify(AuthEvent::SignedOut, None);
    assert!(subscription.changed().await.unwrap().user.is_none());
}

#[test]
fn dropping_subscription_detaches_it() {
    let holder = SessionHolder::new();
    let subscription = holder.subscribe();
    assert_eq!(holder.tx.receiver_count(), 1);
    drop(subscription);
    assert_eq!(holder.tx.receiver_count(), 0);

    // Notifying with no subscribers left is fine.
    holder.notify(AuthEvent::SignedOut, None);
}

#[tokio::test]
async fn subscription_outlives_holder_gracefully() {
    let holder = SessionHolder::new();
    let mut subscription = holder.subscribe();
    drop(holder);
    assert!(subscription.changed().await.is_none());
}

// =============================================================================
// sign_out
// =============================================================================

#[tokio::test]
async fn sign_out_clears_user_token_and_local_state() {
    let provider = MockIdentity::new("admin@example.com", "hunter2");
    let holder = SessionHolder::new();

    let session = holder
        .sign_in(&provider, "admin@example.com", "hunter2")
        .await
        .unwrap();
    holder.put_local("vault.listing", serde_json::json!(["a.png"])).await;

    holder.sign_out(&provider, &session.access_token).await;

    assert!(holder.current().user.is_none());
    assert!(holder.get_local("vault.listing").await.is_none());
    assert!(provider.get_user(&session.access_token).await.unwrap().is_none());
}

// =============================================================================
// local scratch
// =============================================================================

#[tokio::test]
async fn local_scratch_stores_and_clears() {
    let holder = SessionHolder::new();
    holder.put_local("k", serde_json::json!(1)).await;
    assert_eq!(holder.get_local("k").await, Some(serde_json::json!(1)));

    holder.clear_local().await;
    assert!(holder.get_local("k").await.is_none());
}

#[tokio::test]
async fn local_scratch_overwrites_wholesale() {
    let holder = SessionHolder::new();
    holder.put_local("k", serde_json::json!(["old"])).await;
    holder.put_local("k", serde_json::json!(["new"])).await;
    assert_eq!(holder.get_local("k").await, Some(serde_json::json!(["new"])));
}
