use std::time::Duration;

use chrono::Utc;
use httpmock::prelude::*;
use pravasi_registry::RegistryError;
use pravasi_registry::model::seed_state;
use pravasi_registry::persistence::{MemorySnapshotStore, SnapshotStore};
use pravasi_registry::store::RegistryStore;
use pravasi_registry::sync::{self, SyncOutcome, SyncPolicy, WebhookClient};

fn store_with_endpoint(endpoint: String) -> RegistryStore<MemorySnapshotStore> {
    let mut store = RegistryStore::with_state(seed_state(), MemorySnapshotStore::new());
    store
        .set_integration_endpoint(Some(endpoint))
        .expect("endpoint set");
    store
}

fn quick_policy(max_attempts: u32) -> SyncPolicy {
    SyncPolicy {
        timeout: Duration::from_secs(5),
        max_attempts,
        initial_backoff: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn delivered_sync_records_timestamp() {
    let server = MockServer::start_async().await;
    let hook = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/exec")
                .header("content-type", "application/json")
                .body_contains("\"yearlyEstablishments\"")
                .body_contains("\"Rahul Kumar\"");
            then.status(200).body("Sync Successful");
        })
        .await;

    let mut store = store_with_endpoint(server.url("/exec"));
    let request = sync::prepare(store.state(), Utc::now()).expect("request prepared");
    let client = WebhookClient::new(quick_policy(3)).expect("client built");

    let outcome = client.deliver(&request).await;
    assert_eq!(outcome, SyncOutcome::Delivered);
    hook.assert_hits_async(1).await;

    let synced_at = Utc::now();
    sync::apply_outcome(&mut store, &outcome, synced_at).expect("outcome recorded");
    assert_eq!(store.state().last_synced_at, Some(synced_at));

    let persisted = store
        .persistence()
        .load()
        .expect("snapshot readable")
        .expect("snapshot present");
    assert_eq!(persisted.last_synced_at, Some(synced_at));
}

#[tokio::test]
async fn server_errors_are_retried_then_reported() {
    let server = MockServer::start_async().await;
    let hook = server
        .mock_async(|when, then| {
            when.method(POST).path("/exec");
            then.status(500);
        })
        .await;

    let mut store = store_with_endpoint(server.url("/exec"));
    let before = store.state().clone();
    let request = sync::prepare(store.state(), Utc::now()).expect("request prepared");
    let client = WebhookClient::new(quick_policy(3)).expect("client built");

    let outcome = client.deliver(&request).await;
    assert!(matches!(outcome, SyncOutcome::Failed(_)));
    hook.assert_hits_async(3).await;

    let result = sync::apply_outcome(&mut store, &outcome, Utc::now());
    assert!(matches!(result, Err(RegistryError::Sync(_))));
    assert_eq!(store.state(), &before);
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/exec");
            then.status(200).delay(Duration::from_secs(2));
        })
        .await;

    let store = store_with_endpoint(server.url("/exec"));
    let request = sync::prepare(store.state(), Utc::now()).expect("request prepared");
    let client = WebhookClient::new(SyncPolicy {
        timeout: Duration::from_millis(200),
        max_attempts: 1,
        initial_backoff: Duration::from_millis(10),
    })
    .expect("client built");

    assert_eq!(client.deliver(&request).await, SyncOutcome::TimedOut);
}

#[tokio::test]
async fn recovers_when_a_later_attempt_succeeds() {
    let server = MockServer::start_async().await;
    let mut failing = server
        .mock_async(|when, then| {
            when.method(POST).path("/exec");
            then.status(503);
        })
        .await;

    let store = store_with_endpoint(server.url("/exec"));
    let request = sync::prepare(store.state(), Utc::now()).expect("request prepared");
    let client = WebhookClient::new(quick_policy(1)).expect("client built");
    assert!(matches!(
        client.deliver(&request).await,
        SyncOutcome::Failed(_)
    ));

    failing.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/exec");
            then.status(200);
        })
        .await;
    assert_eq!(client.deliver(&request).await, SyncOutcome::Delivered);
}

#[tokio::test]
async fn unreachable_endpoint_fails_without_touching_state() {
    let mut store = store_with_endpoint("http://127.0.0.1:9/exec".to_string());
    let before = store.state().clone();
    let request = sync::prepare(store.state(), Utc::now()).expect("request prepared");
    let client = WebhookClient::new(quick_policy(2)).expect("client built");

    let outcome = client.deliver(&request).await;
    assert_ne!(outcome, SyncOutcome::Delivered);
    assert!(sync::apply_outcome(&mut store, &outcome, Utc::now()).is_err());
    assert_eq!(store.state(), &before);
}

#[test]
fn missing_endpoint_is_rejected_before_sending() {
    let store = RegistryStore::with_state(seed_state(), MemorySnapshotStore::new());
    assert!(matches!(
        sync::prepare(store.state(), Utc::now()),
        Err(RegistryError::MissingEndpoint)
    ));
}
