mod common;

use common::mocks::{CreatedIdShape, FailureMode, RecordingNotifier};
use common::{TEST_TOKEN, setup, setup_with_pool};
use pos_sync::application::ports::{CommandQueueStore, CredentialSource, FailureNotifier, RemoteApi};
use pos_sync::application::services::{CommandDispatcher, ReplayEngine};
use pos_sync::domain::entities::offline::{DrainOutcome, DrainReport, DrainTrigger};
use pos_sync::domain::value_objects::PlaceholderResolution;
use pos_sync::infrastructure::database::ConnectionPool;
use pos_sync::shared::config::DatabaseConfig;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

async fn drain(ctx: &common::TestContext) -> DrainReport {
    ctx.state
        .replay_engine
        .drain(DrainTrigger::Manual)
        .await
        .unwrap()
        .into_report()
        .expect("drain should not be skipped")
}

#[tokio::test]
async fn idempotency_key_is_stable_across_attempts() {
    let ctx = setup().await;
    ctx.go_offline();
    ctx.state
        .mutator
        .create_order(json!({"table": "3", "items": []}))
        .await
        .unwrap();
    let stored_key = ctx.state.queue.list_all().await.unwrap()[0]
        .idempotency_key
        .to_string();

    ctx.go_online();
    ctx.sign_in().await;
    ctx.api.fail_all(FailureMode::Network);
    drain(&ctx).await;
    drain(&ctx).await;
    ctx.api.recover();
    drain(&ctx).await;

    let calls = ctx.api.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|call| call.idempotency_key == stored_key));
    assert!(calls.iter().all(|call| call.replay));
    assert!(calls.iter().all(|call| call.bearer_token == TEST_TOKEN));
    assert!(ctx.state.queue.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn command_is_retired_after_five_failures() {
    let ctx = setup().await;
    ctx.go_offline();
    ctx.state
        .mutator
        .adjust_inventory(json!({"sku": "lime", "delta": -4}))
        .await
        .unwrap();
    ctx.sign_in().await;
    ctx.api.fail_all(FailureMode::Rejected(503));

    for attempt in 1..=4u32 {
        let report = drain(&ctx).await;
        assert_eq!(report.failed, 1);
        assert!(report.permanently_failed.is_empty());
        let queued = ctx.state.queue.list_all().await.unwrap();
        assert_eq!(queued[0].retry_count, attempt);
    }

    let report = drain(&ctx).await;
    assert_eq!(report.permanently_failed.len(), 1);
    assert_eq!(report.permanently_failed[0].attempts, 5);
    assert_eq!(report.remaining, 0);
    assert!(ctx.state.queue.list_all().await.unwrap().is_empty());

    let failed = ctx.state.queue.list_failed().await.unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].retry_count, 5);
    assert!(failed[0].reason.contains("exceeded max retries"));

    drain(&ctx).await;
    assert_eq!(ctx.api.call_count(), 5);
}

#[tokio::test]
async fn drains_fifo_and_retries_only_the_failed_command() {
    let ctx = setup().await;
    ctx.go_offline();
    for sku in ["a", "b", "c"] {
        ctx.state
            .mutator
            .adjust_inventory(json!({"sku": sku, "delta": 1}))
            .await
            .unwrap();
    }
    ctx.go_online();
    ctx.sign_in().await;
    ctx.api
        .fail_when(|call| call.body["sku"] == "b", FailureMode::Network);

    let report = drain(&ctx).await;
    assert_eq!(report.synced, 2);
    assert_eq!(report.failed, 1);
    let order: Vec<_> = ctx
        .api
        .calls()
        .iter()
        .map(|call| call.body["sku"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(order, vec!["a", "b", "c"]);

    let remaining = ctx.state.queue.list_all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].payload.as_json()["sku"], "b");
    assert_eq!(remaining[0].retry_count, 1);

    ctx.api.recover();
    drain(&ctx).await;
    let calls = ctx.api.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[3].body["sku"], "b");
    assert!(ctx.state.queue.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_triggers_share_one_cycle() {
    let ctx = setup().await;
    ctx.go_offline();
    ctx.state
        .mutator
        .send_order("ord_77")
        .await
        .unwrap();
    ctx.sign_in().await;
    ctx.api.set_delay(Duration::from_millis(300));

    let engine = Arc::clone(&ctx.state.replay_engine);
    let first = tokio::spawn(async move { engine.drain(DrainTrigger::Timer).await });

    let watched = Arc::clone(&ctx.state.replay_engine);
    let started = common::wait_until(Duration::from_secs(2), || {
        let engine = Arc::clone(&watched);
        async move { engine.is_running() }
    })
    .await;
    assert!(started);

    let second = ctx
        .state
        .replay_engine
        .drain(DrainTrigger::ConnectivityRestored)
        .await
        .unwrap();
    assert_eq!(second, DrainOutcome::AlreadyRunning);

    let first = first.await.unwrap().unwrap();
    assert_eq!(first.report().map(|report| report.synced), Some(1));
    assert_eq!(ctx.api.call_count(), 1);
    assert!(!ctx.state.replay_engine.is_running());

    let metrics = ctx.state.replay_engine.metrics();
    assert_eq!(metrics.cycles, 1);
    assert_eq!(metrics.skipped_cycles, 1);
}

#[tokio::test]
async fn missing_credential_leaves_queue_untouched() {
    let ctx = setup().await;
    ctx.go_offline();
    ctx.state
        .mutator
        .bump_ticket("grill", "t-9", "ready")
        .await
        .unwrap();
    ctx.state
        .mutator
        .send_order("ord_1")
        .await
        .unwrap();
    ctx.go_online();

    let report = drain(&ctx).await;
    assert!(report.unauthenticated);
    assert_eq!(report.attempted, 0);
    assert_eq!(report.remaining, 2);
    assert_eq!(ctx.api.call_count(), 0);

    let queued = ctx.state.queue.list_all().await.unwrap();
    assert_eq!(queued.len(), 2);
    assert!(queued.iter().all(|command| command.retry_count == 0));
}

#[tokio::test]
async fn refused_credential_does_not_consume_retries() {
    let ctx = setup().await;
    ctx.go_offline();
    ctx.state
        .mutator
        .record_payment("ord_5", json!({"amount": 1250, "tender": "card"}))
        .await
        .unwrap();
    ctx.sign_in().await;
    ctx.api.fail_all(FailureMode::Unauthorized);

    for _ in 0..6 {
        let report = drain(&ctx).await;
        assert!(report.unauthenticated);
        assert_eq!(report.failed, 0);
    }

    let queued = ctx.state.queue.list_all().await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].retry_count, 0);
    assert!(ctx.state.queue.list_failed().await.unwrap().is_empty());
}

#[tokio::test]
async fn offline_order_round_trip_reaches_server_once() {
    let ctx = setup().await;
    ctx.go_offline();
    ctx.sign_in().await;

    let outcome = ctx
        .state
        .mutator
        .create_order(json!({"table": "5", "items": []}))
        .await
        .unwrap();
    let record = outcome.optimistic_record().expect("optimistic record").clone();
    assert!(outcome.queued);
    assert!(record.id.as_str().starts_with("offline-"));
    assert!(record.originated_offline);
    assert!(record.sync_pending);
    assert_eq!(record.attributes["table"], "5");
    assert_eq!(ctx.api.call_count(), 0);

    ctx.go_online();
    let report = drain(&ctx).await;
    assert_eq!(report.synced, 1);
    drain(&ctx).await;

    let calls = ctx.api.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].operation, "create_order");
    assert_eq!(calls[0].body, json!({"table": "5", "items": []}));
    assert!(ctx.state.queue.list_all().await.unwrap().is_empty());
    assert_eq!(
        ctx.state
            .queue
            .resolve_placeholder(record.id.as_str())
            .await
            .unwrap(),
        Some(PlaceholderResolution::Resolved("ord_1".to_string()))
    );
}

#[tokio::test]
async fn unknown_command_types_are_skipped_while_siblings_drain() {
    let ctx = setup().await;
    ctx.go_offline();
    ctx.state
        .mutator
        .adjust_inventory(json!({"sku": "rice", "delta": 10}))
        .await
        .unwrap();

    sqlx::query(
        r#"
        INSERT INTO queued_commands (
            command_type, payload, payload_version, idempotency_key, created_at, retry_count
        ) VALUES ('VOID_ORDER', '{"orderId":"ord_3"}', 1, 'VOID_ORDER-1-abcdef0123456789', 0, 0)
        "#,
    )
    .execute(ctx.state.db_pool.get_pool())
    .await
    .unwrap();
    sqlx::query(
        r#"
        INSERT INTO queued_commands (
            command_type, payload, payload_version, idempotency_key, created_at, retry_count
        ) VALUES ('SEND_ORDER', '{"orderId":"ord_3"}', 9, 'SEND_ORDER-1-abcdef0123456789', 1, 0)
        "#,
    )
    .execute(ctx.state.db_pool.get_pool())
    .await
    .unwrap();

    ctx.sign_in().await;
    let report = drain(&ctx).await;
    assert_eq!(report.skipped, 2);
    assert_eq!(report.synced, 1);
    assert_eq!(report.remaining, 2);

    let calls = ctx.api.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].operation, "adjust_inventory");

    let leftover = ctx.state.queue.list_all().await.unwrap();
    assert_eq!(leftover.len(), 2);
    assert!(leftover.iter().all(|command| command.retry_count == 0));
}

#[tokio::test]
async fn child_commands_follow_their_offline_parent() {
    let ctx = setup().await;
    ctx.sign_in().await;
    ctx.go_offline();

    let order = ctx
        .state
        .mutator
        .create_order(json!({"table": "12", "items": []}))
        .await
        .unwrap();
    let placeholder = order.optimistic_record().unwrap().id.to_string();

    // Reachable again, but the parent only exists locally.
    ctx.go_online();
    let item = ctx
        .state
        .mutator
        .add_order_item(placeholder.clone(), json!({"sku": "pho", "qty": 2}))
        .await
        .unwrap();
    assert!(item.queued);
    assert_eq!(ctx.api.call_count(), 0);

    ctx.api
        .fail_when(|call| call.operation == "create_order", FailureMode::Network);
    let report = drain(&ctx).await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.deferred, 1);
    let queued = ctx.state.queue.list_all().await.unwrap();
    assert_eq!(queued.len(), 2);
    assert_eq!(queued[1].retry_count, 0);

    ctx.api.recover();
    let report = drain(&ctx).await;
    assert_eq!(report.synced, 2);

    let calls = ctx.api.calls();
    let add_item = calls
        .iter()
        .find(|call| call.operation == "add_order_item")
        .expect("item delivered");
    assert_eq!(add_item.target.as_deref(), Some("ord_1"));
    assert!(ctx.state.queue.list_all().await.unwrap().is_empty());
}

async fn queue_order_with_item(ctx: &common::TestContext) -> String {
    ctx.go_offline();
    let order = ctx
        .state
        .mutator
        .create_order(json!({"table": "8", "items": []}))
        .await
        .unwrap();
    let placeholder = order.optimistic_record().unwrap().id.to_string();
    ctx.state
        .mutator
        .add_order_item(placeholder.clone(), json!({"sku": "udon", "qty": 1}))
        .await
        .unwrap();
    ctx.go_online();
    placeholder
}

#[tokio::test]
async fn nested_server_id_resolves_children() {
    let ctx = setup().await;
    ctx.sign_in().await;
    ctx.api.set_created_id_shape(CreatedIdShape::Nested);
    queue_order_with_item(&ctx).await;

    let report = drain(&ctx).await;
    assert_eq!(report.synced, 2);
    assert!(report.permanently_failed.is_empty());
    let calls = ctx.api.calls();
    assert_eq!(calls[1].operation, "add_order_item");
    assert_eq!(calls[1].target.as_deref(), Some("ord_1"));
}

#[tokio::test]
async fn children_of_a_parent_synced_without_id_are_retired_with_that_reason() {
    let ctx = setup().await;
    ctx.sign_in().await;
    ctx.api.set_created_id_shape(CreatedIdShape::Missing);
    let placeholder = queue_order_with_item(&ctx).await;

    let report = drain(&ctx).await;
    assert_eq!(report.synced, 1);
    assert_eq!(report.permanently_failed.len(), 1);
    let reason = &report.permanently_failed[0].reason;
    assert!(reason.contains("server returned no id"));
    assert!(!reason.contains("never created"));
    assert_eq!(ctx.api.call_count(), 1);
    assert!(ctx.state.queue.list_all().await.unwrap().is_empty());
    assert_eq!(
        ctx.state.queue.resolve_placeholder(&placeholder).await.unwrap(),
        Some(PlaceholderResolution::MissingServerId)
    );
}

#[tokio::test]
async fn children_queued_after_an_id_less_sync_keep_the_distinct_reason() {
    let ctx = setup().await;
    ctx.sign_in().await;
    ctx.api.set_created_id_shape(CreatedIdShape::Missing);
    ctx.go_offline();
    let order = ctx
        .state
        .mutator
        .create_order(json!({"table": "9", "items": []}))
        .await
        .unwrap();
    let placeholder = order.optimistic_record().unwrap().id.to_string();
    ctx.go_online();
    assert_eq!(drain(&ctx).await.synced, 1);

    ctx.state
        .mutator
        .send_order(placeholder)
        .await
        .unwrap();
    let report = drain(&ctx).await;
    assert_eq!(report.permanently_failed.len(), 1);
    assert!(
        report.permanently_failed[0]
            .reason
            .contains("synced but the server returned no id")
    );
    let failed = ctx.state.queue.list_failed().await.unwrap();
    assert!(failed[0].reason.contains("server returned no id"));
}

#[tokio::test]
async fn orphaned_children_are_retired() {
    let ctx = setup().await;
    ctx.go_offline();
    ctx.state
        .mutator
        .send_order("offline-5d0c9a8e-missing")
        .await
        .unwrap();
    ctx.sign_in().await;

    let report = drain(&ctx).await;
    assert_eq!(report.permanently_failed.len(), 1);
    assert!(report.permanently_failed[0].reason.contains("never created"));
    assert_eq!(ctx.api.call_count(), 0);
    assert!(ctx.state.queue.list_all().await.unwrap().is_empty());
    assert_eq!(ctx.state.queue.list_failed().await.unwrap().len(), 1);
}

#[tokio::test]
async fn permanent_failures_reach_the_notifier() {
    let ctx = setup().await;
    ctx.go_offline();
    ctx.state
        .mutator
        .adjust_inventory(json!({"sku": "salt", "delta": -1}))
        .await
        .unwrap();
    ctx.sign_in().await;
    ctx.api.fail_all(FailureMode::Rejected(422));

    let notifier = Arc::new(RecordingNotifier::default());
    let store: Arc<dyn CommandQueueStore> = ctx.state.queue.clone();
    let remote: Arc<dyn RemoteApi> = ctx.api.clone();
    let credentials: Arc<dyn CredentialSource> = ctx.state.credentials.clone();
    let sink: Arc<dyn FailureNotifier> = notifier.clone();
    let engine = ReplayEngine::new(store, CommandDispatcher::new(remote), credentials)
        .with_max_retries(2)
        .with_notifier(sink);

    engine.drain(DrainTrigger::Manual).await.unwrap();
    assert!(notifier.failures().is_empty());
    engine.drain(DrainTrigger::Manual).await.unwrap();

    let failures = notifier.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].attempts, 2);
    assert_eq!(engine.metrics().total_permanent_failures, 1);
}

#[tokio::test]
async fn queued_commands_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: format!("sqlite:{}?mode=rwc", dir.path().join("queue.db").display()),
        max_connections: 2,
    };

    let key = {
        let ctx = setup_with_pool(ConnectionPool::new(&config).await.unwrap()).await;
        ctx.go_offline();
        ctx.state
            .mutator
            .create_order(json!({"table": "8", "items": []}))
            .await
            .unwrap();
        let key = ctx.state.queue.list_all().await.unwrap()[0]
            .idempotency_key
            .clone();
        ctx.state.db_pool.close().await;
        key
    };

    let ctx = setup_with_pool(ConnectionPool::new(&config).await.unwrap()).await;
    let queued = ctx.state.queue.list_all().await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].idempotency_key, key);
    assert!(queued[0].placeholder_id.is_some());

    ctx.sign_in().await;
    drain(&ctx).await;
    assert_eq!(ctx.api.calls()[0].idempotency_key, key.as_str());
}
