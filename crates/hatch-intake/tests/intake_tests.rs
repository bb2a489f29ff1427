// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the intake orchestrator.
//!
//! Each test runs the real SQLite store against scripted providers via
//! `TestHarness`.

use std::sync::Arc;

use hatch_core::{
    CommunicationType, ConversationStore, DeliveryStatus, Direction, HatchError, PluginAdapter,
};
use hatch_test_utils::{email, sms, ScriptedTransport, TestHarness};
use tokio_util::sync::CancellationToken;

const ALICE: &str = "+1234567890";
const BOB: &str = "+0987654321";

#[tokio::test]
async fn outbound_sms_is_delivered_then_stored_with_provider_id() {
    let harness = TestHarness::builder()
        .with_text_transport(
            ScriptedTransport::new().then_json(200, serde_json::json!({ "sid": "SM42" })),
        )
        .build()
        .await
        .unwrap();

    let descriptor = sms(ALICE, BOB, "hello", "2024-03-01T10:00:00Z");
    harness
        .intake
        .intake(Direction::Outbound, &descriptor)
        .await
        .unwrap();

    assert_eq!(harness.text_transport.attempts().await, 1);
    assert_eq!(harness.email_transport.attempts().await, 0);
    let request = &harness.text_transport.requests().await[0];
    assert_eq!(request.body["from"], ALICE);
    assert_eq!(request.body["body"], "hello");

    let conversations = harness.intake.list_conversations().await.unwrap();
    assert_eq!(conversations.len(), 1);
    let conversation = harness
        .intake
        .get_conversation(conversations[0].id)
        .await
        .unwrap();
    let messages = conversation.messages.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].provider_id.as_deref(), Some("SM42"));
    assert_eq!(messages[0].status, DeliveryStatus::Success);
    assert_eq!(messages[0].from, ALICE);
    assert_eq!(messages[0].to, BOB);
}

#[tokio::test]
async fn inbound_message_skips_delivery() {
    let harness = TestHarness::new().await.unwrap();

    let mut descriptor = sms(BOB, ALICE, "reply", "2024-03-01T10:05:00Z");
    descriptor.provider_id = Some("SMinbound".into());
    harness
        .intake
        .intake(Direction::Inbound, &descriptor)
        .await
        .unwrap();

    assert_eq!(harness.text_transport.attempts().await, 0);
    let conversations = harness.intake.list_conversations().await.unwrap();
    let conversation = harness
        .intake
        .get_conversation(conversations[0].id)
        .await
        .unwrap();
    let messages = conversation.messages.unwrap();
    assert_eq!(messages[0].provider_id.as_deref(), Some("SMinbound"));
}

#[tokio::test]
async fn email_routes_to_email_provider_and_registers_email_participants() {
    let harness = TestHarness::new().await.unwrap();

    let descriptor = email(
        "alice@example.com",
        "bob@example.com",
        "hi bob",
        "2024-03-01T10:00:00Z",
    );
    harness
        .intake
        .intake(Direction::Outbound, &descriptor)
        .await
        .unwrap();

    assert_eq!(harness.email_transport.attempts().await, 1);
    assert_eq!(harness.text_transport.attempts().await, 0);
    let participant = harness
        .storage
        .get_participant("bob@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(participant.kind, CommunicationType::Email);
}

#[tokio::test]
async fn terminal_rejection_persists_nothing() {
    let harness = TestHarness::builder()
        .with_text_transport(ScriptedTransport::with_statuses(&[401]))
        .build()
        .await
        .unwrap();

    let err = harness
        .intake
        .intake(Direction::Outbound, &sms(ALICE, BOB, "hi", "2024-03-01T10:00:00Z"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HatchError::DeliveryTerminal {
            status: 401,
            attempts: 1,
            ..
        }
    ));
    assert_eq!(harness.text_transport.attempts().await, 1);
    assert!(harness.intake.list_conversations().await.unwrap().is_empty());
    assert!(harness.storage.get_participant(ALICE).await.unwrap().is_none());
    assert!(harness.storage.get_participant(BOB).await.unwrap().is_none());
}

#[tokio::test]
async fn exhausted_retries_persist_nothing() {
    let harness = TestHarness::builder()
        .with_text_transport(
            ScriptedTransport::with_statuses(&[500, 429]).then_fail("connection reset"),
        )
        .build()
        .await
        .unwrap();

    let err = harness
        .intake
        .intake(Direction::Outbound, &sms(ALICE, BOB, "hi", "2024-03-01T10:00:00Z"))
        .await
        .unwrap_err();

    assert!(matches!(err, HatchError::DeliveryExhausted { attempts: 3, .. }));
    assert_eq!(harness.text_transport.attempts().await, 3);
    assert!(harness.intake.list_conversations().await.unwrap().is_empty());
}

#[tokio::test]
async fn transient_failure_then_success_stores_once() {
    let harness = TestHarness::builder()
        .with_text_transport(
            ScriptedTransport::with_statuses(&[500])
                .then_json(200, serde_json::json!({ "id": "msg-7" })),
        )
        .build()
        .await
        .unwrap();

    harness
        .intake
        .intake(Direction::Outbound, &sms(ALICE, BOB, "hi", "2024-03-01T10:00:00Z"))
        .await
        .unwrap();

    assert_eq!(harness.text_transport.attempts().await, 2);
    let conversations = harness.intake.list_conversations().await.unwrap();
    let messages = harness
        .intake
        .get_conversation(conversations[0].id)
        .await
        .unwrap()
        .messages
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].provider_id.as_deref(), Some("msg-7"));
}

#[tokio::test]
async fn both_directions_share_one_conversation() {
    let harness = TestHarness::new().await.unwrap();

    harness
        .intake
        .intake(Direction::Outbound, &sms(ALICE, BOB, "first", "2024-03-01T10:00:00Z"))
        .await
        .unwrap();
    harness
        .intake
        .intake(Direction::Inbound, &sms(BOB, ALICE, "second", "2024-03-01T10:01:00Z"))
        .await
        .unwrap();
    harness
        .intake
        .intake(Direction::Outbound, &sms(ALICE, BOB, "third", "2024-03-01T10:02:00Z"))
        .await
        .unwrap();

    let conversations = harness.intake.list_conversations().await.unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].participants.len(), 2);

    let bodies: Vec<String> = harness
        .intake
        .get_conversation(conversations[0].id)
        .await
        .unwrap()
        .messages
        .unwrap()
        .into_iter()
        .map(|m| m.body)
        .collect();
    assert_eq!(bodies, ["first", "second", "third"]);
}

#[tokio::test]
async fn messages_are_ordered_by_timestamp_not_arrival() {
    let harness = TestHarness::new().await.unwrap();

    harness
        .intake
        .intake(Direction::Inbound, &sms(ALICE, BOB, "later", "2024-03-01T12:00:00Z"))
        .await
        .unwrap();
    harness
        .intake
        .intake(Direction::Inbound, &sms(BOB, ALICE, "earlier", "2024-03-01T09:00:00Z"))
        .await
        .unwrap();

    let conversations = harness.intake.list_conversations().await.unwrap();
    let messages = harness
        .intake
        .get_conversation(conversations[0].id)
        .await
        .unwrap()
        .messages
        .unwrap();
    assert_eq!(messages[0].body, "earlier");
    assert_eq!(messages[1].body, "later");
}

#[tokio::test]
async fn different_pairs_get_different_conversations() {
    let harness = TestHarness::new().await.unwrap();

    harness
        .intake
        .intake(Direction::Inbound, &sms(ALICE, BOB, "a", "2024-03-01T10:00:00Z"))
        .await
        .unwrap();
    harness
        .intake
        .intake(Direction::Inbound, &sms(ALICE, "+15550001111", "b", "2024-03-01T10:00:00Z"))
        .await
        .unwrap();

    assert_eq!(harness.intake.list_conversations().await.unwrap().len(), 2);
}

#[tokio::test]
async fn cancelled_before_delivery_sends_and_stores_nothing() {
    let harness = TestHarness::new().await.unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = harness
        .intake
        .intake_with_cancel(
            Direction::Outbound,
            &sms(ALICE, BOB, "hi", "2024-03-01T10:00:00Z"),
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HatchError::Cancelled));
    assert_eq!(harness.text_transport.attempts().await, 0);
    assert!(harness.intake.list_conversations().await.unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_inbound_stores_nothing() {
    let harness = TestHarness::new().await.unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = harness
        .intake
        .intake_with_cancel(
            Direction::Inbound,
            &sms(BOB, ALICE, "hi", "2024-03-01T10:00:00Z"),
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HatchError::Cancelled));
    assert!(harness.intake.list_conversations().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_contact_creates_one_conversation() {
    let harness = TestHarness::new().await.unwrap();
    let intake = Arc::clone(&harness.intake);

    let mut handles = Vec::new();
    for i in 0..12 {
        let intake = Arc::clone(&intake);
        handles.push(tokio::spawn(async move {
            let (from, to) = if i % 2 == 0 { (ALICE, BOB) } else { (BOB, ALICE) };
            let at = format!("2024-03-01T10:00:{i:02}Z");
            intake
                .intake(Direction::Inbound, &sms(from, to, &format!("m{i}"), &at))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let conversations = harness.intake.list_conversations().await.unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(
        harness
            .storage
            .count_messages(conversations[0].id, true)
            .await
            .unwrap(),
        12
    );
}

#[tokio::test]
async fn self_addressed_message_is_rejected_and_not_stored() {
    let harness = TestHarness::new().await.unwrap();

    let err = harness
        .intake
        .intake(Direction::Inbound, &sms(ALICE, ALICE, "me", "2024-03-01T10:00:00Z"))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(hatch_core::Stage::Resolver));
    assert!(harness.intake.list_conversations().await.unwrap().is_empty());
    // Rejected before any participant is registered.
    assert!(harness.storage.get_participant(ALICE).await.unwrap().is_none());
}

#[tokio::test]
async fn self_addressed_outbound_is_never_sent() {
    let harness = TestHarness::new().await.unwrap();

    let err = harness
        .intake
        .intake(Direction::Outbound, &sms(ALICE, ALICE, "me", "2024-03-01T10:00:00Z"))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(hatch_core::Stage::Resolver));
    assert_eq!(harness.text_transport.attempts().await, 0);
    assert!(harness.intake.list_conversations().await.unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_store_and_both_clients() {
    let harness = TestHarness::new().await.unwrap();
    let health = harness.intake.health().await;

    let names: Vec<&str> = health.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["sqlite", "sms", "email"]);
    assert_eq!(harness.storage.name(), "sqlite");
    // Default config carries no API keys.
    assert!(matches!(health[1].1, hatch_core::HealthStatus::Degraded(_)));
}

#[tokio::test]
async fn store_is_reachable_through_trait_object() {
    let harness = TestHarness::new().await.unwrap();
    let store: Arc<dyn ConversationStore> = harness.storage.clone();
    let id = store
        .resolve_participant(ALICE, CommunicationType::Phone)
        .await
        .unwrap();
    let participant = harness.storage.get_participant(ALICE).await.unwrap().unwrap();
    assert_eq!(participant.id, id);
}
