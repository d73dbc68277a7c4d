mod common;

use std::convert::Infallible;
use std::time::Duration;

use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use parley_core::types::id::UserId;

use common::Harness;

struct Wire {
    inbound: UnboundedSender<Result<String, Infallible>>,
    outbound: UnboundedReceiver<String>,
    task: JoinHandle<()>,
}

impl Wire {
    fn open(harness: &Harness, credential: Option<String>) -> Self {
        let (inbound, inbound_rx) = mpsc::unbounded();
        let (outbound_tx, outbound) = mpsc::unbounded();
        let gateway = harness.engine.gateway.clone();
        let task = tokio::spawn(async move {
            gateway.serve(credential, inbound_rx, outbound_tx).await;
        });
        Self {
            inbound,
            outbound,
            task,
        }
    }

    fn send(&self, frame: Value) {
        self.send_raw(frame.to_string());
    }

    fn send_raw(&self, frame: String) {
        self.inbound.unbounded_send(Ok(frame)).expect("session alive");
    }

    async fn next(&mut self) -> Value {
        let frame = timeout(Duration::from_secs(5), self.outbound.next())
            .await
            .expect("frame in time")
            .expect("open transport");
        serde_json::from_str(&frame).expect("json frame")
    }
}

#[tokio::test]
async fn test_bad_token_gets_auth_error_and_closes() {
    let harness = Harness::new();
    let mut wire = Wire::open(&harness, Some("forged".to_string()));

    let frame = wire.next().await;
    assert_eq!(frame["event"], "auth-error");
    assert!(frame["data"]["message"].is_string());

    timeout(Duration::from_secs(5), wire.task).await.unwrap().unwrap();
    assert!(wire.outbound.next().await.is_none());
    assert!(harness.engine.presence.list_online().is_empty());
}

#[tokio::test]
async fn test_missing_token_is_an_auth_failure() {
    let harness = Harness::new();
    let mut wire = Wire::open(&harness, None);

    let frame = wire.next().await;
    assert_eq!(frame["event"], "auth-error");
    assert_eq!(harness.engine.metrics_snapshot().auth_failures, 1);
}

#[tokio::test]
async fn test_session_round_trip_and_cleanup_on_stream_end() {
    let harness = Harness::new();
    let alice = UserId::new();
    let bob = UserId::new();
    let mut a = Wire::open(&harness, Some(alice.to_string()));
    assert_eq!(a.next().await["event"], "online-users");
    let mut b = Wire::open(&harness, Some(bob.to_string()));

    let presence = b.next().await;
    assert_eq!(presence["event"], "online-users");
    assert_eq!(presence["data"]["users"].as_array().unwrap().len(), 2);
    // Alice also hears Bob come online.
    assert_eq!(a.next().await["event"], "online-users");

    a.send(json!({ "event": "send", "data": { "peerId": bob, "text": "hello" } }));

    for wire in [&mut a, &mut b] {
        let list = wire.next().await;
        assert_eq!(list["event"], "message-list");
        assert_eq!(list["data"]["messages"][0]["text"], "hello");
        assert_eq!(list["data"]["messages"][0]["senderId"], json!(alice));
        assert_eq!(wire.next().await["event"], "sidebar");
    }

    b.send_raw("{ not json".to_string());
    let failure = b.next().await;
    assert_eq!(failure["event"], "operation-failed");
    assert_eq!(failure["data"]["operation"], "decode");

    drop(b.inbound);
    timeout(Duration::from_secs(5), b.task).await.unwrap().unwrap();
    assert!(!harness.engine.presence.is_online(bob));

    let offline = a.next().await;
    assert_eq!(offline["event"], "online-users");
    assert_eq!(offline["data"]["users"], json!([alice]));
}

#[tokio::test]
async fn test_disconnect_event_ends_session() {
    let harness = Harness::new();
    let user = UserId::new();
    let mut wire = Wire::open(&harness, Some(user.to_string()));
    assert_eq!(wire.next().await["event"], "online-users");

    wire.send(json!({ "event": "disconnect" }));

    timeout(Duration::from_secs(5), wire.task).await.unwrap().unwrap();
    assert!(!harness.engine.presence.is_online(user));
    assert_eq!(harness.engine.metrics_snapshot().connections_active, 0);
}

#[tokio::test]
async fn test_engine_shutdown_closes_sessions() {
    let harness = Harness::new();
    let user = UserId::new();
    let mut wire = Wire::open(&harness, Some(user.to_string()));
    assert_eq!(wire.next().await["event"], "online-users");

    harness.engine.shutdown().await.unwrap();

    timeout(Duration::from_secs(5), wire.task).await.unwrap().unwrap();
    assert!(harness.engine.presence.list_online().is_empty());
}
