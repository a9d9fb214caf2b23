//! Integration tests for the forward pipeline.
//!
//! Each test wires a `Forwarder` to an in-memory object store and a
//! recording mail transport, then drives it with a notification event
//! and inspects what (if anything) was handed to the transport.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mail_relay::assemble::OutboundMessage;
use mail_relay::config::RelayConfig;
use mail_relay::error::{
    AssembleError, Error, FetchError, RewriteError, SendError, ValidationError,
};
use mail_relay::forwarder::Forwarder;
use mail_relay::message::RawMessage;
use mail_relay::notification::{EVENT_SOURCE, EVENT_VERSION, NotificationEvent};
use mail_relay::storage::{ObjectStore, StorageReference};
use mail_relay::transport::MailTransport;

/// In-memory object store keyed by `location/key`.
struct MemoryStore {
    objects: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    fn with_message(message_id: &str, raw: &[u8]) -> Self {
        let mut objects = HashMap::new();
        objects.insert(format!("mail-store/inbound/{message_id}"), raw.to_vec());
        Self { objects }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn fetch(&self, reference: &StorageReference) -> Result<Vec<u8>, FetchError> {
        self.objects
            .get(&format!("{}/{}", reference.location, reference.key))
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                reference: reference.to_string(),
            })
    }
}

/// Transport that records every send, optionally failing them all.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    fail: bool,
}

impl RecordingTransport {
    fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError> {
        if self.fail {
            return Err(SendError::Other("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

fn config() -> RelayConfig {
    serde_json::from_value(serde_json::json!({
        "storageLocation": "mail-store",
        "storageKeyPrefix": "inbound/",
        "forwardMapping": {
            "info@example.com": ["john@x.com", "jen@x.com"],
            "abuse@example.com": "jim@x.com",
            "sales@example.com": ["jen@x.com"]
        }
    }))
    .unwrap()
}

fn event(recipients: &[&str], message_id: &str, sender: &str) -> NotificationEvent {
    serde_json::from_value(serde_json::json!({
        "records": [{
            "eventSource": EVENT_SOURCE,
            "eventVersion": EVENT_VERSION,
            "receipt": { "recipients": recipients },
            "mail": { "messageId": message_id, "source": sender }
        }]
    }))
    .unwrap()
}

fn forwarder(store: MemoryStore, transport: Arc<RecordingTransport>) -> Forwarder {
    Forwarder::new(config(), Arc::new(store), transport)
}

const RAW: &[u8] = b"Return-Path: <bounce@ext.com>\r\nFrom: Alice <alice@ext.com>\r\nTo: info@example.com\r\nSubject: hello\r\n\r\nHi there\r\n";

#[tokio::test]
async fn forwards_to_mapped_destinations() {
    let transport = Arc::new(RecordingTransport::default());
    let fwd = forwarder(MemoryStore::with_message("msg-1", RAW), transport.clone());

    let outcome = fwd
        .forward(event(&["info@example.com"], "msg-1", "alice@ext.com"))
        .await
        .unwrap();

    assert_eq!(outcome.original_recipients, vec!["info@example.com"]);
    assert_eq!(outcome.destinations, vec!["john@x.com", "jen@x.com"]);

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].source, "info@example.com");
    assert_eq!(sent[0].destinations, vec!["john@x.com", "jen@x.com"]);
}

#[tokio::test]
async fn single_string_mapping_forwards_to_one_destination() {
    let transport = Arc::new(RecordingTransport::default());
    let fwd = forwarder(MemoryStore::with_message("msg-2", RAW), transport.clone());

    let outcome = fwd
        .forward(event(&["abuse@example.com"], "msg-2", "alice@ext.com"))
        .await
        .unwrap();

    assert_eq!(outcome.destinations, vec!["jim@x.com"]);
    assert_eq!(transport.sent()[0].source, "abuse@example.com");
}

#[tokio::test]
async fn sent_message_carries_rewritten_identity_headers() {
    let transport = Arc::new(RecordingTransport::default());
    let fwd = forwarder(MemoryStore::with_message("msg-3", RAW), transport.clone());

    fwd.forward(event(&["info@example.com"], "msg-3", "alice@ext.com"))
        .await
        .unwrap();

    let sent = transport.sent();
    let msg = RawMessage::parse(&sent[0].data);
    assert_eq!(
        msg.first_header("Return-Path").unwrap().value,
        "<info@example.com>"
    );
    assert_eq!(
        msg.first_header("From").unwrap().value,
        "Alice <info@example.com>"
    );
    assert_eq!(msg.first_header("Reply-To").unwrap().value, "alice@ext.com");
    // Untouched headers and body survive as-is.
    assert_eq!(msg.first_header("Subject").unwrap().value, "hello");
    assert_eq!(msg.body(), b"Hi there\r\n");
}

#[tokio::test]
async fn overlapping_mappings_keep_duplicate_destinations() {
    let transport = Arc::new(RecordingTransport::default());
    let fwd = forwarder(MemoryStore::with_message("msg-4", RAW), transport.clone());

    let outcome = fwd
        .forward(event(
            &["info@example.com", "sales@example.com"],
            "msg-4",
            "alice@ext.com",
        ))
        .await
        .unwrap();

    // jen@x.com appears once per contributing recipient.
    assert_eq!(
        outcome.destinations,
        vec!["john@x.com", "jen@x.com", "jen@x.com"]
    );
}

#[tokio::test]
async fn unmapped_recipient_stops_with_empty_destinations() {
    let transport = Arc::new(RecordingTransport::default());
    let fwd = forwarder(MemoryStore::with_message("msg-5", RAW), transport.clone());

    let err = fwd
        .forward(event(&["unknown@example.com"], "msg-5", "alice@ext.com"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Assemble(AssembleError::EmptyDestinations { .. })
    ));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn multi_record_event_is_rejected_before_the_core_runs() {
    let transport = Arc::new(RecordingTransport::default());
    let fwd = forwarder(MemoryStore::with_message("msg-6", RAW), transport.clone());

    let two_records: NotificationEvent = serde_json::from_value(serde_json::json!({
        "records": [
            {
                "eventSource": EVENT_SOURCE,
                "eventVersion": EVENT_VERSION,
                "receipt": { "recipients": ["info@example.com"] },
                "mail": { "messageId": "msg-6", "source": "alice@ext.com" }
            },
            {
                "eventSource": EVENT_SOURCE,
                "eventVersion": EVENT_VERSION,
                "receipt": { "recipients": ["abuse@example.com"] },
                "mail": { "messageId": "msg-7", "source": "bob@ext.com" }
            }
        ]
    }))
    .unwrap();

    let err = fwd.forward(two_records).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::RecordCount { count: 2 })
    ));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn message_without_from_header_is_malformed() {
    let transport = Arc::new(RecordingTransport::default());
    let raw = b"To: info@example.com\r\nSubject: hi\r\n\r\nbody";
    let fwd = forwarder(MemoryStore::with_message("msg-8", raw), transport.clone());

    let err = fwd
        .forward(event(&["info@example.com"], "msg-8", "alice@ext.com"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Rewrite(RewriteError::MalformedMessage)
    ));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn missing_stored_message_is_a_fetch_error() {
    let transport = Arc::new(RecordingTransport::default());
    let fwd = forwarder(
        MemoryStore {
            objects: HashMap::new(),
        },
        transport.clone(),
    );

    let err = fwd
        .forward(event(&["info@example.com"], "msg-9", "alice@ext.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch(FetchError::NotFound { .. })));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn transport_failure_propagates_as_send_error() {
    let transport = Arc::new(RecordingTransport::failing());
    let fwd = forwarder(MemoryStore::with_message("msg-10", RAW), transport.clone());

    let err = fwd
        .forward(event(&["info@example.com"], "msg-10", "alice@ext.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Send(SendError::Other(_))));
}

#[tokio::test]
async fn source_is_always_the_first_original_recipient() {
    let transport = Arc::new(RecordingTransport::default());
    let fwd = forwarder(MemoryStore::with_message("msg-11", RAW), transport.clone());

    fwd.forward(event(
        &["abuse@example.com", "info@example.com"],
        "msg-11",
        "alice@ext.com",
    ))
    .await
    .unwrap();

    let sent = transport.sent();
    assert_eq!(sent[0].source, "abuse@example.com");
    assert_eq!(
        sent[0].destinations,
        vec!["jim@x.com", "john@x.com", "jen@x.com"]
    );
}
