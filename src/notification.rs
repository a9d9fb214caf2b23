//! Inbound notification model and boundary validation.
//!
//! The mail-intake service delivers a JSON event describing one received
//! message: which envelope recipients it was addressed to, who sent it,
//! and the identifier it was stored under. The event shape allows a list
//! of records; this relay processes exactly one per invocation and
//! rejects anything else before the core transformation runs.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Record source type this relay recognizes.
pub const EVENT_SOURCE: &str = "mail:receive";

/// Record version this relay recognizes.
pub const EVENT_VERSION: &str = "1.0";

/// Raw notification event as delivered by the intake service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    #[serde(default)]
    pub records: Vec<NotificationRecord>,
}

/// One received-message record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub event_source: String,
    pub event_version: String,
    pub receipt: Receipt,
    pub mail: MailInfo,
}

/// Envelope receipt data: who the message was addressed to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub recipients: Vec<String>,
}

/// Stored-message metadata: identifier and originating sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailInfo {
    pub message_id: String,
    pub source: String,
}

/// A validated notification, ready for the core transformation.
#[derive(Debug, Clone)]
pub struct InboundNotification {
    /// Original envelope recipients, in order. Non-empty; the first one
    /// is the verified address the forward is sent as.
    pub recipients: Vec<String>,
    /// Identifier the raw message was stored under.
    pub message_id: String,
    /// Original sender, carried into the inserted `Reply-To`.
    pub sender: String,
}

impl InboundNotification {
    /// Validate an event down to a single usable notification.
    ///
    /// Enforced here, before anything touches the message: exactly one
    /// record, recognized source type and version, non-empty recipients.
    pub fn from_event(event: NotificationEvent) -> Result<Self, ValidationError> {
        let record = match <[NotificationRecord; 1]>::try_from(event.records) {
            Ok([record]) => record,
            Err(records) => {
                return Err(ValidationError::RecordCount {
                    count: records.len(),
                });
            }
        };

        if record.event_source != EVENT_SOURCE {
            return Err(ValidationError::UnrecognizedSource {
                got: record.event_source,
                expected: EVENT_SOURCE,
            });
        }
        if record.event_version != EVENT_VERSION {
            return Err(ValidationError::UnrecognizedVersion {
                version: record.event_version,
                expected: EVENT_VERSION,
            });
        }
        if record.receipt.recipients.is_empty() {
            return Err(ValidationError::NoRecipients {
                message_id: record.mail.message_id,
            });
        }

        Ok(Self {
            recipients: record.receipt.recipients,
            message_id: record.mail.message_id,
            sender: record.mail.source,
        })
    }

    /// The verified address the forward is sent as: the first original
    /// recipient, whose domain is verified with the outbound service.
    pub fn verified_address(&self) -> &str {
        &self.recipients[0]
    }
}
