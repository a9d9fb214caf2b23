//! The forward pipeline: validate → resolve → fetch → rewrite →
//! assemble → send.
//!
//! One notification per invocation, strictly sequential, fail-fast. The
//! only suspension points are the two injected collaborators (object
//! store and mail transport); everything between them is a pure
//! transformation. No state is shared across invocations beyond the
//! immutable configuration, so concurrent invocations are independent.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info};

use crate::assemble::assemble;
use crate::config::RelayConfig;
use crate::error::{Error, Result};
use crate::notification::{InboundNotification, NotificationEvent};
use crate::resolve::resolve;
use crate::rewrite::rewrite;
use crate::storage::{ObjectStore, StorageReference};
use crate::transport::MailTransport;

/// Successful outcome of one forward invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardOutcome {
    pub original_recipients: Vec<String>,
    pub destinations: Vec<String>,
}

impl fmt::Display for ForwardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Forwarded message for {} to {}",
            self.original_recipients.join(", "),
            self.destinations.join(", ")
        )
    }
}

/// Forwards one stored message per invocation.
pub struct Forwarder {
    config: RelayConfig,
    store: Arc<dyn ObjectStore>,
    transport: Arc<dyn MailTransport>,
}

impl Forwarder {
    pub fn new(
        config: RelayConfig,
        store: Arc<dyn ObjectStore>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            config,
            store,
            transport,
        }
    }

    /// Run the full pipeline for one notification event.
    ///
    /// Any failure terminates the invocation immediately; a send failure
    /// additionally logs a dump of the message that was attempted.
    pub async fn forward(&self, event: NotificationEvent) -> Result<ForwardOutcome> {
        let notification = match InboundNotification::from_event(event.clone()) {
            Ok(notification) => notification,
            Err(e) => {
                error!(
                    event = %serde_json::to_string(&event).unwrap_or_default(),
                    "Rejected notification: {e}"
                );
                return Err(e.into());
            }
        };

        let message_id = notification.message_id.as_str();
        info!(
            message_id,
            "Origin recipients: {}",
            notification.recipients.join(", ")
        );

        let destinations = resolve(&notification.recipients, &self.config.forward_mapping);
        info!(message_id, "Forward recipients: {}", destinations.join(", "));

        let reference = StorageReference::new(
            &self.config.storage_location,
            &self.config.storage_key_prefix,
            message_id,
        );
        info!(message_id, "Loading message from {reference}");
        let raw = self.store.fetch(&reference).await?;

        let rewritten = rewrite(&raw, notification.verified_address(), &notification.sender)?;
        let outbound = assemble(
            destinations,
            notification.verified_address().to_string(),
            rewritten,
        )?;

        if let Err(e) = self.transport.send(&outbound).await {
            error!(message_id, "Send failed, attempted message:\n{}", outbound.dump());
            return Err(Error::Send(e));
        }

        let outcome = ForwardOutcome {
            original_recipients: notification.recipients,
            destinations: outbound.destinations,
        };
        info!(message_id, "{outcome}");
        Ok(outcome)
    }
}
