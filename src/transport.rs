//! Mail transmission collaborator — SMTP via lettre for the real thing.
//!
//! The transport receives a fully assembled [`OutboundMessage`] and is
//! responsible for nothing but the send transaction. Injected as a trait
//! so tests can substitute a recording fake.

use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, SmtpTransport, Transport};

use crate::assemble::OutboundMessage;
use crate::config::TransportConfig;
use crate::error::SendError;

/// Outbound mail service.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Send the raw message to its destinations, from its source.
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError>;
}

/// SMTP-backed transport. The relay connection is configured once at
/// startup; each send builds an explicit envelope from the outbound
/// message and ships the raw bytes unmodified.
pub struct SmtpMailTransport {
    transport: SmtpTransport,
}

impl SmtpMailTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, SendError> {
        let mut builder = SmtpTransport::relay(&config.host)?.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn parse_address(address: &str) -> Result<Address, SendError> {
    address.parse().map_err(|source| SendError::Address {
        address: address.to_string(),
        source,
    })
}

/// Build the SMTP envelope for an outbound message: source as the
/// reverse path, every destination as a forward path.
pub fn envelope_for(message: &OutboundMessage) -> Result<Envelope, SendError> {
    let from = parse_address(&message.source)?;
    let to = message
        .destinations
        .iter()
        .map(|d| parse_address(d))
        .collect::<Result<Vec<_>, _>>()?;
    Envelope::new(Some(from), to).map_err(|e| SendError::Envelope(e.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError> {
        let envelope = envelope_for(message)?;
        self.transport.send_raw(&envelope, &message.data)?;
        Ok(())
    }
}
