//! Outbound message assembly.

use serde::Serialize;

use crate::error::AssembleError;

/// The payload handed to the mail transport: a verified source address,
/// the resolved forwarding destinations, and the rewritten raw bytes.
///
/// Serializes to JSON for the diagnostics dump logged on send failure;
/// the raw data is rendered lossily as text there.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub source: String,
    pub destinations: Vec<String>,
    #[serde(serialize_with = "serialize_data")]
    pub data: Vec<u8>,
}

impl OutboundMessage {
    /// Pretty-printed JSON dump for send-failure diagnostics.
    pub fn dump(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<dump failed: {e}>"))
    }
}

fn serialize_data<S>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&String::from_utf8_lossy(data))
}

/// Combine resolved destinations, the verified source, and the rewritten
/// bytes into a sendable message.
///
/// Pure combination, except for one policy decision: zero destinations is
/// a hard stop. Resolution that mapped nothing means there is nobody to
/// forward to, and sending such a message would be meaningless work.
pub fn assemble(
    destinations: Vec<String>,
    source: String,
    rewritten: Vec<u8>,
) -> Result<OutboundMessage, AssembleError> {
    if destinations.is_empty() {
        return Err(AssembleError::EmptyDestinations {
            verified_source: source,
        });
    }
    Ok(OutboundMessage {
        source,
        destinations,
        data: rewritten,
    })
}
