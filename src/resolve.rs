//! Recipient resolution — original recipients to forwarding destinations.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// Static table mapping an original recipient address to the addresses
/// its mail is forwarded to.
///
/// Loaded once from configuration and never mutated afterwards. In the
/// config file a mapping value may be a single address string or an array
/// of addresses; both deserialize to an ordered list.
#[derive(Debug, Clone, Default)]
pub struct ForwardMapping(HashMap<String, Vec<String>>);

impl ForwardMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping entry. Used when building a table in code; config
    /// files go through serde instead.
    pub fn insert(&mut self, from: impl Into<String>, to: Vec<String>) {
        self.0.insert(from.into(), to);
    }

    /// Forwarding destinations for a recipient. An unmapped recipient
    /// yields an empty slice, never an error.
    pub fn destinations(&self, recipient: &str) -> &[String] {
        self.0.get(recipient).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A mapping value: one address or a list of addresses.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for ForwardMapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = HashMap::<String, OneOrMany>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .map(|(from, to)| {
                    let to = match to {
                        OneOrMany::One(addr) => vec![addr],
                        OneOrMany::Many(addrs) => addrs,
                    };
                    (from, to)
                })
                .collect(),
        ))
    }
}

/// Resolve original recipients to forwarding destinations.
///
/// Walks the recipients in input order and appends each one's mapped
/// destinations in mapping-entry order. Unmapped recipients contribute
/// nothing. No deduplication: overlapping mapping entries produce the
/// destination once per contributing recipient. An empty result is valid
/// here; rejecting it is the assembler's call.
pub fn resolve(recipients: &[String], mapping: &ForwardMapping) -> Vec<String> {
    recipients
        .iter()
        .flat_map(|recipient| mapping.destinations(recipient).iter().cloned())
        .collect()
}
