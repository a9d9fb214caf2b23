//! Error types for the mail relay.
//!
//! Every error is terminal for the invocation that raised it: nothing is
//! retried or recovered internally. Whether a failure is worth retrying
//! is the hosting layer's call.

/// Top-level error type for a forward invocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Rewrite error: {0}")]
    Rewrite(#[from] RewriteError),

    #[error("Assemble error: {0}")]
    Assemble(#[from] AssembleError),

    #[error("Send error: {0}")]
    Send(#[from] SendError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Notification-shape violations, raised at the boundary before the core
/// transformation runs.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Expected exactly one notification record, got {count}")]
    RecordCount { count: usize },

    #[error("Unrecognized notification source {got:?} (expected {expected:?})")]
    UnrecognizedSource {
        got: String,
        expected: &'static str,
    },

    #[error("Unrecognized notification version {version:?} (expected {expected:?})")]
    UnrecognizedVersion {
        version: String,
        expected: &'static str,
    },

    #[error("Notification for message {message_id} carries no recipients")]
    NoRecipients { message_id: String },
}

/// Object-store failures while loading the stored raw message.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Stored message not found at {reference}")]
    NotFound { reference: String },

    #[error("Storage I/O failure for {reference}: {source}")]
    Io {
        reference: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Header-rewriting failures.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("Malformed message: no From header present")]
    MalformedMessage,
}

/// Outbound-message assembly failures.
#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("No forwarding destinations resolved for source {verified_source}")]
    EmptyDestinations { verified_source: String },
}

/// Mail transport failures.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Invalid envelope address {address}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("Envelope construction failed: {0}")]
    Envelope(String),

    #[error("SMTP send failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Transport failure: {0}")]
    Other(String),
}

/// Result type alias for the relay.
pub type Result<T> = std::result::Result<T, Error>;
