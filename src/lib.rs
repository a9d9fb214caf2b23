//! Mail relay — forwards stored inbound mail to configured destinations,
//! rewriting identity headers so the send leaves from a verified address.

pub mod assemble;
pub mod config;
pub mod error;
pub mod forwarder;
pub mod message;
pub mod notification;
pub mod resolve;
pub mod rewrite;
pub mod storage;
pub mod transport;
