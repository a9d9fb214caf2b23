//! Envelope-identity header rewriting.
//!
//! The outbound mail service only accepts sends from a verified address,
//! so the identity headers of the stored message are rewritten before the
//! forward: `Return-Path`, `Sender`, and `From` take the verified address,
//! and a `Reply-To` carrying the original sender is inserted right after
//! `From` so replies still reach them.
//!
//! The policy is a single pass over the header block in document order,
//! and each rule fires on the first matching header only:
//!
//! - first `Return-Path` → value becomes `<verified>`
//! - first `Sender` → value becomes `verified`
//! - first `Reply-To` → removed (the inserted one counts: a `Reply-To`
//!   that appears after `From` in the source survives untouched)
//! - first `From` → bracketed address replaced with `verified` (display
//!   text kept) or the whole value replaced when unbracketed; a new
//!   `Reply-To: original_sender` is inserted immediately after it
//!
//! Later occurrences of any of these names are left untouched. One
//! consequence, kept deliberately: rewriting an already-rewritten message
//! appends a second `Reply-To` instead of replacing the first.

use crate::error::RewriteError;
use crate::message::{Header, RawMessage};

/// Rewrite the identity headers of a raw message.
///
/// The body and all non-identity headers pass through byte-for-byte.
/// Fails with [`RewriteError::MalformedMessage`] when the message carries no
/// `From` header at all.
pub fn rewrite(
    raw: &[u8],
    verified_address: &str,
    original_sender: &str,
) -> Result<Vec<u8>, RewriteError> {
    let message = RawMessage::parse(raw);

    let mut out = Vec::with_capacity(message.headers().len() + 1);
    let mut saw_return_path = false;
    let mut saw_sender = false;
    let mut saw_from = false;
    let mut reply_to_done = false;

    for header in message.headers() {
        let name = header.name.as_str();
        if !saw_return_path && name.eq_ignore_ascii_case("Return-Path") {
            out.push(Header::new(name, format!("<{verified_address}>")));
            saw_return_path = true;
        } else if !saw_sender && name.eq_ignore_ascii_case("Sender") {
            out.push(Header::new(name, verified_address));
            saw_sender = true;
        } else if !reply_to_done && name.eq_ignore_ascii_case("Reply-To") {
            reply_to_done = true;
        } else if !saw_from && name.eq_ignore_ascii_case("From") {
            out.push(Header::new(name, rewrite_from_value(&header.value, verified_address)));
            out.push(Header::new("Reply-To", original_sender));
            saw_from = true;
            reply_to_done = true;
        } else {
            out.push(header.clone());
        }
    }

    if !saw_from {
        return Err(RewriteError::MalformedMessage);
    }

    Ok(message.with_headers(out).to_bytes())
}

/// Rewrite a `From` value to carry the verified address.
///
/// If the value contains an angle-bracket token with a non-empty address,
/// only that address is substituted and the surrounding display text is
/// kept. Otherwise the whole value is replaced.
fn rewrite_from_value(value: &str, verified_address: &str) -> String {
    match bracket_span(value) {
        Some((start, end)) => {
            format!("{}<{}>{}", &value[..start], verified_address, &value[end..])
        }
        None => verified_address.to_string(),
    }
}

/// Byte span of the first non-empty `<...>` token, brackets included.
fn bracket_span(value: &str) -> Option<(usize, usize)> {
    let mut search = 0;
    while let Some(rel) = value[search..].find('<') {
        let open = search + rel;
        match value[open + 1..].find('>') {
            // Empty brackets don't count, keep looking.
            Some(0) => search = open + 2,
            Some(n) => return Some((open, open + n + 2)),
            None => return None,
        }
    }
    None
}
