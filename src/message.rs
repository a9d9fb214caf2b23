//! Raw message model — ordered header block + opaque body.
//!
//! A raw message is split into a header block (an ordered list of
//! `{name, value}` pairs) and the body bytes that follow the first blank
//! line. Only the header block is ever interpreted; the body is carried
//! through untouched. Folded continuation lines (leading SP/HT) belong to
//! the preceding header and are preserved inside its value.
//!
//! Serialization normalizes two things and nothing else: every header is
//! written as `Name: value` (single space after the colon), and all header
//! line terminators follow the convention of the first header line in the
//! source (CRLF or LF).
//!
//! Only the body is byte-preserving. Header lines are decoded as text, so
//! non-UTF-8 bytes in any header come back out as U+FFFD replacement
//! characters on serialization.

/// A single header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    /// Value with leading whitespace stripped. Folded continuation lines
    /// are kept embedded as `\n` + their original leading whitespace.
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Line terminator convention of a header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newline {
    Crlf,
    Lf,
}

impl Newline {
    fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Crlf => b"\r\n",
            Self::Lf => b"\n",
        }
    }
}

/// A parsed raw message: ordered headers plus opaque body bytes.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub(crate) headers: Vec<Header>,
    body: Vec<u8>,
    newline: Newline,
    /// Whether a blank separator line followed the header block.
    has_separator: bool,
}

impl RawMessage {
    /// Parse raw bytes into an ordered header block and body.
    ///
    /// Parsing never fails: a message with no blank line is all headers,
    /// and a non-header line (no colon, not a continuation) ends the
    /// header block early with the remainder treated as body.
    pub fn parse(bytes: &[u8]) -> Self {
        let mut headers: Vec<Header> = Vec::new();
        let mut newline = None;
        let mut body = Vec::new();
        let mut has_separator = false;

        let mut pos = 0;
        while pos < bytes.len() {
            let (line_end, next) = match bytes[pos..].iter().position(|&b| b == b'\n') {
                Some(i) => (pos + i, pos + i + 1),
                None => (bytes.len(), bytes.len()),
            };
            let terminated = line_end < bytes.len();
            let mut text_end = line_end;
            if terminated && text_end > pos && bytes[text_end - 1] == b'\r' {
                text_end -= 1;
            }
            let line = String::from_utf8_lossy(&bytes[pos..text_end]).into_owned();

            if terminated && newline.is_none() {
                newline = Some(if text_end < line_end {
                    Newline::Crlf
                } else {
                    Newline::Lf
                });
            }

            if line.is_empty() {
                if terminated {
                    // Blank line: header block ends, the rest is body.
                    body = bytes[next..].to_vec();
                    has_separator = true;
                }
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                match headers.last_mut() {
                    Some(prev) => {
                        prev.value.push('\n');
                        prev.value.push_str(&line);
                    }
                    // Continuation with nothing to continue: not a header
                    // block at all, treat the rest as body.
                    None => {
                        body = bytes[pos..].to_vec();
                        break;
                    }
                }
            } else if let Some(colon) = line.find(':') {
                let name = line[..colon].to_string();
                let value = line[colon + 1..]
                    .trim_start_matches([' ', '\t'])
                    .to_string();
                headers.push(Header { name, value });
            } else {
                // Not a header line: header block ends here, no separator.
                body = bytes[pos..].to_vec();
                break;
            }

            pos = next;
        }

        Self {
            headers,
            body,
            newline: newline.unwrap_or(Newline::Crlf),
            has_separator,
        }
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// First header with the given name, matched ASCII-case-insensitively.
    pub fn first_header(&self, name: &str) -> Option<&Header> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
    }

    /// All headers with the given name, in document order.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
            .collect()
    }

    /// Replace the header block, keeping body and line conventions.
    pub(crate) fn with_headers(mut self, headers: Vec<Header>) -> Self {
        self.headers = headers;
        self
    }

    /// Serialize back to bytes. The body is emitted verbatim.
    pub fn to_bytes(&self) -> Vec<u8> {
        let nl = self.newline.as_bytes();
        let mut out = Vec::new();
        for header in &self.headers {
            out.extend_from_slice(header.name.as_bytes());
            if header.value.is_empty() {
                out.extend_from_slice(b":");
            } else {
                out.extend_from_slice(b": ");
                for (i, part) in header.value.split('\n').enumerate() {
                    if i > 0 {
                        out.extend_from_slice(nl);
                    }
                    out.extend_from_slice(part.as_bytes());
                }
            }
            out.extend_from_slice(nl);
        }
        if self.has_separator {
            out.extend_from_slice(nl);
        }
        out.extend_from_slice(&self.body);
        out
    }
}
