//! Response sinks
//!
//! Every operation reports its outcome as a short human-readable phrase,
//! the way fastboot replies: `OKAY` followed by an optional payload, or
//! `FAIL` followed by the reason.

use heapless::String;

/// Maximum length of a fastboot response, including the 4-byte status
pub const RESPONSE_LEN: usize = 64;

/// Destination for operation status
pub trait Response {
    /// Report success with an optional payload (may be empty)
    fn okay(&mut self, msg: &str);

    /// Report failure with a short reason
    fn fail(&mut self, msg: &str);
}

/// Outcome recorded in a [`FastbootResponse`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// `OKAY`
    Okay,
    /// `FAIL`
    Fail,
}

/// Fixed-capacity fastboot response buffer
///
/// Holds the response in wire form (`OKAY...` / `FAIL...`), truncated to
/// [`RESPONSE_LEN`] bytes. A later report replaces an earlier one.
#[derive(Debug, Clone, Default)]
pub struct FastbootResponse {
    buf: String<RESPONSE_LEN>,
}

impl FastbootResponse {
    /// Create an empty response
    pub fn new() -> Self {
        Self::default()
    }

    /// The full response line, or an empty string if nothing was reported
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Whether anything was reported yet
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Status of the response, if any
    pub fn kind(&self) -> Option<ResponseKind> {
        match self.buf.get(..4) {
            Some("OKAY") => Some(ResponseKind::Okay),
            Some("FAIL") => Some(ResponseKind::Fail),
            _ => None,
        }
    }

    /// The payload or failure reason following the status
    pub fn message(&self) -> &str {
        self.buf.get(4..).unwrap_or("")
    }

    fn set(&mut self, tag: &str, msg: &str) {
        self.buf.clear();
        // tag is 4 ASCII bytes, always fits
        let _ = self.buf.push_str(tag);
        for c in msg.chars() {
            if self.buf.push(c).is_err() {
                break;
            }
        }
    }
}

impl Response for FastbootResponse {
    fn okay(&mut self, msg: &str) {
        self.set("OKAY", msg);
    }

    fn fail(&mut self, msg: &str) {
        self.set("FAIL", msg);
    }
}
