//! Request correlation
//!
//! Every engine command takes a `RequestContext`. Its request id is attached
//! to errors and boundary log events. An upstream `X-Request-ID` is reused
//! when it is usable, otherwise a UUIDv7 is minted; a W3C `traceparent`
//! header, when present, contributes the trace id.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const MAX_REQUEST_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Reuse an upstream `X-Request-ID`, minting a new id when it is unusable
    ///
    /// Usable means 1 to 128 visible ASCII characters once trimmed.
    pub fn from_header(value: Option<&str>) -> Self {
        value
            .map(str::trim)
            .filter(|v| {
                !v.is_empty()
                    && v.len() <= MAX_REQUEST_ID_LEN
                    && v.bytes().all(|b| b.is_ascii_graphic())
            })
            .map(|v| Self(v.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 128-bit trace id as 32 lowercase hex digits, the W3C trace-context form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

impl TraceId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Trace id carried by a `traceparent` header
    ///
    /// Format: `<version>-<trace id>-<parent id>-<flags>`. Returns `None` for
    /// a malformed header, the forbidden version `ff` or an all-zero trace id.
    pub fn from_traceparent(header: &str) -> Option<Self> {
        let mut parts = header.trim().split('-');
        let version = parts.next()?;
        let trace = parts.next()?;
        let parent = parts.next()?;
        let flags = parts.next()?;

        if !is_lower_hex(version, 2) || version == "ff" {
            return None;
        }
        // Version 00 has exactly four fields; later versions may append more.
        if version == "00" && parts.next().is_some() {
            return None;
        }
        if !is_lower_hex(trace, 32) || !is_lower_hex(parent, 16) || !is_lower_hex(flags, 2) {
            return None;
        }
        if trace.bytes().all(|b| b == b'0') {
            return None;
        }
        Some(Self(trace.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub trace_id: Option<TraceId>,
}

impl RequestContext {
    /// Fresh request id, no trace
    pub fn new() -> Self {
        Self {
            request_id: RequestId::generate(),
            trace_id: None,
        }
    }

    /// Context for the correlation headers an adapter received
    pub fn from_headers(request_id: Option<&str>, traceparent: Option<&str>) -> Self {
        Self {
            request_id: RequestId::from_header(request_id),
            trace_id: traceparent.and_then(TraceId::from_traceparent),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
