//! Relay envelope (JSON).
//!
//! One flat JSON object per frame: a `type` tag, an optional `request_id`,
//! and whatever other fields the message carries. The relay reads only the
//! two header fields; everything else stays opaque in `payload`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{JudgewireError, Result};

/// Tagged message unit exchanged on every link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Message kind (field name is `type` in JSON).
    #[serde(rename = "type")]
    pub kind: String,
    /// Correlation id supplied by the original requester. The relay never
    /// fabricates one; a missing id is carried through as missing.
    #[serde(
        rename = "request_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub correlation_id: Option<String>,
    /// Remaining top-level fields, kept opaque (lifted in/out verbatim).
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    /// Build an envelope with an empty payload.
    pub fn new(kind: impl Into<String>, correlation_id: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            correlation_id,
            payload: Map::new(),
        }
    }

    /// Parse one wire frame.
    pub fn parse(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| JudgewireError::BadRequest(format!("invalid envelope json: {e}")))
    }

    /// Serialize for the wire.
    pub fn to_wire(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| JudgewireError::Internal(format!("json encode failed: {e}")))
    }

    /// Read a payload field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Insert a payload field (builder style).
    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.payload.insert(key.to_string(), value);
        self
    }
}
