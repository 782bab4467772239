use super::record_id::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Edge record as stored by a graph server
///
/// Represents a directed edge with:
/// - Record address (RecordId)
/// - Class (the type label partition it lives in)
/// - Out vertex (source) and in vertex (target), both as record addresses
///   and as vertex keys so a scan never needs a second lookup
/// - Attributes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    /// Record address
    pub rid: RecordId,

    /// Remote class name (e.g., "E", "friend")
    pub class: String,

    /// Source vertex address
    pub out_rid: RecordId,

    /// Target vertex address
    pub in_rid: RecordId,

    /// Source vertex key
    pub out_key: String,

    /// Target vertex key
    pub in_key: String,

    /// Attributes stored as a JSON object
    pub properties: Map<String, JsonValue>,
}

impl Edge {
    /// Check if this edge is a self-loop
    pub fn is_self_loop(&self) -> bool {
        self.out_rid == self.in_rid
    }
}

/// Edge payload sent to a server; endpoints are given by vertex key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEdge {
    /// Source vertex key
    pub out_key: String,

    /// Target vertex key
    pub in_key: String,

    /// Attributes
    pub properties: Map<String, JsonValue>,
}

impl NewEdge {
    pub fn new(
        out_key: impl Into<String>,
        in_key: impl Into<String>,
        properties: Map<String, JsonValue>,
    ) -> Self {
        Self {
            out_key: out_key.into(),
            in_key: in_key.into(),
            properties,
        }
    }
}
