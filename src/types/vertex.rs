use super::record_id::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Vertex record as stored by a graph server
///
/// Represents a remote vertex with:
/// - Record address (RecordId)
/// - Class (the type label partition it lives in)
/// - Unique key (the `id` of the originating table row)
/// - Attributes (every non-key, non-label column of the row)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vertex {
    /// Record address
    pub rid: RecordId,

    /// Remote class name (e.g., "V", "F", "M")
    pub class: String,

    /// Unique vertex key
    pub key: String,

    /// Attributes stored as a JSON object
    pub properties: Map<String, JsonValue>,
}

impl Vertex {
    /// Create a new vertex record
    pub fn new(
        rid: RecordId,
        class: impl Into<String>,
        key: impl Into<String>,
        properties: Map<String, JsonValue>,
    ) -> Self {
        Self {
            rid,
            class: class.into(),
            key: key.into(),
            properties,
        }
    }

    /// Get an attribute value by name
    pub fn get_property(&self, name: &str) -> Option<&JsonValue> {
        self.properties.get(name)
    }
}

/// Vertex payload sent to a server before it has a record address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewVertex {
    /// Unique vertex key
    pub key: String,

    /// Attributes
    pub properties: Map<String, JsonValue>,
}

impl NewVertex {
    pub fn new(key: impl Into<String>, properties: Map<String, JsonValue>) -> Self {
        Self {
            key: key.into(),
            properties,
        }
    }
}
