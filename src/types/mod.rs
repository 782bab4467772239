/// Record types exchanged with a graph server
///
/// - RecordId: 64-bit record address with embedded class ID and position
/// - Vertex / NewVertex: stored and to-be-stored vertex records
/// - Edge / NewEdge: stored and to-be-stored edge records
/// - ClassKind: which side of the graph a remote class belongs to

pub mod edge;
pub mod record_id;
pub mod vertex;

pub use edge::{Edge, NewEdge};
pub use record_id::{RecordId, RecordIdError};
pub use vertex::{NewVertex, Vertex};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of the graph a remote class partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassKind {
    Vertex,
    Edge,
}

impl ClassKind {
    /// Key-space tag used by storage backends
    pub fn tag(&self) -> char {
        match self {
            ClassKind::Vertex => 'v',
            ClassKind::Edge => 'e',
        }
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassKind::Vertex => write!(f, "vertex"),
            ClassKind::Edge => write!(f, "edge"),
        }
    }
}

/// Remote class descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    /// Class ID embedded in every RecordId of the class
    pub id: u16,

    /// Class name (the type label)
    pub name: String,

    pub kind: ClassKind,

    /// Table column the class name was drawn from, if any
    pub label_column: Option<String>,
}
