use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error types for RecordId operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordIdError {
    #[error("Record position {0} is out of range (max: 2^48 - 1)")]
    PositionOutOfRange(u64),

    #[error("Invalid record id: {0}")]
    Malformed(String),
}

/// RecordId: 64-bit address of a record stored on a graph server
///
/// Format: [16-bit class ID][48-bit position]
/// - High 16 bits: class ID (one per remote class)
/// - Low 48 bits: position of the record inside its class
///
/// Rendered as `#<class>:<position>`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RecordId(u64);

impl RecordId {
    /// Maximum value for a position (2^48 - 1)
    pub const MAX_POSITION: u64 = 0x0000FFFFFFFFFFFF;

    /// Create a RecordId from a class ID and a position
    pub fn new(class_id: u16, position: u64) -> Result<Self, RecordIdError> {
        if position > Self::MAX_POSITION {
            return Err(RecordIdError::PositionOutOfRange(position));
        }
        Ok(Self(((class_id as u64) << 48) | position))
    }

    /// Create a RecordId from its raw 64-bit value
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw 64-bit value
    pub fn as_raw(&self) -> u64 {
        self.0
    }

    /// Class ID (high 16 bits)
    pub fn class_id(&self) -> u16 {
        (self.0 >> 48) as u16
    }

    /// Position inside the class (low 48 bits)
    pub fn position(&self) -> u64 {
        self.0 & Self::MAX_POSITION
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.class_id(), self.position())
    }
}

impl FromStr for RecordId {
    type Err = RecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RecordIdError::Malformed(s.to_string());
        let body = s.strip_prefix('#').ok_or_else(malformed)?;
        let (class, position) = body.split_once(':').ok_or_else(malformed)?;
        let class_id = class.parse::<u16>().map_err(|_| malformed())?;
        let position = position.parse::<u64>().map_err(|_| malformed())?;
        Self::new(class_id, position)
    }
}

impl From<RecordId> for u64 {
    fn from(id: RecordId) -> u64 {
        id.0
    }
}
