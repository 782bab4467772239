/// Error types for graph server operations

use crate::types::{ClassKind, RecordIdError};
use thiserror::Error;

/// Graph server errors
#[derive(Error, Debug)]
pub enum ServerError {
    /// Root password rejected
    #[error("Wrong user/password")]
    InvalidRootCredentials,

    /// User login rejected
    #[error("Unable to open database '{database}': invalid user or password")]
    InvalidUserCredentials { database: String },

    /// Database does not exist
    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    /// Database name outside the accepted alphabet
    #[error("Invalid database name: '{0}'")]
    InvalidName(String),

    /// Connection dropped or server shut down
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Class not found
    #[error("{kind} class not found: {name}")]
    ClassNotFound { kind: ClassKind, name: String },

    /// A vertex with this key already exists
    #[error("Duplicate vertex key: {0}")]
    DuplicateKey(String),

    /// Edge endpoint does not resolve to a stored vertex
    #[error("Vertex not found for key: {0}")]
    VertexNotFound(String),

    /// Class ID space exhausted
    #[error("Too many classes in database {0}")]
    TooManyClasses(String),

    /// Record address error
    #[error("Record id error: {0}")]
    RecordId(#[from] RecordIdError),

    /// Stored data could not be decoded
    #[error("Corrupted record: {0}")]
    Corrupted(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;
