/// Error types for bridge operations
///
/// Every failure of an export or import call surfaces as one `BridgeError`;
/// `kind()` gives a stable classification to match on.

use crate::bridge::DbUrl;
use crate::server::ServerError;
use crate::table::TableError;
use crate::types::ClassKind;
use thiserror::Error;

/// Bridge errors
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Endpoint malformed, unreachable, or lost mid-call
    #[error("Error on opening database '{url}': {reason}")]
    Connection { url: String, reason: String },

    /// Root credential rejected
    #[error("Wrong user/password")]
    RootAuth,

    /// User credential rejected
    #[error("Unable to open database '{database}'")]
    UserAuth { database: String },

    /// Designated type column missing from the input table
    ///
    /// The message keeps the generic connection-level prefix older callers
    /// match on.
    #[error("Cannot connect to the remote server/database: {side} type column '{column}' not found")]
    ColumnNotFound { side: ClassKind, column: String },

    /// Key column holds no value
    #[error("{side} row {row}: column '{column}' is empty")]
    MissingKey {
        side: ClassKind,
        row: usize,
        column: String,
    },

    /// Vertex key repeated within the input table
    #[error("Vertex row {row}: key '{key}' already used by an earlier row")]
    DuplicateKey { row: usize, key: String },

    /// Edge endpoint not among the exported vertices
    #[error("Edge row {row}: {endpoint} vertex '{key}' is not an exported vertex")]
    DanglingReference {
        row: usize,
        endpoint: &'static str,
        key: String,
    },

    /// Any other server-side failure
    #[error("Remote error on database '{database}': {source}")]
    Remote {
        database: String,
        #[source]
        source: ServerError,
    },

    /// Input table error
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// A partition task panicked or was cancelled
    #[error("Partition task failed: {0}")]
    Task(String),
}

/// Stable classification of a `BridgeError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    RootAuth,
    UserAuth,
    Schema,
    DanglingReference,
    Remote,
    Table,
    Task,
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Connection { .. } => ErrorKind::Connection,
            BridgeError::RootAuth => ErrorKind::RootAuth,
            BridgeError::UserAuth { .. } => ErrorKind::UserAuth,
            BridgeError::ColumnNotFound { .. }
            | BridgeError::MissingKey { .. }
            | BridgeError::DuplicateKey { .. } => ErrorKind::Schema,
            BridgeError::DanglingReference { .. } => ErrorKind::DanglingReference,
            BridgeError::Remote { .. } => ErrorKind::Remote,
            BridgeError::Table(_) => ErrorKind::Table,
            BridgeError::Task(_) => ErrorKind::Task,
        }
    }

    /// Create a Connection error
    pub fn connection(url: impl Into<String>, reason: impl Into<String>) -> Self {
        BridgeError::Connection {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Classify a server error raised while working against `url`
    pub fn from_server(url: &DbUrl, err: ServerError) -> Self {
        match err {
            ServerError::ConnectionClosed => Self::connection(url.as_str(), "connection closed by server"),
            ServerError::DatabaseNotFound(name) => {
                Self::connection(url.as_str(), format!("database '{}' does not exist", name))
            }
            ServerError::InvalidName(name) => {
                Self::connection(url.as_str(), format!("invalid database name '{}'", name))
            }
            ServerError::InvalidRootCredentials => BridgeError::RootAuth,
            ServerError::InvalidUserCredentials { database } => BridgeError::UserAuth { database },
            other => BridgeError::Remote {
                database: url.database().to_string(),
                source: other,
            },
        }
    }
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
