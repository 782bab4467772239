/// Graph server abstraction
///
/// The bridge never talks to storage directly; it goes through two traits:
/// - GraphServer: endpoint matching, root (administrative) authentication,
///   database creation and user login
/// - GraphDatabase: an authenticated session on one database, exposing class
///   creation, batched record insertion and full-class scans
///
/// Implementations:
/// - MemoryServer: in-process server with fault injection, used by tests
/// - RocksDbServer: persistent server, one RocksDB instance per database

pub mod error;
pub mod memory;
pub mod rocksdb_server;

pub use error::{ServerError, ServerResult};
pub use memory::MemoryServer;
pub use rocksdb_server::RocksDbServer;

use crate::bridge::DbUrl;
use crate::types::{ClassInfo, ClassKind, Edge, NewEdge, NewVertex, Vertex};
use async_trait::async_trait;
use std::sync::Arc;

/// Users every new database is seeded with: `(name, password)`
pub const DEFAULT_USERS: &[(&str, &str)] = &[
    ("admin", "admin"),
    ("reader", "reader"),
    ("writer", "writer"),
];

/// Graph server
///
/// Administrative operations take the root password; data operations go
/// through a `GraphDatabase` session obtained with a regular user login.
#[async_trait]
pub trait GraphServer: Send + Sync {
    /// Whether this server is the endpoint `url` points at
    fn serves(&self, url: &DbUrl) -> bool;

    /// Check the root password
    ///
    /// # Returns
    /// * `Ok(())` if accepted
    /// * `Err(ServerError::InvalidRootCredentials)` otherwise
    async fn authenticate_root(&self, password: &str) -> ServerResult<()>;

    /// Check whether a database exists (requires root)
    async fn database_exists(&self, root_password: &str, name: &str) -> ServerResult<bool>;

    /// Create a database if absent (requires root)
    ///
    /// # Returns
    /// * `Ok(true)` if the database was created
    /// * `Ok(false)` if it already existed; its content is untouched
    async fn create_database(&self, root_password: &str, name: &str) -> ServerResult<bool>;

    /// Open a session on a database as a regular user
    ///
    /// # Returns
    /// * `Ok(session)` on success
    /// * `Err(ServerError::DatabaseNotFound)` if the database does not exist
    /// * `Err(ServerError::InvalidUserCredentials)` if the login is rejected
    async fn open_database(
        &self,
        name: &str,
        user: &str,
        password: &str,
    ) -> ServerResult<Arc<dyn GraphDatabase>>;
}

/// Authenticated session on one database
///
/// Sessions are shared between concurrent writers; every batch is applied
/// atomically with respect to other batches on the same database.
#[async_trait]
pub trait GraphDatabase: Send + Sync {
    /// Database name
    fn name(&self) -> &str;

    /// Create a class if absent
    ///
    /// # Returns
    /// * `Ok(true)` if the class was created
    /// * `Ok(false)` if a class of that kind and name already existed
    async fn create_class(
        &self,
        kind: ClassKind,
        name: &str,
        label_column: Option<&str>,
    ) -> ServerResult<bool>;

    /// All classes of one kind, sorted by name
    async fn classes(&self, kind: ClassKind) -> ServerResult<Vec<ClassInfo>>;

    /// Insert a batch of vertices into a class
    ///
    /// Vertex keys are unique across the whole database. The batch is
    /// rejected as a whole (`DuplicateKey`) if any key is already taken.
    async fn insert_vertices(&self, class: &str, batch: Vec<NewVertex>) -> ServerResult<usize>;

    /// Insert a batch of edges into a class
    ///
    /// Endpoints are resolved by vertex key. The batch is rejected as a whole
    /// (`VertexNotFound`) if any endpoint does not resolve.
    async fn insert_edges(&self, class: &str, batch: Vec<NewEdge>) -> ServerResult<usize>;

    /// Read every vertex of a class, in insertion order
    async fn scan_vertices(&self, class: &str) -> ServerResult<Vec<Vertex>>;

    /// Read every edge of a class, in insertion order
    async fn scan_edges(&self, class: &str) -> ServerResult<Vec<Edge>>;

    /// Number of records in a class
    async fn count(&self, kind: ClassKind, class: &str) -> ServerResult<u64>;
}

/// Shared server handle
pub type SharedServer = Arc<dyn GraphServer>;

/// Database names become directory names, so keep them to a safe alphabet
pub(crate) fn validate_database_name(name: &str) -> ServerResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ServerError::InvalidName(name.to_string()))
    }
}
