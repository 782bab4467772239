/// Rust Graph Bridge
///
/// Replicates a property graph held as two tables (vertices and edges) into a
/// graph database server, one remote class per type label, and reads it back.
///
/// # Architecture
///
/// ```text
/// ┌──────────────────────────────────────────────────┐
/// │           Rust Graph Bridge                      │
/// ├──────────────────────────────────────────────────┤
/// │  ┌────────────────────────────────┐              │
/// │  │   Connection Resolver          │              │
/// │  └────────────┬───────────────────┘              │
/// │               ↓                                   │
/// │  ┌────────────────────────────────┐              │
/// │  │   Schema Materializer          │              │
/// │  └────────────┬───────────────────┘              │
/// │               ↓                                   │
/// │  ┌────────────────────────────────┐              │
/// │  │   Batch Exporter / Importer    │              │
/// │  └────────────┬───────────────────┘              │
/// │               ↓                                   │
/// │  ┌────────────────────────────────┐              │
/// │  │   Graph Server (Memory/RocksDB)│              │
/// │  └────────────────────────────────┘              │
/// └──────────────────────────────────────────────────┘
/// ```
///
/// # Modules
///
/// - `types`: Remote record types (RecordId, Vertex, Edge, ClassInfo)
/// - `table`: Typed in-memory tables with CSV import/export
/// - `server`: Graph server abstraction with in-memory and RocksDB backends
/// - `bridge`: Export, import and validation of graphs
/// - `config`: Environment-driven configuration
/// - `error`: Bridge error taxonomy

pub mod types;
pub mod table;
pub mod server;
pub mod bridge;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use types::{ClassInfo, ClassKind, Edge, NewEdge, NewVertex, RecordId, Vertex};

// Re-export table types
pub use table::{Column, ColumnType, CsvOptions, Schema, Table, TableError, TableResult, Value};

// Re-export server types
pub use server::{GraphDatabase, GraphServer, MemoryServer, RocksDbServer, ServerError, ServerResult, SharedServer};

// Re-export bridge types
pub use bridge::{
    export_graph, import_graph, validate, Credentials, DbUrl, EdgeOrientation, ExportOptions,
    ExportResult, Graph, ImportOptions, ImportSummary, ImportedGraph, ValidateOptions,
    ValidationReport,
};

pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult, ErrorKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
