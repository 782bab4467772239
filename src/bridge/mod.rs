/// Graph replication bridge
///
/// Export path: resolve the connection, materialize one class per label,
/// write every label partition, return an `ExportResult`.
///
/// Import path: resolve the connection, scan every class back into tables,
/// return an `ImportedGraph`.
///
/// `validate` compares an original graph with a reconstructed one.

pub mod connection;
pub mod export;
pub mod graph;
pub mod import;
pub mod schema;
pub mod summary;
pub mod url;
pub mod validate;

pub use connection::{Connection, Credentials, OpenMode};
pub use export::ExportOptions;
pub use graph::Graph;
pub use import::{EdgeOrientation, ImportOptions, ImportedGraph};
pub use schema::SchemaPlan;
pub use summary::{ExportResult, ImportSummary, LabelCounts};
pub use url::{DbUrl, Endpoint};
pub use validate::{validate, DegreeMismatch, EdgeTriple, ValidateOptions, ValidationReport};

use crate::error::BridgeResult;
use crate::server::GraphServer;
use tracing::info;

/// Export a graph to the database at `db_url`
///
/// Type columns are checked against the tables before the server is
/// contacted. The database is created when absent.
///
/// # Returns
/// * `Ok(result)` with per-label counts when every record was written
/// * `Err(..)` on any failure; records already written are not rolled back
pub async fn export_graph(
    server: &dyn GraphServer,
    db_url: &str,
    credentials: &Credentials,
    graph: &Graph,
    vertex_type_column: Option<&str>,
    edge_type_column: Option<&str>,
    options: &ExportOptions,
) -> BridgeResult<ExportResult> {
    let plan = schema::plan(graph, vertex_type_column, edge_type_column, options)?;
    let conn = connection::resolve(server, db_url, credentials, OpenMode::CreateIfMissing).await?;
    schema::apply(&conn, &plan).await?;

    let result = export::export(&conn, &plan, graph, options).await?;
    info!(
        "Export to {} finished: {} vertices, {} edges",
        result.db_uri(),
        result.total_vertices(),
        result.total_edges()
    );
    Ok(result)
}

/// Import every class of the database at `db_url`
pub async fn import_graph(
    server: &dyn GraphServer,
    db_url: &str,
    credentials: &Credentials,
    options: &ImportOptions,
) -> BridgeResult<ImportedGraph> {
    let conn = connection::resolve(server, db_url, credentials, OpenMode::MustExist).await?;
    import::import(&conn, options).await
}
