/// Batch export
///
/// Rows are grouped by label, then each label partition is written by its
/// own tokio task in batches of `batch_size`. At most `max_concurrency`
/// partitions write at once. The vertex phase is joined before the edge
/// phase starts, since edges resolve their endpoints against stored vertex
/// keys. The first failing partition aborts the rest of the phase.

use super::connection::Connection;
use super::graph::Graph;
use super::schema::{SchemaPlan, SidePlan};
use super::summary::{ExportResult, LabelCounts};
use crate::error::{BridgeError, BridgeResult};
use crate::server::{GraphDatabase, ServerResult};
use crate::table::{Table, Value};
use crate::types::{ClassKind, NewEdge, NewVertex};
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_VERTEX_LABEL: &str = "V";
pub const DEFAULT_EDGE_LABEL: &str = "E";

/// Export tuning and column naming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Records per remote write
    pub batch_size: usize,
    /// Label partitions written concurrently
    pub max_concurrency: usize,
    /// Vertex column holding the unique key
    pub key_column: String,
    pub src_column: String,
    pub dst_column: String,
    pub default_vertex_label: String,
    pub default_edge_label: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrency: num_cpus::get(),
            key_column: "id".to_string(),
            src_column: "src".to_string(),
            dst_column: "dst".to_string(),
            default_vertex_label: DEFAULT_VERTEX_LABEL.to_string(),
            default_edge_label: DEFAULT_EDGE_LABEL.to_string(),
        }
    }
}

/// Records grouped by label
type Partitions<R> = BTreeMap<String, Vec<R>>;

/// Write the graph into classes created from `plan`
///
/// Every row is checked before the first write: vertex keys must be present
/// and unique, and every edge endpoint must be one of the exported vertex
/// keys, so malformed input never leaves partial data behind.
pub async fn export(
    conn: &Connection,
    plan: &SchemaPlan,
    graph: &Graph,
    options: &ExportOptions,
) -> BridgeResult<ExportResult> {
    let (vertex_parts, keys) = vertex_partitions(&graph.vertices, &plan.vertices, options)?;
    let edge_parts = edge_partitions(&graph.edges, &plan.edges, &keys, options)?;

    info!(
        "Exporting {} vertices and {} edges to {}",
        graph.vertices.count(),
        graph.edges.count(),
        conn.url()
    );
    let vertex_types = write_partitions(conn, vertex_parts, options).await?;
    info!("Vertex phase complete on {}", conn.url());
    let edge_types = write_partitions(conn, edge_parts, options).await?;
    info!("Edge phase complete on {}", conn.url());

    Ok(ExportResult::new(conn.db_uri(), vertex_types, edge_types))
}

/// Every column except `skip` as a JSON property map
fn properties(table: &Table, row: &[Value], skip: &[Option<usize>]) -> Map<String, JsonValue> {
    table
        .schema()
        .columns()
        .iter()
        .enumerate()
        .filter(|(idx, _)| !skip.contains(&Some(*idx)))
        .map(|(idx, column)| (column.name.clone(), row[idx].to_json()))
        .collect()
}

/// Empty partition for every planned label, so labels without rows still
/// report a zero count
fn empty_partitions<R>(side: &SidePlan) -> Partitions<R> {
    side.labels.iter().map(|l| (l.clone(), Vec::new())).collect()
}

fn vertex_partitions(
    table: &Table,
    side: &SidePlan,
    options: &ExportOptions,
) -> BridgeResult<(Partitions<NewVertex>, HashSet<String>)> {
    let key_idx = table.schema().require(&options.key_column)?;
    let type_idx = side
        .type_column
        .as_deref()
        .map(|c| table.schema().require(c))
        .transpose()?;

    let mut parts = empty_partitions(side);
    let mut keys = HashSet::with_capacity(table.count());
    for (row_no, row) in table.rows().iter().enumerate() {
        let key = &row[key_idx];
        if key.is_null() {
            return Err(BridgeError::MissingKey {
                side: ClassKind::Vertex,
                row: row_no,
                column: options.key_column.clone(),
            });
        }
        let label = match type_idx {
            Some(idx) => side.label_of(&row[idx]),
            None => side.default_label.clone(),
        };
        let key = key.to_string();
        if !keys.insert(key.clone()) {
            return Err(BridgeError::DuplicateKey { row: row_no, key });
        }
        parts
            .entry(label)
            .or_default()
            .push(NewVertex::new(key, properties(table, row, &[Some(key_idx), type_idx])));
    }
    Ok((parts, keys))
}

fn edge_partitions(
    table: &Table,
    side: &SidePlan,
    keys: &HashSet<String>,
    options: &ExportOptions,
) -> BridgeResult<Partitions<NewEdge>> {
    let src_idx = table.schema().require(&options.src_column)?;
    let dst_idx = table.schema().require(&options.dst_column)?;
    let type_idx = side
        .type_column
        .as_deref()
        .map(|c| table.schema().require(c))
        .transpose()?;

    let mut parts = empty_partitions(side);
    for (row_no, row) in table.rows().iter().enumerate() {
        let endpoint = |name: &'static str, idx: usize, column: &str| {
            let value = &row[idx];
            if value.is_null() {
                return Err(BridgeError::MissingKey {
                    side: ClassKind::Edge,
                    row: row_no,
                    column: column.to_string(),
                });
            }
            let key = value.to_string();
            if !keys.contains(&key) {
                return Err(BridgeError::DanglingReference {
                    row: row_no,
                    endpoint: name,
                    key,
                });
            }
            Ok(key)
        };
        let out_key = endpoint("src", src_idx, &options.src_column)?;
        let in_key = endpoint("dst", dst_idx, &options.dst_column)?;
        let label = match type_idx {
            Some(idx) => side.label_of(&row[idx]),
            None => side.default_label.clone(),
        };
        parts.entry(label).or_default().push(NewEdge::new(
            out_key,
            in_key,
            properties(table, row, &[Some(src_idx), Some(dst_idx), type_idx]),
        ));
    }
    Ok(parts)
}

/// A record type that can be written to a class in one batch
#[async_trait]
trait PartitionRecord: Send + Sized + 'static {
    const KIND: ClassKind;

    async fn write(db: &dyn GraphDatabase, class: &str, batch: Vec<Self>) -> ServerResult<usize>;
}

#[async_trait]
impl PartitionRecord for NewVertex {
    const KIND: ClassKind = ClassKind::Vertex;

    async fn write(db: &dyn GraphDatabase, class: &str, batch: Vec<Self>) -> ServerResult<usize> {
        db.insert_vertices(class, batch).await
    }
}

#[async_trait]
impl PartitionRecord for NewEdge {
    const KIND: ClassKind = ClassKind::Edge;

    async fn write(db: &dyn GraphDatabase, class: &str, batch: Vec<Self>) -> ServerResult<usize> {
        db.insert_edges(class, batch).await
    }
}

/// Write one label partition in order, batch by batch
async fn write_partition<R: PartitionRecord>(
    db: Arc<dyn GraphDatabase>,
    label: String,
    records: Vec<R>,
    batch_size: usize,
) -> ServerResult<(String, u64)> {
    let mut written = 0u64;
    let mut records = records.into_iter();
    loop {
        let batch: Vec<R> = records.by_ref().take(batch_size).collect();
        if batch.is_empty() {
            break;
        }
        let n = R::write(db.as_ref(), &label, batch).await?;
        written += n as u64;
        debug!("{} {}: wrote batch of {}", R::KIND, label, n);
    }
    Ok((label, written))
}

/// Run one task per partition and collect the per-label counts
async fn write_partitions<R: PartitionRecord>(
    conn: &Connection,
    partitions: Partitions<R>,
    options: &ExportOptions,
) -> BridgeResult<LabelCounts> {
    let semaphore = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
    let batch_size = options.batch_size.max(1);
    let mut tasks = JoinSet::new();

    for (label, records) in partitions {
        let semaphore = semaphore.clone();
        let db = conn.session().clone();
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            write_partition(db, label, records, batch_size).await
        });
    }

    let mut counts = LabelCounts::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok((label, written))) => {
                info!("{} {}: {} records exported", R::KIND, label, written);
                counts.insert(label, written);
            }
            Ok(Err(e)) => {
                warn!("{} partition failed, aborting export: {}", R::KIND, e);
                tasks.abort_all();
                return Err(BridgeError::from_server(conn.url(), e));
            }
            Err(e) => {
                tasks.abort_all();
                return Err(BridgeError::Task(e.to_string()));
            }
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::connection::{resolve, Credentials, OpenMode};
    use crate::bridge::schema;
    use crate::error::ErrorKind;
    use crate::server::MemoryServer;
    use crate::table::Schema;

    async fn connect(server: &MemoryServer, db: &str) -> Connection {
        resolve(
            server,
            &format!("memory:{}", db),
            &Credentials::new("admin", "admin", "root"),
            OpenMode::CreateIfMissing,
        )
        .await
        .unwrap()
    }

    fn chain(n: usize) -> Graph {
        let vertices = Table::from_rows(
            Schema::parse("id:int,kind:str,age:int").unwrap(),
            (0..n)
                .map(|i| {
                    let kind = if i % 3 == 0 { "a" } else { "b" };
                    vec![Value::Int(i as i64), kind.into(), Value::Int(20 + i as i64)]
                })
                .collect(),
        )
        .unwrap();
        let edges = Table::from_rows(
            Schema::parse("src:int,dst:int,weight:float").unwrap(),
            (1..n)
                .map(|i| vec![Value::Int(i as i64 - 1), Value::Int(i as i64), Value::Float(0.5)])
                .collect(),
        )
        .unwrap();
        Graph::new(vertices, edges)
    }

    #[tokio::test]
    async fn test_export_counts_small_batches() {
        let server = MemoryServer::new("localhost", 2424, "root");
        let conn = connect(&server, "small_batches").await;
        let graph = chain(30);
        let options = ExportOptions {
            batch_size: 4,
            max_concurrency: 2,
            ..ExportOptions::default()
        };

        let plan = schema::materialize(&conn, &graph, Some("kind"), None, &options)
            .await
            .unwrap();
        let result = export(&conn, &plan, &graph, &options).await.unwrap();

        assert_eq!(result.vertex_types()["a"], 10);
        assert_eq!(result.vertex_types()["b"], 20);
        assert_eq!(result.edge_types()["E"], 29);
        assert_eq!(result.total_vertices(), 30);
        assert_eq!(result.total_edges(), 29);
        assert_eq!(
            conn.session().count(ClassKind::Vertex, "a").await.unwrap(),
            10
        );
    }

    #[tokio::test]
    async fn test_export_properties_skip_key_and_type() {
        let server = MemoryServer::new("localhost", 2424, "root");
        let conn = connect(&server, "props").await;
        let graph = chain(3);
        let options = ExportOptions::default();

        let plan = schema::materialize(&conn, &graph, Some("kind"), None, &options)
            .await
            .unwrap();
        export(&conn, &plan, &graph, &options).await.unwrap();

        let stored = conn.session().scan_vertices("a").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].key, "0");
        assert_eq!(stored[0].get_property("age"), Some(&JsonValue::from(20)));
        assert!(stored[0].get_property("kind").is_none());
        assert!(stored[0].get_property("id").is_none());

        let edges = conn.session().scan_edges("E").await.unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].out_key, "0");
        assert_eq!(edges[0].in_key, "1");
        assert_eq!(edges[0].properties.len(), 1);
    }

    #[tokio::test]
    async fn test_dangling_reference_writes_nothing() {
        let server = MemoryServer::new("localhost", 2424, "root");
        let conn = connect(&server, "dangling").await;
        let mut graph = chain(3);
        graph
            .edges
            .push_row(vec![Value::Int(2), Value::Int(99), Value::Null])
            .unwrap();
        let options = ExportOptions::default();

        let plan = schema::materialize(&conn, &graph, None, None, &options)
            .await
            .unwrap();
        let err = export(&conn, &plan, &graph, &options).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DanglingReference);
        assert!(err.to_string().contains("'99'"));
        assert_eq!(conn.session().count(ClassKind::Vertex, "V").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_key_writes_nothing() {
        let server = MemoryServer::new("localhost", 2424, "root");
        let conn = connect(&server, "duplicate").await;
        let vertices = Table::from_rows(
            Schema::parse("id:int,gender:str").unwrap(),
            vec![
                vec![Value::Int(1), "F".into()],
                vec![Value::Int(2), "F".into()],
                vec![Value::Int(1), "M".into()],
            ],
        )
        .unwrap();
        let edges = Table::new(Schema::parse("src:int,dst:int").unwrap());
        let graph = Graph::new(vertices, edges);
        let options = ExportOptions {
            max_concurrency: 1,
            ..ExportOptions::default()
        };

        let plan = schema::materialize(&conn, &graph, Some("gender"), None, &options)
            .await
            .unwrap();
        let err = export(&conn, &plan, &graph, &options).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(matches!(err, BridgeError::DuplicateKey { row: 2, ref key } if key == "1"));
        assert_eq!(conn.session().count(ClassKind::Vertex, "F").await.unwrap(), 0);
        assert_eq!(conn.session().count(ClassKind::Vertex, "M").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_null_key_rejected() {
        let server = MemoryServer::new("localhost", 2424, "root");
        let conn = connect(&server, "null_key").await;
        let mut graph = chain(2);
        graph
            .vertices
            .push_row(vec![Value::Null, "a".into(), Value::Int(1)])
            .unwrap();
        let options = ExportOptions::default();

        let plan = schema::materialize(&conn, &graph, None, None, &options)
            .await
            .unwrap();
        let err = export(&conn, &plan, &graph, &options).await.unwrap_err();
        assert!(matches!(err, BridgeError::MissingKey { row: 2, .. }));
    }

    #[tokio::test]
    async fn test_empty_tables() {
        let server = MemoryServer::new("localhost", 2424, "root");
        let conn = connect(&server, "empty").await;
        let graph = chain(0);
        let options = ExportOptions::default();

        let plan = schema::materialize(&conn, &graph, Some("kind"), None, &options)
            .await
            .unwrap();
        let result = export(&conn, &plan, &graph, &options).await.unwrap();
        assert!(result.vertex_types().is_empty());
        assert!(result.edge_types().is_empty());
        assert_eq!(result.total_vertices(), 0);
    }

    #[tokio::test]
    async fn test_connection_drop_aborts() {
        let server = MemoryServer::new("localhost", 2424, "root");
        let conn = connect(&server, "drop").await;
        let graph = chain(40);
        let options = ExportOptions {
            batch_size: 5,
            ..ExportOptions::default()
        };

        let plan = schema::materialize(&conn, &graph, Some("kind"), None, &options)
            .await
            .unwrap();
        server.disconnect_after_writes(3);
        let err = export(&conn, &plan, &graph, &options).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("memory:drop"));
    }
}
