/// Schema materialization
///
/// Derives the remote classes an export needs from the input tables and
/// creates them. Labels are the distinct values of the designated type
/// column, or the single default label when none is designated.

use super::connection::Connection;
use super::export::ExportOptions;
use super::graph::Graph;
use crate::error::{BridgeError, BridgeResult};
use crate::table::{Table, Value};
use crate::types::ClassKind;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Label assignment for one side of the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidePlan {
    pub kind: ClassKind,
    /// Column the labels are read from, `None` for the default label
    pub type_column: Option<String>,
    /// Label used for rows without a type (no column, or a null cell)
    pub default_label: String,
    /// Distinct labels, sorted; empty for an empty untyped table
    pub labels: Vec<String>,
    /// Some row has a null type cell and goes to the default label
    pub untyped_rows: bool,
}

impl SidePlan {
    fn build(
        kind: ClassKind,
        table: &Table,
        type_column: Option<&str>,
        default_label: &str,
    ) -> BridgeResult<Self> {
        let (labels, untyped_rows) = match type_column {
            None if table.is_empty() => (Vec::new(), false),
            None => (vec![default_label.to_string()], true),
            Some(column) => {
                if !table.schema().contains(column) {
                    return Err(BridgeError::ColumnNotFound {
                        side: kind,
                        column: column.to_string(),
                    });
                }
                let values = table.distinct(column)?;
                let untyped = values.iter().any(Value::is_null);
                let labels: BTreeSet<String> = values
                    .iter()
                    .map(|value| label_text(value, default_label))
                    .collect();
                (labels.into_iter().collect(), untyped)
            }
        };

        Ok(Self {
            kind,
            type_column: type_column.map(str::to_string),
            default_label: default_label.to_string(),
            labels,
            untyped_rows,
        })
    }

    /// Label of a cell taken from the type column
    pub fn label_of(&self, value: &Value) -> String {
        label_text(value, &self.default_label)
    }

    /// Column the class name of `label` folds back into on import
    ///
    /// The default class holds rows whose type cell was null, so it carries
    /// no label column and those rows come back with a null type.
    pub fn label_column(&self, label: &str) -> Option<&str> {
        if self.untyped_rows && label == self.default_label {
            return None;
        }
        self.type_column.as_deref()
    }
}

fn label_text(value: &Value, default_label: &str) -> String {
    if value.is_null() {
        default_label.to_string()
    } else {
        value.to_string()
    }
}

/// Remote classes for both sides of one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPlan {
    pub vertices: SidePlan,
    pub edges: SidePlan,
}

/// Compute the schema plan without touching the server
///
/// # Returns
/// * `Err(BridgeError::ColumnNotFound)` if a designated type column is not a
///   column of its table
pub fn plan(
    graph: &Graph,
    vertex_type_column: Option<&str>,
    edge_type_column: Option<&str>,
    options: &ExportOptions,
) -> BridgeResult<SchemaPlan> {
    Ok(SchemaPlan {
        vertices: SidePlan::build(
            ClassKind::Vertex,
            &graph.vertices,
            vertex_type_column,
            &options.default_vertex_label,
        )?,
        edges: SidePlan::build(
            ClassKind::Edge,
            &graph.edges,
            edge_type_column,
            &options.default_edge_label,
        )?,
    })
}

/// Plan the schema and create every class it names
///
/// Existing classes are left as they are, so materializing twice is a no-op.
pub async fn materialize(
    conn: &Connection,
    graph: &Graph,
    vertex_type_column: Option<&str>,
    edge_type_column: Option<&str>,
    options: &ExportOptions,
) -> BridgeResult<SchemaPlan> {
    let plan = plan(graph, vertex_type_column, edge_type_column, options)?;
    apply(conn, &plan).await?;
    Ok(plan)
}

/// Create the classes of an already computed plan
pub async fn apply(conn: &Connection, plan: &SchemaPlan) -> BridgeResult<()> {
    let mut created = 0;
    for side in [&plan.vertices, &plan.edges] {
        for label in &side.labels {
            let fresh = conn
                .session()
                .create_class(side.kind, label, side.label_column(label))
                .await
                .map_err(|e| BridgeError::from_server(conn.url(), e))?;
            if fresh {
                created += 1;
                debug!("Created {} class {}", side.kind, label);
            }
        }
    }
    info!(
        "Schema ready on {}: {} vertex and {} edge classes ({} new)",
        conn.url(),
        plan.vertices.labels.len(),
        plan.edges.labels.len(),
        created
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::connection::{resolve, Credentials, OpenMode};
    use crate::error::ErrorKind;
    use crate::server::MemoryServer;
    use crate::table::Schema;

    fn graph() -> Graph {
        let vertices = Table::from_rows(
            Schema::parse("id:str,gender:str").unwrap(),
            vec![
                vec!["1".into(), "M".into()],
                vec!["2".into(), "F".into()],
                vec!["3".into(), Value::Null],
            ],
        )
        .unwrap();
        let edges = Table::from_rows(
            Schema::parse("src:str,dst:str,edge_type:str").unwrap(),
            vec![
                vec!["1".into(), "2".into(), "friend".into()],
                vec!["2".into(), "3".into(), "follower".into()],
            ],
        )
        .unwrap();
        Graph::new(vertices, edges)
    }

    #[test]
    fn test_plan_default_labels() {
        let plan = plan(&graph(), None, None, &ExportOptions::default()).unwrap();
        assert_eq!(plan.vertices.labels, vec!["V"]);
        assert_eq!(plan.edges.labels, vec!["E"]);
        assert_eq!(plan.vertices.type_column, None);
        assert_eq!(plan.vertices.label_column("V"), None);
    }

    #[test]
    fn test_plan_empty_untyped_side_has_no_labels() {
        let mut graph = graph();
        graph.edges = Table::new(graph.edges.schema().clone());
        let plan = plan(&graph, None, None, &ExportOptions::default()).unwrap();
        assert_eq!(plan.vertices.labels, vec!["V"]);
        assert!(plan.edges.labels.is_empty());
    }

    #[test]
    fn test_plan_typed_labels_sorted() {
        let plan = plan(&graph(), Some("gender"), Some("edge_type"), &ExportOptions::default()).unwrap();
        // the null gender falls back to the default label
        assert_eq!(plan.vertices.labels, vec!["F", "M", "V"]);
        assert_eq!(plan.edges.labels, vec!["follower", "friend"]);
        assert!(plan.vertices.untyped_rows);
        assert!(!plan.edges.untyped_rows);
        assert_eq!(plan.vertices.label_column("F"), Some("gender"));
        assert_eq!(plan.vertices.label_column("V"), None);
    }

    #[test]
    fn test_plan_missing_column() {
        let err = plan(&graph(), Some("ERR"), None, &ExportOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("Cannot connect to the remote server/database"));

        let err = plan(&graph(), None, Some("ERR"), &ExportOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::ColumnNotFound {
                side: ClassKind::Edge,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_materialize_twice_is_noop() {
        let server = MemoryServer::new("localhost", 2424, "root");
        let conn = resolve(
            &server,
            "memory:schema_twice",
            &Credentials::new("admin", "admin", "root"),
            OpenMode::CreateIfMissing,
        )
        .await
        .unwrap();
        let graph = graph();
        let options = ExportOptions::default();

        let first = materialize(&conn, &graph, Some("gender"), Some("edge_type"), &options)
            .await
            .unwrap();
        let second = materialize(&conn, &graph, Some("gender"), Some("edge_type"), &options)
            .await
            .unwrap();
        assert_eq!(first, second);

        let classes = conn.session().classes(ClassKind::Vertex).await.unwrap();
        let names: Vec<&str> = classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["F", "M", "V"]);
        let label_columns: Vec<Option<&str>> =
            classes.iter().map(|c| c.label_column.as_deref()).collect();
        assert_eq!(label_columns, vec![Some("gender"), Some("gender"), None]);
        assert_eq!(conn.session().classes(ClassKind::Edge).await.unwrap().len(), 2);
    }
}
