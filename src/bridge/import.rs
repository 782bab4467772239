/// Batch import
///
/// Reads every class of a database back into a vertex table and an edge
/// table:
/// - the vertex key becomes the key column, the edge endpoints become the
///   source and destination columns (see `EdgeOrientation`)
/// - stored attributes become columns, typed from the values found
/// - a class created from a type column gets its name folded back into that
///   column

use super::connection::Connection;
use super::graph::Graph;
use super::summary::{ImportSummary, LabelCounts};
use crate::error::{BridgeError, BridgeResult};
use crate::table::{Column, ColumnType, Schema, Table, Value};
use crate::types::{ClassInfo, ClassKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Which stored endpoint lands in the source column on import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeOrientation {
    /// `src` holds the out-vertex, as exported
    #[default]
    Preserved,
    /// `src` holds the in-vertex and `dst` the out-vertex
    Swapped,
}

impl EdgeOrientation {
    /// Order a stored `(out, in)` pair as `(src, dst)`
    pub fn orient<T>(&self, out: T, into: T) -> (T, T) {
        match self {
            EdgeOrientation::Preserved => (out, into),
            EdgeOrientation::Swapped => (into, out),
        }
    }
}

impl fmt::Display for EdgeOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeOrientation::Preserved => write!(f, "preserved"),
            EdgeOrientation::Swapped => write!(f, "swapped"),
        }
    }
}

impl FromStr for EdgeOrientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preserved" => Ok(EdgeOrientation::Preserved),
            "swapped" => Ok(EdgeOrientation::Swapped),
            other => Err(format!("unknown edge orientation '{}'", other)),
        }
    }
}

/// Import column naming and edge orientation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub orientation: EdgeOrientation,
    pub key_column: String,
    pub src_column: String,
    pub dst_column: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            orientation: EdgeOrientation::default(),
            key_column: "id".to_string(),
            src_column: "src".to_string(),
            dst_column: "dst".to_string(),
        }
    }
}

/// A graph read back from a database, with its summary
#[derive(Debug, Clone)]
pub struct ImportedGraph {
    pub summary: ImportSummary,
    pub graph: Graph,
}

impl ImportedGraph {
    pub fn vertices(&self) -> &Table {
        &self.graph.vertices
    }

    pub fn edges(&self) -> &Table {
        &self.graph.edges
    }
}

/// One stored record flattened to its id columns, attributes and class
struct Row<'a> {
    ids: Vec<String>,
    properties: &'a Map<String, JsonValue>,
    class: &'a ClassInfo,
}

/// Read the whole database
pub async fn import(conn: &Connection, options: &ImportOptions) -> BridgeResult<ImportedGraph> {
    let db = conn.session();
    let remote = |e| BridgeError::from_server(conn.url(), e);

    let vertex_classes = db.classes(ClassKind::Vertex).await.map_err(remote)?;
    let mut vertex_types = LabelCounts::new();
    let mut vertex_records = Vec::with_capacity(vertex_classes.len());
    for class in &vertex_classes {
        let records = db.scan_vertices(&class.name).await.map_err(remote)?;
        debug!("Read {} vertices from class {}", records.len(), class.name);
        vertex_types.insert(class.name.clone(), records.len() as u64);
        vertex_records.push((class, records));
    }

    let edge_classes = db.classes(ClassKind::Edge).await.map_err(remote)?;
    let mut edge_types = LabelCounts::new();
    let mut edge_records = Vec::with_capacity(edge_classes.len());
    for class in &edge_classes {
        let records = db.scan_edges(&class.name).await.map_err(remote)?;
        debug!("Read {} edges from class {}", records.len(), class.name);
        edge_types.insert(class.name.clone(), records.len() as u64);
        edge_records.push((class, records));
    }

    let vertex_rows = vertex_records.iter().flat_map(|(class, records)| {
        records.iter().map(move |v| Row {
            ids: vec![v.key.clone()],
            properties: &v.properties,
            class: *class,
        })
    });
    let vertices = build_table(&[options.key_column.as_str()], vertex_rows)?;

    let edge_rows = edge_records.iter().flat_map(|(class, records)| {
        records.iter().map(move |e| {
            let (src, dst) = options.orientation.orient(&e.out_key, &e.in_key);
            Row {
                ids: vec![src.clone(), dst.clone()],
                properties: &e.properties,
                class: *class,
            }
        })
    });
    let edges = build_table(
        &[options.src_column.as_str(), options.dst_column.as_str()],
        edge_rows,
    )?;

    let summary = ImportSummary::new(conn.db_uri(), vertex_types, edge_types);
    info!(
        "Imported {} vertices and {} edges from {}",
        summary.total_vertices(),
        summary.total_edges(),
        conn.url()
    );
    Ok(ImportedGraph {
        summary,
        graph: Graph::new(vertices, edges),
    })
}

/// Column layout under construction: id columns, then attributes in order of
/// first appearance, then label columns
#[derive(Default)]
struct Layout {
    columns: Vec<(String, Option<ColumnType>)>,
    index: HashMap<String, usize>,
}

impl Layout {
    fn add(&mut self, name: &str, dtype: Option<ColumnType>) -> usize {
        if let Some(&idx) = self.index.get(name) {
            let merged = widen(self.columns[idx].1, dtype);
            self.columns[idx].1 = merged;
            return idx;
        }
        self.columns.push((name.to_string(), dtype));
        self.index.insert(name.to_string(), self.columns.len() - 1);
        self.columns.len() - 1
    }

    fn schema(&self) -> BridgeResult<Schema> {
        let columns = self
            .columns
            .iter()
            .map(|(name, dtype)| Column::new(name.clone(), dtype.unwrap_or(ColumnType::Str)))
            .collect();
        Ok(Schema::new(columns)?)
    }
}

/// Common type of two observed column types
fn widen(a: Option<ColumnType>, b: Option<ColumnType>) -> Option<ColumnType> {
    match (a, b) {
        (None, t) | (t, None) => t,
        (Some(x), Some(y)) if x == y => Some(x),
        (Some(ColumnType::Int), Some(ColumnType::Float))
        | (Some(ColumnType::Float), Some(ColumnType::Int)) => Some(ColumnType::Float),
        _ => Some(ColumnType::Str),
    }
}

/// Fit a cell to its column's final type
fn coerce(value: Value, dtype: ColumnType) -> Value {
    match (value, dtype) {
        (Value::Null, _) => Value::Null,
        (Value::Int(i), ColumnType::Float) => Value::Float(i as f64),
        (v, ColumnType::Str) if !matches!(v, Value::Str(_)) => Value::Str(v.to_string()),
        (v, _) => v,
    }
}

fn build_table<'a>(id_columns: &[&str], rows: impl Iterator<Item = Row<'a>>) -> BridgeResult<Table> {
    let rows: Vec<Row<'a>> = rows.collect();
    let mut layout = Layout::default();
    for name in id_columns {
        layout.add(name, Some(ColumnType::Str));
    }
    for row in &rows {
        for (name, value) in row.properties {
            layout.add(name, Value::from_json(value).dtype());
        }
    }
    for row in &rows {
        if let Some(column) = &row.class.label_column {
            layout.add(column, Some(ColumnType::Str));
        }
    }

    let schema = layout.schema()?;
    let mut table = Table::new(schema.clone());
    for row in rows {
        let mut cells = vec![Value::Null; schema.len()];
        for (idx, id) in row.ids.into_iter().enumerate() {
            cells[idx] = Value::Str(id);
        }
        for (name, value) in row.properties {
            if let Some(idx) = layout.index.get(name) {
                cells[*idx] = coerce(Value::from_json(value), schema.columns()[*idx].dtype);
            }
        }
        if let Some(column) = &row.class.label_column {
            if let Some(idx) = layout.index.get(column) {
                cells[*idx] = Value::Str(row.class.name.clone());
            }
        }
        table.push_row(cells)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::connection::{resolve, Credentials, OpenMode};
    use crate::server::MemoryServer;
    use crate::types::{NewEdge, NewVertex};
    use serde_json::json;

    fn props(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap_or_default()
    }

    async fn seeded() -> (MemoryServer, Connection) {
        let server = MemoryServer::new("localhost", 2424, "root");
        let conn = resolve(
            &server,
            "memory:seeded",
            &Credentials::new("admin", "admin", "root"),
            OpenMode::CreateIfMissing,
        )
        .await
        .unwrap();
        let db = conn.session();
        db.create_class(ClassKind::Vertex, "F", Some("gender")).await.unwrap();
        db.create_class(ClassKind::Vertex, "M", Some("gender")).await.unwrap();
        db.create_class(ClassKind::Edge, "E", None).await.unwrap();
        db.insert_vertices(
            "M",
            vec![
                NewVertex::new("1", props(json!({"age": 30}))),
                NewVertex::new("2", props(json!({"age": 41.5}))),
            ],
        )
        .await
        .unwrap();
        db.insert_vertices("F", vec![NewVertex::new("3", props(json!({"age": null})))])
            .await
            .unwrap();
        db.insert_edges(
            "E",
            vec![
                NewEdge::new("1", "2", props(json!({"since": 2019}))),
                NewEdge::new("3", "1", Map::new()),
            ],
        )
        .await
        .unwrap();
        (server, conn)
    }

    #[tokio::test]
    async fn test_import_folds_labels_and_types() {
        let (_server, conn) = seeded().await;
        let imported = import(&conn, &ImportOptions::default()).await.unwrap();

        let vertices = imported.vertices();
        assert_eq!(vertices.schema().names(), vec!["id", "age", "gender"]);
        assert_eq!(vertices.schema().columns()[1].dtype, ColumnType::Float);
        assert_eq!(vertices.count(), 3);
        // classes are read in name order
        assert_eq!(vertices.rows()[0], vec![Value::from("3"), Value::Null, Value::from("F")]);
        assert_eq!(vertices.rows()[1][1], Value::Float(30.0));

        assert_eq!(imported.summary.vertex_types()["M"], 2);
        assert_eq!(imported.summary.total_vertices(), 3);
        assert_eq!(imported.summary.total_edges(), 2);
    }

    #[tokio::test]
    async fn test_import_edge_orientation() {
        let (_server, conn) = seeded().await;

        let preserved = import(&conn, &ImportOptions::default()).await.unwrap();
        let edges = preserved.edges();
        assert_eq!(edges.schema().names(), vec!["src", "dst", "since"]);
        assert_eq!(edges.rows()[0][..2], [Value::from("1"), Value::from("2")]);

        let options = ImportOptions {
            orientation: EdgeOrientation::Swapped,
            ..ImportOptions::default()
        };
        let swapped = import(&conn, &options).await.unwrap();
        assert_eq!(swapped.edges().rows()[0][..2], [Value::from("2"), Value::from("1")]);
        assert_eq!(swapped.edges().rows()[1][2], Value::Null);
    }

    #[tokio::test]
    async fn test_import_empty_database() {
        let server = MemoryServer::new("localhost", 2424, "root");
        let conn = resolve(
            &server,
            "memory:empty_import",
            &Credentials::new("reader", "reader", "root"),
            OpenMode::CreateIfMissing,
        )
        .await
        .unwrap();
        let imported = import(&conn, &ImportOptions::default()).await.unwrap();
        assert!(imported.vertices().is_empty());
        assert_eq!(imported.vertices().schema().names(), vec!["id"]);
        assert_eq!(imported.edges().schema().names(), vec!["src", "dst"]);
    }

    #[test]
    fn test_orientation_parse() {
        assert_eq!("Swapped".parse::<EdgeOrientation>(), Ok(EdgeOrientation::Swapped));
        assert_eq!("preserved".parse::<EdgeOrientation>(), Ok(EdgeOrientation::Preserved));
        assert!("sideways".parse::<EdgeOrientation>().is_err());
        assert_eq!(EdgeOrientation::Swapped.orient(1, 2), (2, 1));
    }
}
