/// Result summaries for export and import calls
///
/// Both are built once at the end of a successful call and are read-only
/// afterwards.

use serde::Serialize;
use std::collections::BTreeMap;

pub const TOTAL_EXPORTED_VERTICES: &str = "Total Exported Vertices Count";
pub const TOTAL_EXPORTED_EDGES: &str = "Total Exported Edges Count";
pub const TOTAL_IMPORTED_VERTICES: &str = "Total Imported Vertices Count";
pub const TOTAL_IMPORTED_EDGES: &str = "Total Imported Edges Count";

/// Per-label counts: label -> number of records
pub type LabelCounts = BTreeMap<String, u64>;

fn totals(metric: &str, counts: &LabelCounts) -> BTreeMap<String, u64> {
    let mut summary = BTreeMap::new();
    summary.insert(metric.to_string(), counts.values().sum());
    summary
}

/// Outcome of one export call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportResult {
    db_uri: String,
    vertex_types: LabelCounts,
    edge_types: LabelCounts,
    exported_vertices_summary: BTreeMap<String, u64>,
    exported_edges_summary: BTreeMap<String, u64>,
}

impl ExportResult {
    pub fn new(db_uri: impl Into<String>, vertex_types: LabelCounts, edge_types: LabelCounts) -> Self {
        Self {
            db_uri: db_uri.into(),
            exported_vertices_summary: totals(TOTAL_EXPORTED_VERTICES, &vertex_types),
            exported_edges_summary: totals(TOTAL_EXPORTED_EDGES, &edge_types),
            vertex_types,
            edge_types,
        }
    }

    pub fn db_uri(&self) -> &str {
        &self.db_uri
    }

    pub fn vertex_types(&self) -> &LabelCounts {
        &self.vertex_types
    }

    pub fn edge_types(&self) -> &LabelCounts {
        &self.edge_types
    }

    pub fn exported_vertices_summary(&self) -> &BTreeMap<String, u64> {
        &self.exported_vertices_summary
    }

    pub fn exported_edges_summary(&self) -> &BTreeMap<String, u64> {
        &self.exported_edges_summary
    }

    pub fn total_vertices(&self) -> u64 {
        self.exported_vertices_summary[TOTAL_EXPORTED_VERTICES]
    }

    pub fn total_edges(&self) -> u64 {
        self.exported_edges_summary[TOTAL_EXPORTED_EDGES]
    }
}

/// Outcome of one import call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    db_uri: String,
    vertex_types: LabelCounts,
    edge_types: LabelCounts,
    imported_vertices_summary: BTreeMap<String, u64>,
    imported_edges_summary: BTreeMap<String, u64>,
}

impl ImportSummary {
    pub fn new(db_uri: impl Into<String>, vertex_types: LabelCounts, edge_types: LabelCounts) -> Self {
        Self {
            db_uri: db_uri.into(),
            imported_vertices_summary: totals(TOTAL_IMPORTED_VERTICES, &vertex_types),
            imported_edges_summary: totals(TOTAL_IMPORTED_EDGES, &edge_types),
            vertex_types,
            edge_types,
        }
    }

    pub fn db_uri(&self) -> &str {
        &self.db_uri
    }

    pub fn vertex_types(&self) -> &LabelCounts {
        &self.vertex_types
    }

    pub fn edge_types(&self) -> &LabelCounts {
        &self.edge_types
    }

    pub fn imported_vertices_summary(&self) -> &BTreeMap<String, u64> {
        &self.imported_vertices_summary
    }

    pub fn imported_edges_summary(&self) -> &BTreeMap<String, u64> {
        &self.imported_edges_summary
    }

    pub fn total_vertices(&self) -> u64 {
        self.imported_vertices_summary[TOTAL_IMPORTED_VERTICES]
    }

    pub fn total_edges(&self) -> u64 {
        self.imported_edges_summary[TOTAL_IMPORTED_EDGES]
    }
}
