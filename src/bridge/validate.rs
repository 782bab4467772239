/// Consistency validation
///
/// Compares an original graph with a reconstructed one:
/// - vertex id sets
/// - edge multisets of `(src, dst, label)` triples, after orienting the
///   reconstructed edges back to the original direction
/// - total degree per vertex id
///
/// All comparisons are order-independent. The report lists every mismatch
/// instead of stopping at the first one.

use super::graph::{merge_counts, Graph};
use super::import::EdgeOrientation;
use crate::table::{Table, TableResult};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Column naming for both graphs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Orientation the reconstructed edges were imported with
    pub orientation: EdgeOrientation,
    pub key_column: String,
    pub src_column: String,
    pub dst_column: String,
    /// Edge column holding the label, compared when set
    pub edge_label_column: Option<String>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            orientation: EdgeOrientation::default(),
            key_column: "id".to_string(),
            src_column: "src".to_string(),
            dst_column: "dst".to_string(),
            edge_label_column: None,
        }
    }
}

/// An edge reduced to what validation compares
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeTriple {
    pub src: String,
    pub dst: String,
    pub label: Option<String>,
}

impl fmt::Display for EdgeTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "({} -> {}, {})", self.src, self.dst, label),
            None => write!(f, "({} -> {})", self.src, self.dst),
        }
    }
}

/// Degree of one vertex in both graphs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegreeMismatch {
    pub id: String,
    pub expected: u64,
    pub actual: u64,
}

/// Outcome of a validation; empty lists mean the graphs agree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Ids in the original but not the reconstruction
    pub missing_vertices: Vec<String>,
    /// Ids in the reconstruction but not the original
    pub unexpected_vertices: Vec<String>,
    /// Original edges lacking a reconstructed counterpart, one entry per copy
    pub missing_edges: Vec<EdgeTriple>,
    pub unexpected_edges: Vec<EdgeTriple>,
    pub degree_mismatches: Vec<DegreeMismatch>,
}

impl ValidationReport {
    pub fn is_consistent(&self) -> bool {
        self.missing_vertices.is_empty()
            && self.unexpected_vertices.is_empty()
            && self.missing_edges.is_empty()
            && self.unexpected_edges.is_empty()
            && self.degree_mismatches.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_consistent() {
            return write!(f, "graphs are consistent");
        }
        writeln!(f, "graphs differ:")?;
        for id in &self.missing_vertices {
            writeln!(f, "  missing vertex {}", id)?;
        }
        for id in &self.unexpected_vertices {
            writeln!(f, "  unexpected vertex {}", id)?;
        }
        for edge in &self.missing_edges {
            writeln!(f, "  missing edge {}", edge)?;
        }
        for edge in &self.unexpected_edges {
            writeln!(f, "  unexpected edge {}", edge)?;
        }
        for m in &self.degree_mismatches {
            writeln!(f, "  vertex {}: degree {} expected {}", m.id, m.actual, m.expected)?;
        }
        Ok(())
    }
}

/// Compare `original` with `reconstructed`
pub fn validate(
    original: &Graph,
    reconstructed: &Graph,
    options: &ValidateOptions,
) -> TableResult<ValidationReport> {
    let (src, dst) = (options.src_column.as_str(), options.dst_column.as_str());

    let expected_ids = vertex_ids(&original.vertices, &options.key_column)?;
    let actual_ids = vertex_ids(&reconstructed.vertices, &options.key_column)?;

    let expected_edges = edge_multiset(&original.edges, src, dst, options, EdgeOrientation::Preserved)?;
    let actual_edges = edge_multiset(&reconstructed.edges, src, dst, options, options.orientation)?;

    // degrees are undirected, so the reconstructed orientation does not matter
    let expected_degrees = original.degrees(&options.key_column, src, dst)?;
    let actual_degrees = reconstructed.degrees(&options.key_column, src, dst)?;

    let ids: BTreeSet<&String> = expected_degrees.keys().chain(actual_degrees.keys()).collect();
    let degree_mismatches = ids
        .into_iter()
        .filter_map(|id| {
            let expected = expected_degrees.get(id).copied().unwrap_or(0);
            let actual = actual_degrees.get(id).copied().unwrap_or(0);
            (expected != actual).then(|| DegreeMismatch {
                id: id.clone(),
                expected,
                actual,
            })
        })
        .collect();

    Ok(ValidationReport {
        missing_vertices: expected_ids.difference(&actual_ids).cloned().collect(),
        unexpected_vertices: actual_ids.difference(&expected_ids).cloned().collect(),
        missing_edges: multiset_difference(&expected_edges, &actual_edges),
        unexpected_edges: multiset_difference(&actual_edges, &expected_edges),
        degree_mismatches,
    })
}

fn vertex_ids(table: &Table, key_column: &str) -> TableResult<BTreeSet<String>> {
    Ok(table
        .column_values(key_column)?
        .into_iter()
        .map(|v| v.to_string())
        .collect())
}

fn edge_multiset(
    table: &Table,
    src_column: &str,
    dst_column: &str,
    options: &ValidateOptions,
    orientation: EdgeOrientation,
) -> TableResult<HashMap<EdgeTriple, u64>> {
    let src = table.schema().require(src_column)?;
    let dst = table.schema().require(dst_column)?;
    let label = options
        .edge_label_column
        .as_deref()
        .map(|c| table.schema().require(c))
        .transpose()?;

    Ok(table
        .rows()
        .par_iter()
        .fold(HashMap::new, |mut acc: HashMap<EdgeTriple, u64>, row| {
            // undo the import orientation to get back to (out, in)
            let (out, into) = orientation.orient(&row[src], &row[dst]);
            let triple = EdgeTriple {
                src: out.to_string(),
                dst: into.to_string(),
                label: label.map(|idx| row[idx].to_string()),
            };
            *acc.entry(triple).or_insert(0) += 1;
            acc
        })
        .reduce(HashMap::new, merge_counts))
}

/// Entries of `left` not matched in `right`, repeated by the surplus count
fn multiset_difference(
    left: &HashMap<EdgeTriple, u64>,
    right: &HashMap<EdgeTriple, u64>,
) -> Vec<EdgeTriple> {
    let surplus: BTreeMap<&EdgeTriple, u64> = left
        .iter()
        .filter_map(|(triple, &n)| {
            let extra = n.saturating_sub(right.get(triple).copied().unwrap_or(0));
            (extra > 0).then_some((triple, extra))
        })
        .collect();
    surplus
        .into_iter()
        .flat_map(|(triple, n)| std::iter::repeat(triple.clone()).take(n as usize))
        .collect()
}
