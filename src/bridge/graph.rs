/// A graph held as two tables
///
/// `vertices` carries one row per vertex keyed by an id column; `edges`
/// carries one row per directed edge with source and destination id columns.

use crate::table::{Table, TableResult};
use rayon::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub vertices: Table,
    pub edges: Table,
}

impl Graph {
    pub fn new(vertices: Table, edges: Table) -> Self {
        Self { vertices, edges }
    }

    /// Total degree per vertex id, treating every edge as undirected
    ///
    /// Every vertex id gets an entry, isolated vertices included. A self-loop
    /// adds two to its vertex. Edge endpoints absent from the vertex table are
    /// counted too, so dangling edges show up as extra ids.
    pub fn degrees(
        &self,
        key_column: &str,
        src_column: &str,
        dst_column: &str,
    ) -> TableResult<HashMap<String, u64>> {
        let key = self.vertices.schema().require(key_column)?;
        let src = self.edges.schema().require(src_column)?;
        let dst = self.edges.schema().require(dst_column)?;

        let mut degrees: HashMap<String, u64> = self
            .vertices
            .rows()
            .iter()
            .map(|row| (row[key].to_string(), 0))
            .collect();

        let edge_degrees = self
            .edges
            .rows()
            .par_iter()
            .fold(HashMap::new, |mut acc: HashMap<String, u64>, row| {
                *acc.entry(row[src].to_string()).or_insert(0) += 1;
                *acc.entry(row[dst].to_string()).or_insert(0) += 1;
                acc
            })
            .reduce(HashMap::new, merge_counts);

        for (id, degree) in edge_degrees {
            *degrees.entry(id).or_insert(0) += degree;
        }
        Ok(degrees)
    }
}

/// Add the counts of `right` into `left`
pub(crate) fn merge_counts<K: std::hash::Hash + Eq>(
    mut left: HashMap<K, u64>,
    right: HashMap<K, u64>,
) -> HashMap<K, u64> {
    for (k, n) in right {
        *left.entry(k).or_insert(0) += n;
    }
    left
}
