#![allow(dead_code)]

// Shared fixtures for bridge integration tests

use rust_graph_bridge::{Credentials, CsvOptions, Graph, MemoryServer, Schema, Table};
use uuid::Uuid;

pub const HOST: &str = "localhost";
pub const PORT: u16 = 2424;
pub const ROOT_PASSWORD: &str = "orient123";

pub const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/clique_10_typed.csv");

pub fn memory_server() -> MemoryServer {
    MemoryServer::new(HOST, PORT, ROOT_PASSWORD)
}

/// Fresh database name, unique per test run
pub fn db_name() -> String {
    format!("db_{}", Uuid::new_v4().simple())
}

pub fn remote_url(name: &str) -> String {
    format!("remote:{}:{}/{}", HOST, PORT, name)
}

pub fn admin() -> Credentials {
    Credentials::new("admin", "admin", ROOT_PASSWORD)
}

/// Typed edge list: `src,dst,src_type,dst_type,edge_type`
pub fn typed_edges() -> Table {
    let schema = Schema::parse("src:str,dst:str,src_type:str,dst_type:str,edge_type:str").unwrap();
    Table::import_csv(FIXTURE, schema, &CsvOptions::default()).unwrap()
}

/// Vertex table derived from both endpoints of every edge, one row per id
pub fn vertices_of(edges: &Table) -> Table {
    let mut sources = edges.clone();
    sources
        .rename_columns(&[("src", "id"), ("src_type", "gender")])
        .unwrap();
    sources
        .drop_columns(&["dst", "dst_type", "edge_type"])
        .unwrap();

    let mut targets = edges.clone();
    targets
        .rename_columns(&[("dst", "id"), ("dst_type", "gender")])
        .unwrap();
    targets
        .drop_columns(&["src", "src_type", "edge_type"])
        .unwrap();

    sources.append(&targets).unwrap();
    sources.drop_duplicates(&["id"]).unwrap();
    sources
}

/// The 54-vertex, 165-edge typed clique graph
pub fn clique_graph() -> Graph {
    let edges = typed_edges();
    Graph::new(vertices_of(&edges), edges)
}
