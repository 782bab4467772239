/// Export scenarios against the in-memory server

mod common;

use common::*;
use rust_graph_bridge::bridge::summary::{TOTAL_EXPORTED_EDGES, TOTAL_EXPORTED_VERTICES};
use rust_graph_bridge::{
    export_graph, BridgeError, ClassKind, Credentials, ErrorKind, ExportOptions, GraphServer,
    ServerError,
};

#[tokio::test]
async fn test_default_export() {
    let server = memory_server();
    let graph = clique_graph();
    let url = remote_url(&db_name());

    let result = export_graph(&server, &url, &admin(), &graph, None, None, &ExportOptions::default())
        .await
        .unwrap();

    assert_eq!(result.db_uri(), url);
    assert_eq!(result.vertex_types().len(), 1);
    assert_eq!(result.vertex_types()["V"], 54);
    assert_eq!(result.edge_types().len(), 1);
    assert_eq!(result.edge_types()["E"], 165);
    assert_eq!(result.exported_vertices_summary()[TOTAL_EXPORTED_VERTICES], 54);
    assert_eq!(result.exported_edges_summary()[TOTAL_EXPORTED_EDGES], 165);
}

#[tokio::test]
async fn test_typed_export() {
    let server = memory_server();
    let graph = clique_graph();
    let url = remote_url(&db_name());

    let result = export_graph(
        &server,
        &url,
        &admin(),
        &graph,
        Some("gender"),
        Some("edge_type"),
        &ExportOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.vertex_types()["F"], 26);
    assert_eq!(result.vertex_types()["M"], 28);
    assert_eq!(result.edge_types()["follower"], 85);
    assert_eq!(result.edge_types()["friend"], 80);
    assert_eq!(result.total_vertices(), graph.vertices.count() as u64);
    assert_eq!(result.total_edges(), graph.edges.count() as u64);
}

#[tokio::test]
async fn test_bad_db_url() {
    let server = memory_server();
    let err = export_graph(&server, "bad", &admin(), &clique_graph(), None, None, &ExportOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.to_string().contains("Error on opening database 'bad'"));
}

#[tokio::test]
async fn test_bad_root_password() {
    let server = memory_server();
    let credentials = Credentials::new("admin", "admin", "bad");
    let err = export_graph(
        &server,
        &remote_url(&db_name()),
        &credentials,
        &clique_graph(),
        None,
        None,
        &ExportOptions::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RootAuth);
    assert!(err.to_string().contains("Wrong user/password"));
    assert!(server.database_names().is_empty());
}

#[tokio::test]
async fn test_bad_user_name_and_password() {
    let server = memory_server();
    for credentials in [
        Credentials::new("ERR", "admin", ROOT_PASSWORD),
        Credentials::new("admin", "ERR", ROOT_PASSWORD),
    ] {
        let err = export_graph(
            &server,
            &remote_url(&db_name()),
            &credentials,
            &clique_graph(),
            None,
            None,
            &ExportOptions::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UserAuth);
        assert!(err.to_string().contains("Unable to open database"));
    }
}

#[tokio::test]
async fn test_bad_type_column_checked_before_connecting() {
    let server = memory_server();
    // the root password is wrong too; the column check must win
    let credentials = Credentials::new("admin", "admin", "bad");
    let err = export_graph(
        &server,
        &remote_url(&db_name()),
        &credentials,
        &clique_graph(),
        Some("ERR"),
        None,
        &ExportOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        BridgeError::ColumnNotFound {
            side: ClassKind::Vertex,
            ..
        }
    ));
    assert!(err.to_string().contains("Cannot connect to the remote server/database"));
    assert!(server.database_names().is_empty());
}

#[tokio::test]
async fn test_reexport_to_same_database_fails() {
    let server = memory_server();
    let graph = clique_graph();
    let url = remote_url(&db_name());
    let options = ExportOptions::default();

    export_graph(&server, &url, &admin(), &graph, Some("gender"), None, &options)
        .await
        .unwrap();
    let err = export_graph(&server, &url, &admin(), &graph, Some("gender"), None, &options)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Remote);
    assert!(matches!(
        err,
        BridgeError::Remote {
            source: ServerError::DuplicateKey(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_counts_exact_at_any_concurrency() {
    let graph = clique_graph();
    for (batch_size, max_concurrency) in [(1, 1), (7, 2), (1000, 16)] {
        let server = memory_server();
        let name = db_name();
        let url = remote_url(&name);
        let options = ExportOptions {
            batch_size,
            max_concurrency,
            ..ExportOptions::default()
        };

        let result = export_graph(
            &server,
            &url,
            &admin(),
            &graph,
            Some("gender"),
            Some("edge_type"),
            &options,
        )
        .await
        .unwrap();
        assert_eq!(result.vertex_types()["F"], 26);
        assert_eq!(result.vertex_types()["M"], 28);
        assert_eq!(result.edge_types()["follower"], 85);
        assert_eq!(result.edge_types()["friend"], 80);

        let db = server
            .open_database(&name, "admin", "admin")
            .await
            .unwrap();
        assert_eq!(db.count(ClassKind::Vertex, "F").await.unwrap(), 26);
        assert_eq!(db.count(ClassKind::Edge, "friend").await.unwrap(), 80);
    }
}

#[tokio::test]
async fn test_connection_lost_mid_export() {
    let server = memory_server();
    let graph = clique_graph();
    let url = remote_url(&db_name());
    let options = ExportOptions {
        batch_size: 10,
        ..ExportOptions::default()
    };

    // class creation goes through; the connection drops during the vertex phase
    server.disconnect_after_writes(6);
    let err = export_graph(&server, &url, &admin(), &graph, Some("gender"), Some("edge_type"), &options)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.to_string().contains(&url));
}

#[tokio::test]
async fn test_memory_url() {
    let server = memory_server();
    let graph = clique_graph();

    let result = export_graph(
        &server,
        "memory:scratch",
        &admin(),
        &graph,
        None,
        Some("edge_type"),
        &ExportOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(result.db_uri(), "memory:scratch");
    assert_eq!(result.vertex_types()["V"], 54);
    assert_eq!(result.edge_types().len(), 2);
}

#[tokio::test]
async fn test_unreachable_host() {
    let server = memory_server();
    let err = export_graph(
        &server,
        "remote:elsewhere:2424/db_x",
        &admin(),
        &clique_graph(),
        None,
        None,
        &ExportOptions::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.to_string().contains("db_x"));
}
