use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use rust_graph_bridge::config::LoggingConfig;
use rust_graph_bridge::{
    export_graph, import_graph, validate, BridgeConfig, Credentials, CsvOptions, Graph,
    RocksDbServer, Schema, Table, ValidateOptions,
};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "graph_bridge")]
#[command(about = "Export graphs to, and import them from, a RocksDB graph server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a vertex table and an edge table into a database
    Export {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        input: GraphFiles,

        /// Vertex column whose values name the vertex classes
        #[arg(long)]
        vertex_type_column: Option<String>,

        /// Edge column whose values name the edge classes
        #[arg(long)]
        edge_type_column: Option<String>,
    },

    /// Import every class of a database into CSV files
    Import {
        #[command(flatten)]
        target: Target,

        /// Output file for vertices
        #[arg(long)]
        vertices_out: PathBuf,

        /// Output file for edges
        #[arg(long)]
        edges_out: PathBuf,
    },

    /// Compare a graph on disk with the content of a database
    Validate {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        input: GraphFiles,

        /// Edge column compared as part of each edge
        #[arg(long)]
        edge_label_column: Option<String>,
    },
}

#[derive(ClapArgs, Debug)]
struct Target {
    /// Database name, or a full database URL
    #[arg(long)]
    db: String,

    #[arg(short, long, default_value = "admin")]
    user: String,

    #[arg(short, long, default_value = "admin")]
    password: String,

    /// Root password; defaults to the configured one
    #[arg(long)]
    root_password: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct GraphFiles {
    /// Vertex CSV file
    #[arg(long)]
    vertices: PathBuf,

    /// Vertex schema, e.g. `id:str,gender:str`
    #[arg(long)]
    vertex_schema: String,

    /// Edge CSV file
    #[arg(long)]
    edges: PathBuf,

    /// Edge schema, e.g. `src:str,dst:str,edge_type:str`
    #[arg(long)]
    edge_schema: String,

    /// Input files start with a header row
    #[arg(long)]
    header: bool,
}

impl GraphFiles {
    fn load(&self) -> Result<Graph> {
        let options = CsvOptions {
            header: self.header,
            ..CsvOptions::default()
        };
        let vertices = Table::import_csv(&self.vertices, Schema::parse(&self.vertex_schema)?, &options)
            .with_context(|| format!("Failed to read vertices from {:?}", self.vertices))?;
        let edges = Table::import_csv(&self.edges, Schema::parse(&self.edge_schema)?, &options)
            .with_context(|| format!("Failed to read edges from {:?}", self.edges))?;
        Ok(Graph::new(vertices, edges))
    }
}

impl Target {
    fn url(&self, config: &BridgeConfig) -> String {
        if self.db.contains(':') {
            self.db.clone()
        } else {
            config.db_url(&self.db)
        }
    }

    fn credentials(&self, config: &BridgeConfig) -> Credentials {
        let root = self
            .root_password
            .clone()
            .unwrap_or_else(|| config.server.root_password.clone());
        Credentials::new(&self.user, &self.password, root)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = BridgeConfig::from_env()?;
    init_logging(&config.logging)?;

    let server = RocksDbServer::new(
        &config.server.data_dir,
        &config.server.host,
        config.server.port,
        &config.server.root_password,
    )
    .with_context(|| format!("Failed to open data directory {:?}", config.server.data_dir))?;
    tracing::info!("Serving databases from {}", config.server.data_dir.display());

    match cli.command {
        Command::Export {
            target,
            input,
            vertex_type_column,
            edge_type_column,
        } => {
            let graph = input.load()?;
            let result = export_graph(
                &server,
                &target.url(&config),
                &target.credentials(&config),
                &graph,
                vertex_type_column.as_deref(),
                edge_type_column.as_deref(),
                &config.export_options(),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Import {
            target,
            vertices_out,
            edges_out,
        } => {
            let imported = import_graph(
                &server,
                &target.url(&config),
                &target.credentials(&config),
                &config.import_options(),
            )
            .await?;
            let options = CsvOptions {
                header: true,
                ..CsvOptions::default()
            };
            imported.vertices().export_csv(&vertices_out, &options)?;
            imported.edges().export_csv(&edges_out, &options)?;
            println!("{}", serde_json::to_string_pretty(&imported.summary)?);
        }
        Command::Validate {
            target,
            input,
            edge_label_column,
        } => {
            let original = input.load()?;
            let import_options = config.import_options();
            let imported = import_graph(
                &server,
                &target.url(&config),
                &target.credentials(&config),
                &import_options,
            )
            .await?;
            let report = validate(
                &original,
                &imported.graph,
                &ValidateOptions {
                    orientation: import_options.orientation,
                    edge_label_column,
                    ..ValidateOptions::default()
                },
            )?;
            println!("{}", report);
            if !report.is_consistent() {
                anyhow::bail!("database content differs from the input graph");
            }
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
