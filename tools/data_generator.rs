use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_graph_bridge::{CsvOptions, Schema, Table, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "data_generator")]
#[command(about = "Generate typed edge lists for export tests", long_about = None)]
struct Args {
    /// Untyped edge list (`src,dst` per line); a random graph is generated when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Number of vertices for a random graph
    #[arg(short = 'n', long, default_value_t = 1000)]
    vertices: usize,

    /// Average degree for a random graph
    #[arg(short = 'd', long, default_value_t = 10)]
    avg_degree: usize,

    /// Labels assigned to vertices
    #[arg(long, value_delimiter = ',', default_value = "F,M")]
    vertex_labels: Vec<String>,

    /// Labels assigned to edges
    #[arg(long, value_delimiter = ',', default_value = "follower,friend")]
    edge_labels: Vec<String>,

    /// Output CSV (`src,dst,src_type,dst_type,edge_type`, no header)
    #[arg(short, long)]
    output: PathBuf,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

struct EdgeListGenerator {
    rng: StdRng,
}

impl EdgeListGenerator {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform random graph with a fixed average degree, no self-loops and no
    /// reverse duplicates
    fn generate_uniform(&mut self, n: usize, avg_degree: usize) -> Vec<(String, String)> {
        println!("Generating uniform random graph with {} vertices, avg degree {}...", n, avg_degree);
        if n < 2 {
            return Vec::new();
        }

        let num_edges = (n * avg_degree) / 2;
        let mut edges = Vec::with_capacity(num_edges);
        let mut edge_set = HashSet::new();

        let mut attempts = 0;
        let max_attempts = num_edges * 10;

        while edges.len() < num_edges && attempts < max_attempts {
            let start = self.rng.gen_range(0..n);
            let end = self.rng.gen_range(0..n);

            if start != end && !edge_set.contains(&(start, end)) && !edge_set.contains(&(end, start)) {
                edges.push((start.to_string(), end.to_string()));
                edge_set.insert((start, end));
            }
            attempts += 1;
        }
        edges
    }

    /// One label per vertex, drawn in sorted vertex order so a seed always
    /// gives the same assignment
    fn label_vertices(&mut self, edges: &[(String, String)], labels: &[String]) -> Result<BTreeMap<String, String>> {
        let vertices: BTreeSet<&String> = edges.iter().flat_map(|(s, d)| [s, d]).collect();
        vertices
            .into_iter()
            .map(|v| {
                let label = labels.choose(&mut self.rng).context("no vertex labels given")?;
                Ok((v.clone(), label.clone()))
            })
            .collect()
    }

    fn typed_edges(
        &mut self,
        edges: &[(String, String)],
        vertex_labels: &BTreeMap<String, String>,
        edge_labels: &[String],
    ) -> Result<Table> {
        let schema = Schema::parse("src:str,dst:str,src_type:str,dst_type:str,edge_type:str")?;
        let mut table = Table::new(schema);
        for (src, dst) in edges {
            let edge_label = edge_labels.choose(&mut self.rng).context("no edge labels given")?;
            table.push_row(vec![
                Value::from(src.as_str()),
                Value::from(dst.as_str()),
                Value::from(vertex_labels[src].as_str()),
                Value::from(vertex_labels[dst].as_str()),
                Value::from(edge_label.as_str()),
            ])?;
        }
        Ok(table)
    }
}

fn read_edge_list(path: &PathBuf) -> Result<Vec<(String, String)>> {
    let table = Table::import_csv(path, Schema::parse("src:str,dst:str")?, &CsvOptions::default())
        .with_context(|| format!("Failed to read edge list {:?}", path))?;
    Ok(table
        .rows()
        .iter()
        .map(|row| (row[0].to_string(), row[1].to_string()))
        .collect())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut generator = EdgeListGenerator::new(args.seed);

    let edges = match &args.input {
        Some(path) => read_edge_list(path)?,
        None => generator.generate_uniform(args.vertices, args.avg_degree),
    };

    let vertex_labels = generator.label_vertices(&edges, &args.vertex_labels)?;
    let table = generator.typed_edges(&edges, &vertex_labels, &args.edge_labels)?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    table
        .export_csv(&args.output, &CsvOptions::default())
        .context("Failed to write typed edge list")?;

    let mut per_vertex_label: BTreeMap<&str, usize> = BTreeMap::new();
    for label in vertex_labels.values() {
        *per_vertex_label.entry(label).or_insert(0) += 1;
    }
    let per_edge_label = table.group_by("edge_type")?;

    println!("\n✅ Data generation complete!");
    println!("Output: {:?}", args.output);
    println!("Graph statistics:");
    println!("  - Vertices: {}", vertex_labels.len());
    for (label, count) in &per_vertex_label {
        println!("      {}: {}", label, count);
    }
    println!("  - Edges: {}", table.count());
    let mut edge_counts: Vec<_> = per_edge_label.iter().map(|(l, rows)| (l, rows.len())).collect();
    edge_counts.sort();
    for (label, count) in edge_counts {
        println!("      {}: {}", label, count);
    }

    Ok(())
}
