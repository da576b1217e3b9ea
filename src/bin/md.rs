use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::FmtSubscriber;

use chpt_md::{compute, Graph, MDTree, ModuleIndex, ModuleKind};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    /// One JSON object per tree, `{"type": ..., "vertex"/"children": ...}`.
    Json,
    /// Tree adjacency lines, `kind child-indices...` per node.
    Adjacency,
}

#[derive(Debug, Parser)]
#[command(about = "Compute the modular decomposition tree of an edge-list graph")]
struct Cli {
    /// Input file with one `u v` edge per line.
    #[arg(long)]
    input: PathBuf,
    /// Output file; stdout if not given.
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
    /// Enable log output at this level (error, warn, info, debug, trace).
    #[arg(long)]
    log_level: Option<Level>,
}

#[derive(Error, Debug)]
enum ReadEdgeListError {
    #[error("invalid line (got {0})")]
    InvalidLine(String),
    #[error("invalid edge: {0}")]
    InvalidEdge(#[from] chpt_md::InvalidEdgeError),
    #[error("parse int error")]
    ParseInt(#[from] ParseIntError),
    #[error("io error")]
    IoError(#[from] std::io::Error),
}

fn read_edge_list(path: &PathBuf) -> Result<Graph, ReadEdgeListError> {
    let file = File::open(path)?;

    let mut edges = vec![];
    let mut n = 0;
    for line in std::io::BufReader::new(file).lines() {
        let line = line?;
        if line.is_empty() || line.starts_with('%') || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_ascii_whitespace();
        let (Some(a), Some(b), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Err(ReadEdgeListError::InvalidLine(line));
        };

        let u: u32 = a.parse()?;
        let v: u32 = b.parse()?;
        edges.push((u, v));
        n = n.max(u + 1).max(v + 1);
    }

    let mut graph = Graph::new(n as usize);
    for (u, v) in edges {
        graph.add_edge(u, v)?;
    }
    Ok(graph)
}

fn write_adjacency<W: Write>(out: &mut W, md: &MDTree<u32>) -> std::io::Result<()> {
    writeln!(out, "%% modular decomposition tree")?;
    writeln!(out, "%% per line:   kind children...")?;
    writeln!(out, "%%   kind:     0 => Prime, 1 => Series, 2 => Parallel, 3 + v => v")?;
    writeln!(out, "% root {}", md.root().index())?;
    writeln!(out, "{} {}", md.node_count(), md.node_count() - 1)?;
    for index in 0..md.node_count() {
        let module = ModuleIndex::new(index);
        let kind = match md.module_kind(module).expect("index is in range") {
            ModuleKind::Prime => 0,
            ModuleKind::Series => 1,
            ModuleKind::Parallel => 2,
            ModuleKind::Node(v) => 3 + v,
        };
        write!(out, "{kind}")?;
        for child in md.children(module) {
            write!(out, " {}", child.index())?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(level) = cli.log_level {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_span_events(FmtSpan::CLOSE)
            .finish();
        subscriber.init();
    }

    let graph = read_edge_list(&cli.input)?;

    let start = Instant::now();
    let md = compute(&graph);
    let time = start.elapsed();
    eprintln!("n={} m={} time={}s", graph.node_count(), graph.edge_count(), time.as_secs_f64());

    let Some(md) = md else {
        eprintln!("graph has no vertices, no tree to write");
        return Ok(());
    };

    let mut out: Box<dyn Write> = match cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    match cli.format {
        OutputFormat::Json => writeln!(out, "{}", md.to_json())?,
        OutputFormat::Adjacency => write_adjacency(&mut out, &md)?,
    }
    out.flush()?;
    Ok(())
}
