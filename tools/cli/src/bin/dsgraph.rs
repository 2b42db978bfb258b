use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use dialogue_graph::{
    ClipSequence, DialogueSystem, Graph, GraphDocument, ParsedText, RuntimeConfig, Suspension,
    TextEffects, Variables,
};

#[derive(Parser)]
#[command(author, version, about = "Dialogue graph tooling")]
struct Cli {
    /// Runtime configuration (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Raise log verbosity; repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a graph document, or every `.json` file under a directory.
    Validate { path: PathBuf },
    /// Walk a graph from an entry node and print the clips.
    Walk {
        document: PathBuf,
        #[arg(long, default_value = "start")]
        entry: String,
        /// Options to pick at successive choices, e.g. `--choose 0,1`.
        #[arg(long, value_delimiter = ',')]
        choose: Vec<usize>,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Parse inline tags in a line of dialogue text.
    Tags {
        text: String,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Print the JSON schema of the graph document format.
    Schema,
    /// Render a graph document as Graphviz DOT.
    Dot {
        document: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

#[derive(Serialize)]
struct WalkReport<'a> {
    entry: &'a str,
    finished: bool,
    clips: &'a ClipSequence,
    #[serde(skip_serializing_if = "Option::is_none")]
    suspended: Option<&'a Suspension>,
    variables: &'a Variables,
}

#[derive(Serialize)]
struct TagReport<'a> {
    #[serde(flatten)]
    parsed: &'a ParsedText,
    characters: usize,
    effects: &'a TextEffects,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let system = load_system(cli.config.as_deref())?;

    match cli.command {
        Command::Validate { path } => validate(&system, &path),
        Command::Walk {
            document,
            entry,
            choose,
            format,
        } => walk(&system, &document, &entry, &choose, format),
        Command::Tags { text, format } => tags(&system, &text, format),
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&GraphDocument::schema())?);
            Ok(())
        }
        Command::Dot { document, output } => dot(&system, &document, output.as_deref()),
    }
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_system(config: Option<&Path>) -> Result<DialogueSystem> {
    match config {
        Some(path) => {
            let config = RuntimeConfig::load(path)
                .with_context(|| format!("load config {}", path.display()))?;
            Ok(DialogueSystem::new(config))
        }
        None => Ok(DialogueSystem::default()),
    }
}

fn load_graph(system: &DialogueSystem, path: &Path) -> Result<Graph> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let graph = system
        .load_graph(&raw)
        .with_context(|| format!("deserialize {}", path.display()))?;
    Ok(graph)
}

fn validate(system: &DialogueSystem, path: &Path) -> Result<()> {
    let documents: Vec<PathBuf> = if path.is_dir() {
        WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect()
    } else {
        vec![path.to_path_buf()]
    };
    if documents.is_empty() {
        bail!("no graph documents found under {}", path.display());
    }

    let mut failed = 0usize;
    for document in &documents {
        match load_graph(system, document) {
            Ok(graph) => {
                let stats = graph.stats();
                println!(
                    "ok {} ({} nodes, {} edges, {} entries)",
                    document.display(),
                    stats.total_nodes,
                    stats.edge_count,
                    stats.entry_count
                );
                for index in graph.unreachable_nodes() {
                    let node = &graph[index];
                    warn!(document = %document.display(), node = %node.id, kind = %node.kind, "unreachable node");
                }
            }
            Err(err) => {
                failed += 1;
                println!("error {}: {err:#}", document.display());
            }
        }
    }
    info!(checked = documents.len(), failed, "validation finished");
    if failed > 0 {
        bail!("{failed} of {} documents failed validation", documents.len());
    }
    Ok(())
}

fn walk(
    system: &DialogueSystem,
    path: &Path,
    entry: &str,
    choose: &[usize],
    format: Format,
) -> Result<()> {
    let graph = load_graph(system, path)?;
    let walk = system
        .walker(&graph)
        .run(entry, choose)
        .with_context(|| format!("walk {} from `{entry}`", path.display()))?;
    let report = WalkReport {
        entry,
        finished: walk.is_finished(),
        clips: &walk.clips,
        suspended: walk.suspension(),
        variables: &walk.variables,
    };
    print_report(&report, format)
}

fn tags(system: &DialogueSystem, text: &str, format: Format) -> Result<()> {
    let parsed = system.parse_text(text)?;
    let effects = TextEffects::from_tags(&parsed.tags)?;
    let report = TagReport {
        parsed: &parsed,
        characters: parsed.char_len(),
        effects: &effects,
    };
    print_report(&report, format)
}

fn dot(system: &DialogueSystem, path: &Path, output: Option<&Path>) -> Result<()> {
    let graph = load_graph(system, path)?;
    let rendered = graph.to_dot();
    match output {
        Some(output) => {
            if let Some(parent) = output.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(output, rendered).with_context(|| format!("write {}", output.display()))?;
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn print_report<T: Serialize>(report: &T, format: Format) -> Result<()> {
    let rendered = match format {
        Format::Json => serde_json::to_string_pretty(report)?,
        Format::Yaml => serde_yaml::to_string(report)?,
    };
    println!("{rendered}");
    Ok(())
}
