//! Alchemist CLI - clean, validate and export allocation spreadsheets
//!
//! # Main Commands
//!
//! ```bash
//! alchemist serve                                  # Start HTTP server (port 3000)
//! alchemist ingest clients clients.csv            # Normalize one spreadsheet
//! alchemist validate --clients c.csv --tasks t.csv # Cross-check collections
//! alchemist export --clients c.csv --out-dir out   # Write cleaned CSVs + rules.json
//! ```
//!
//! # Helper Commands
//!
//! ```bash
//! alchemist aliases workers                        # Show accepted header spellings
//! alchemist nl-rule "co-run T1 T2"                 # Sentence to rule JSON
//! alchemist search --tasks t.csv "duration > 2"    # Filter tasks
//! ```

use alchemist::config::ServerConfig;
use alchemist::normalize::{alias_table, CanonicalRecord};
use alchemist::{
    ingest_file, parse_bundle, parse_rules, parse_task_filter, write_bundle, Client, EntityKind, Ingested, Task,
    ValidationSummary, Worker, Workspace,
};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "alchemist")]
#[command(about = "Clean, validate and export client/worker/task spreadsheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and normalize one spreadsheet
    Ingest {
        /// Entity kind: clients, workers or tasks
        entity: EntityKind,

        /// Input CSV file
        input: PathBuf,

        /// Output file for canonical records (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ingest the given files and run cross-entity validation
    Validate {
        #[command(flatten)]
        files: InputFiles,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write cleaned CSVs and rules.json
    Export {
        #[command(flatten)]
        files: InputFiles,

        /// Rules bundle JSON to include
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Destination directory
        #[arg(long)]
        out_dir: PathBuf,
    },

    /// Show the header aliases accepted for each entity
    Aliases {
        /// Only this entity
        entity: Option<EntityKind>,
    },

    /// Convert a sentence into rules
    NlRule {
        /// Sentence such as "co-run T1 T2"
        text: String,
    },

    /// Filter tasks with a plain-language query
    Search {
        /// Tasks CSV file
        #[arg(long)]
        tasks: PathBuf,

        /// Query such as "duration > 2 phase 3"
        query: String,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (overrides ALCHEMIST_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(clap::Args)]
struct InputFiles {
    /// Clients CSV file
    #[arg(long)]
    clients: Option<PathBuf>,

    /// Workers CSV file
    #[arg(long)]
    workers: Option<PathBuf>,

    /// Tasks CSV file
    #[arg(long)]
    tasks: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ingest { entity, input, output } => cmd_ingest(entity, &input, output.as_deref()),

        Commands::Validate { files, json } => cmd_validate(&files, json),

        Commands::Export { files, rules, out_dir } => cmd_export(&files, rules.as_deref(), &out_dir),

        Commands::Aliases { entity } => cmd_aliases(entity),

        Commands::NlRule { text } => cmd_nl_rule(&text),

        Commands::Search { tasks, query } => cmd_search(&tasks, &query),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_ingest(entity: EntityKind, input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let json = match entity {
        EntityKind::Clients => serde_json::to_string_pretty(&load::<Client>(input)?)?,
        EntityKind::Workers => serde_json::to_string_pretty(&load::<Worker>(input)?)?,
        EntityKind::Tasks => serde_json::to_string_pretty(&load::<Task>(input)?)?,
    };
    write_output(&json, output)?;
    Ok(())
}

/// Ingest one file and return its records. The pipeline logs encoding,
/// delimiter and header mapping; only rows missing an identifier are listed here.
fn load<T: CanonicalRecord>(input: &Path) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    eprintln!("📄 {}", input.display());

    let Ingested { result, .. } = ingest_file::<T>(input)?;

    if !result.issues.is_empty() {
        eprintln!("⚠️  {} row(s) missing an identifier (kept):", result.issues.len());
        for issue in result.issues.iter().take(5) {
            eprintln!("   - row {}: {}", issue.row_index.unwrap_or_default(), issue.message);
        }
    }

    Ok(result.mapped)
}

fn load_workspace(files: &InputFiles) -> Result<Workspace, Box<dyn std::error::Error>> {
    if files.clients.is_none() && files.workers.is_none() && files.tasks.is_none() {
        return Err("at least one of --clients, --workers or --tasks is required".into());
    }

    let mut workspace = Workspace::new();
    if let Some(path) = &files.clients {
        workspace.set_clients(load(path)?);
    }
    if let Some(path) = &files.workers {
        workspace.set_workers(load(path)?);
    }
    if let Some(path) = &files.tasks {
        workspace.set_tasks(load(path)?);
    }
    Ok(workspace)
}

fn print_summary(summary: &ValidationSummary) {
    let counts = summary.counts();
    eprintln!(
        "\n📊 Results: {} error(s), {} warning(s), {} info",
        counts.error, counts.warning, counts.info
    );
    for issue in summary.issues.iter().take(20) {
        let row = match (&issue.row_id, issue.row_index) {
            (Some(id), _) => id.clone(),
            (None, Some(index)) => format!("row {}", index),
            (None, None) => "-".to_string(),
        };
        eprintln!("   [{:?}] {} {}: {}", issue.level, issue.entity, row, issue.message);
    }
    if summary.issues.len() > 20 {
        eprintln!("   ... {} more", summary.issues.len() - 20);
    }
}

/// Missing identifiers and cross-entity issues of the given files.
fn validation_report(files: &InputFiles) -> Result<ValidationSummary, Box<dyn std::error::Error>> {
    Ok(load_workspace(files)?.combined_summary())
}

fn cmd_validate(files: &InputFiles, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let summary = validation_report(files)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if summary.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_export(files: &InputFiles, rules: Option<&Path>, out_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut workspace = load_workspace(files)?;

    if let Some(path) = rules {
        eprintln!("📜 Rules: {}", path.display());
        let bundle = parse_bundle(&fs::read_to_string(path)?)?;
        eprintln!("   {} rule(s), profile {:?}", bundle.rules.len(), bundle.priorities.profile);
        workspace.replace_rules_bundle(bundle);
    }

    let summary = workspace.combined_summary();
    if summary.has_errors() {
        eprintln!("\n⚠️  Exporting with {} validation error(s)", summary.counts().error);
    }

    let written = write_bundle(out_dir, &workspace.export_bundle())?;
    for path in &written {
        eprintln!("   💾 {}", path.display());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_aliases(entity: Option<EntityKind>) -> Result<(), Box<dyn std::error::Error>> {
    let kinds = match entity {
        Some(kind) => vec![kind],
        None => EntityKind::ALL.to_vec(),
    };

    for kind in kinds {
        println!("{}:", kind);
        for field in alias_table(kind).fields {
            println!("  {:<20} {}", field.canonical, field.aliases.join(", "));
        }
    }
    Ok(())
}

fn cmd_nl_rule(text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let rules = parse_rules(text);
    if rules.is_empty() {
        eprintln!("⚠️  No rule recognized");
    }
    println!("{}", serde_json::to_string_pretty(&rules)?);
    Ok(())
}

fn cmd_search(tasks: &Path, query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let tasks = load::<Task>(tasks)?;
    let filter = parse_task_filter(query);
    if filter.is_empty() {
        eprintln!("⚠️  Query not understood, returning every task");
    }

    let matches = filter.apply(&tasks);
    eprintln!("🔎 {} of {} task(s) match", matches.len(), tasks.len());
    println!("{}", serde_json::to_string_pretty(&matches)?);
    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::from_env()?;
    if let Some(port) = port {
        config = config.with_port(port);
    }
    alchemist::server::start_server(config).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("   💾 Saved to: {}", p.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
