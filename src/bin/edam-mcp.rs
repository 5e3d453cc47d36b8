//! edam-mcp CLI: EDAM concept mapping with an MCP server.
//!
//! Usage:
//!   edam-mcp mcp [--config path] [--ontology path]
//!   edam-mcp map <description> [--context text] [--max-results n]
//!   edam-mcp suggest <description> [--type t] [--parent ref]
//!   edam-mcp catalog

use clap::{Parser, Subcommand};
use edam_mcp::{ConceptType, EdamApi, Settings};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(
    name = "edam-mcp",
    version,
    about = "Map tool and data descriptions to EDAM ontology concepts"
)]
struct Cli {
    /// YAML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Catalog snapshot (JSON or YAML), overrides the settings file
    #[arg(long, global = true)]
    ontology: Option<PathBuf>,
    /// trace, debug, info, warn or error
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP (Model Context Protocol) server on stdio
    Mcp,
    /// Map a description to existing EDAM concepts
    Map {
        description: String,
        #[arg(long)]
        context: Option<String>,
        #[arg(long)]
        max_results: Option<usize>,
        #[arg(long)]
        min_confidence: Option<f64>,
    },
    /// Propose new EDAM concepts for a description
    Suggest {
        description: String,
        /// Operation, Data, Format, Topic or Identifier
        #[arg(long = "type")]
        concept_type: Option<ConceptType>,
        /// Parent concept URI, short id or label
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        rationale: Option<String>,
        #[arg(long)]
        max_suggestions: Option<usize>,
    },
    /// Show concept counts per type
    Catalog,
}

fn load_settings(cli: &Cli) -> Result<Settings, String> {
    let mut settings =
        Settings::load(cli.config.as_deref()).map_err(|e| format!("Failed to load settings: {}", e))?;
    if let Some(path) = &cli.ontology {
        settings.ontology_path = path.clone();
    }
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    settings
        .validate()
        .map_err(|e| format!("Invalid settings: {}", e))?;
    Ok(settings)
}

/// Logs go to stderr; stdout carries MCP frames or command output.
fn init_logging(level: &str) {
    let level = tracing::Level::from_str(level).unwrap_or(tracing::Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_api(settings: Settings) -> Result<EdamApi, String> {
    EdamApi::from_settings(settings).map_err(|e| format!("Failed to load ontology: {}", e))
}

fn block_on<F: Future<Output = i32>>(future: F) -> i32 {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(future),
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            1
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_map(
    api: &EdamApi,
    description: String,
    context: Option<String>,
    max_results: Option<usize>,
    min_confidence: Option<f64>,
) -> i32 {
    let mut request = api.match_request(description);
    request.context = context;
    if let Some(max_results) = max_results {
        request.max_results = max_results;
    }
    if let Some(min_confidence) = min_confidence {
        request.min_confidence = min_confidence;
    }
    block_on(async {
        match api.map(&request).await {
            Ok(outcome) => print_json(&outcome),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        }
    })
}

fn cmd_suggest(
    api: &EdamApi,
    description: String,
    concept_type: Option<ConceptType>,
    parent: Option<String>,
    rationale: Option<String>,
    max_suggestions: Option<usize>,
) -> i32 {
    let mut request = api.suggestion_request(description);
    request.concept_type = concept_type;
    request.parent_concept = parent;
    request.rationale = rationale;
    if let Some(max_suggestions) = max_suggestions {
        request.max_suggestions = max_suggestions;
    }
    block_on(async {
        match api.suggest(&request).await {
            Ok(outcome) => print_json(&outcome),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        }
    })
}

fn cmd_catalog(api: &EdamApi) -> i32 {
    let summary = match api.catalog_summary() {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    println!("Catalog: {}", api.settings().ontology_path.display());
    println!("Embedding model: {}", api.model_name());
    for (concept_type, count) in &summary {
        println!("  {:<12} {}", concept_type.as_str(), count);
    }
    println!("  {:<12} {}", "total", summary.values().sum::<usize>());
    0
}

fn main() {
    let cli = Cli::parse();
    let settings = match load_settings(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&settings.log_level);

    if let Commands::Mcp = cli.command {
        let code = edam_mcp::mcp::run_mcp_server(settings);
        std::process::exit(code);
    }

    let api = match open_api(settings) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let code = match cli.command {
        Commands::Mcp => 0,
        Commands::Map {
            description,
            context,
            max_results,
            min_confidence,
        } => cmd_map(&api, description, context, max_results, min_confidence),
        Commands::Suggest {
            description,
            concept_type,
            parent,
            rationale,
            max_suggestions,
        } => cmd_suggest(&api, description, concept_type, parent, rationale, max_suggestions),
        Commands::Catalog => cmd_catalog(&api),
    };
    std::process::exit(code);
}
