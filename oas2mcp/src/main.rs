//! oas2mcp CLI - Compile an OpenAPI document into MCP tool definitions

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use mcpoas_core::{generate_artifact, generate_artifact_pretty, generate_listing};
use oas2mcp::{compile_source, CompilerConfig};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Reloadable tool set for the dispatcher
    Artifact,
    /// MCP `tools/list` result with JSON Schema
    Listing,
}

#[derive(Parser, Debug)]
#[command(name = "oas2mcp")]
#[command(about = "Compile an OpenAPI document into MCP tool definitions")]
#[command(version)]
struct Args {
    /// Input OpenAPI document, JSON or YAML (use - for stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty print the output JSON
    #[arg(short, long)]
    pretty: bool,

    /// Namespace prefixed to every tool name
    #[arg(long, default_value = oas2mcp::config::DEFAULT_NAMESPACE)]
    namespace: String,

    /// Reference hops followed before a schema is left unchecked
    #[arg(long, default_value_t = oas2mcp::config::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Argument that carries a non-object request body
    #[arg(long, default_value = oas2mcp::config::DEFAULT_BODY_FIELD)]
    body_field: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Artifact)]
    format: Format,

    /// Keep only tools whose name matches this glob (repeatable)
    #[arg(long = "only", value_name = "GLOB")]
    only: Vec<String>,
}

/// Where to look for a document when `--input` is not given
const CANDIDATES: [&str; 5] = [
    "openapi.yaml",
    "openapi.yml",
    "openapi.json",
    "spec/*.yaml",
    "spec/*.json",
];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("oas2mcp=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    // Read input
    let source = match &args.input {
        Some(path) if path.to_string_lossy() == "-" => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            buf
        }
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let path = find_document()
                .context("No OpenAPI document specified. Usage: oas2mcp -i <openapi.yaml>")?;
            info!(path = %path.display(), "using OpenAPI document");
            fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?
        }
    };

    let patterns = args
        .only
        .iter()
        .map(|p| glob::Pattern::new(p).with_context(|| format!("Invalid --only pattern {}", p)))
        .collect::<Result<Vec<_>>>()?;

    // Compile
    let config = CompilerConfig::default()
        .with_namespace(args.namespace.clone())
        .with_max_depth(args.max_depth)
        .with_body_field(args.body_field.clone());
    let mut set = compile_source(&source, &config).context("Failed to compile OpenAPI document")?;

    if !patterns.is_empty() {
        set.retain(|tool| patterns.iter().any(|p| p.matches(&tool.name)));
        if set.tools.is_empty() {
            bail!("No tools match the --only patterns");
        }
        info!(kept = set.tools.len(), "filtered tools");
    }

    let output = match (args.format, args.pretty) {
        (Format::Artifact, false) => generate_artifact(&set)?,
        (Format::Artifact, true) => generate_artifact_pretty(&set)?,
        (Format::Listing, false) => generate_listing(&set).to_string(),
        (Format::Listing, true) => serde_json::to_string_pretty(&generate_listing(&set))?,
    };

    // Write output
    match &args.output {
        Some(path) => {
            fs::write(path, &output)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), tools = set.tools.len(), "wrote tool set");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}

/// First existing file among [`CANDIDATES`]
fn find_document() -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .filter_map(|pattern| glob::glob(pattern).ok())
        .flat_map(|paths| paths.flatten())
        .find(|path| path.is_file())
}
