//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Graphweaver CLI - Extract typed knowledge graphs from text with an LLM.
#[derive(Debug, Parser)]
#[command(name = "graphweaver")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "GRAPHWEAVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter (e.g. "info", "graphweaver_extractor=debug")
    #[arg(long, global = true, env = "GRAPHWEAVER_LOG", default_value = "info")]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract graphs from text files
    Extract(ExtractArgs),

    /// Print the output schema and prompt for the current configuration
    Schema(SchemaArgs),

    /// Write a default configuration file
    Init(InitArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Text files to process ("-" reads stdin)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Ollama model name
    #[arg(short, long, env = "GRAPHWEAVER_MODEL")]
    pub model: Option<String>,

    /// Ollama endpoint URL
    #[arg(short, long, env = "OLLAMA_HOST")]
    pub endpoint: Option<String>,

    /// Allowed node types (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub allowed_nodes: Vec<String>,

    /// Allowed relationship types (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub allowed_relationships: Vec<String>,

    /// Keep results that fall outside the allow-lists
    #[arg(long)]
    pub no_strict: bool,

    /// Ask for JSON text instead of schema-bound structured output
    #[arg(long)]
    pub ignore_tool_usage: bool,

    /// Process files one after another instead of concurrently
    #[arg(long)]
    pub sequential: bool,
}

/// Arguments for the schema command.
#[derive(Debug, Parser)]
pub struct SchemaArgs {
    /// Emit enum constraints natively, as for an "openai-chat" backend
    #[arg(long)]
    pub native_enums: bool,

    /// Also print the structured-mode prompt template
    #[arg(long)]
    pub prompt: bool,
}

/// Arguments for the init command.
#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Where to write the file (defaults to ~/.graphweaver/config.toml)
    pub path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}
