//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use graphweaver_domain::{Document, GraphResult, ModelBackend};
use graphweaver_extractor::{
    ExtractorError, GraphTransformer, RelationshipRule, TransformerConfig,
};
use graphweaver_llm::OllamaBackend;
use std::fmt::Display;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Path that stands for standard input.
const STDIN_PATH: &str = "-";

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let documents = load_documents(&args.files)?;
    let transformer_config = transformer_config(&args, config);

    let endpoint = args.endpoint.as_deref().unwrap_or(&config.model.endpoint);
    let model = args.model.as_deref().unwrap_or(&config.model.model);
    info!("Using Ollama model {} at {}", model, endpoint);

    let backend = OllamaBackend::new(endpoint, model)
        .with_max_retries(config.model.max_retries)
        .with_timeout(Duration::from_secs(config.model.timeout_secs));
    let transformer = GraphTransformer::new(backend, transformer_config)?;

    let results = run(&transformer, &documents, args.sequential).await;
    println!("{}", formatter.format_results(&documents, &results)?);

    check_failures(&results)
}

/// Read every input file into a document whose id is its path.
pub fn load_documents(files: &[PathBuf]) -> Result<Vec<Document>> {
    files
        .iter()
        .map(|path| -> Result<Document> {
            let text = if path.as_os_str() == STDIN_PATH {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                buffer
            } else {
                fs::read_to_string(path).map_err(|e| {
                    CliError::InvalidInput(format!("Cannot read '{}': {}", path.display(), e))
                })?
            };
            let id = path.display().to_string();
            Ok(Document::with_id(id.clone(), text).with_metadata("path", id))
        })
        .collect()
}

/// Overlay command-line allow-lists and switches on the configured transformer settings.
pub fn transformer_config(args: &ExtractArgs, config: &Config) -> TransformerConfig {
    let mut transformer = config.transformer.clone();

    if !args.allowed_nodes.is_empty() {
        transformer = transformer.with_allowed_nodes(args.allowed_nodes.iter().map(|s| s.trim()));
    }
    if !args.allowed_relationships.is_empty() {
        transformer = transformer.with_allowed_relationships(
            args.allowed_relationships
                .iter()
                .map(|rule| parse_relationship_rule(rule)),
        );
    }
    if args.no_strict {
        transformer = transformer.with_strict_mode(false);
    }
    if args.ignore_tool_usage {
        transformer = transformer.with_ignore_tool_usage(true);
    }

    transformer
}

/// Parse `WORKS_FOR` or `Person:WORKS_FOR:Company`.
pub fn parse_relationship_rule(rule: &str) -> RelationshipRule {
    let parts: Vec<&str> = rule.split(':').map(str::trim).collect();
    match parts.as_slice() {
        [source, relation, target] => RelationshipRule::triple(*source, *relation, *target),
        _ => RelationshipRule::Type(rule.trim().to_string()),
    }
}

/// Run the batch in the requested order mode.
pub async fn run<B>(
    transformer: &GraphTransformer<B>,
    documents: &[Document],
    sequential: bool,
) -> Vec<std::result::Result<GraphResult, ExtractorError>>
where
    B: ModelBackend + Sync,
    B::Error: Display,
{
    if sequential {
        transformer.convert_documents(documents).await
    } else {
        transformer.convert_documents_concurrent(documents).await
    }
}

/// Turn per-document failures into a non-zero exit.
pub fn check_failures(results: &[std::result::Result<GraphResult, ExtractorError>]) -> Result<()> {
    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed == 0 {
        return Ok(());
    }
    warn!("{} of {} document(s) failed", failed, results.len());
    Err(CliError::PartialFailure(failed, results.len()))
}
