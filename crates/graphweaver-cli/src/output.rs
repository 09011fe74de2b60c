//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use graphweaver_domain::{Document, GraphResult, NodeSpec};
use graphweaver_extractor::ExtractorError;
use serde_json::json;
use std::collections::BTreeMap;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format one extraction outcome per document, in input order.
    pub fn format_results(
        &self,
        documents: &[Document],
        results: &[std::result::Result<GraphResult, ExtractorError>],
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_results_json(documents, results),
            OutputFormat::Table => Ok(self.format_results_table(documents, results)),
        }
    }

    fn format_results_json(
        &self,
        documents: &[Document],
        results: &[std::result::Result<GraphResult, ExtractorError>],
    ) -> Result<String> {
        let entries: Vec<serde_json::Value> = documents
            .iter()
            .zip(results)
            .map(|(document, result)| match result {
                Ok(graph) => json!({
                    "document": document.id,
                    "nodes": graph.nodes(),
                    "relationships": graph.relationships(),
                }),
                Err(e) => json!({
                    "document": document.id,
                    "error": e.to_string(),
                }),
            })
            .collect();

        Ok(serde_json::to_string_pretty(&entries)?)
    }

    fn format_results_table(
        &self,
        documents: &[Document],
        results: &[std::result::Result<GraphResult, ExtractorError>],
    ) -> String {
        let mut sections = Vec::with_capacity(results.len());

        for (document, result) in documents.iter().zip(results) {
            let heading = self.colorize(&document.id, "cyan");
            let body = match result {
                Ok(graph) if graph.is_empty() => self.warning("No nodes or relationships found."),
                Ok(graph) => self.format_graph_table(graph),
                Err(e) => self.error(&e.to_string()),
            };
            sections.push(format!("{}\n{}", heading, body));
        }

        sections.join("\n\n")
    }

    /// Render the nodes and relationships of one graph as two tables.
    pub fn format_graph_table(&self, graph: &GraphResult) -> String {
        let mut nodes = Builder::default();
        nodes.push_record(["ID", "Type", "Properties"]);
        for node in graph.nodes() {
            nodes.push_record([
                node.id.clone(),
                node.node_type.clone(),
                format_properties(&node.properties),
            ]);
        }

        let mut output = render(nodes);

        if !graph.relationships().is_empty() {
            let mut relationships = Builder::default();
            relationships.push_record(["Source", "Type", "Target", "Properties"]);
            for rel in graph.relationships() {
                relationships.push_record([
                    endpoint(&rel.source),
                    rel.rel_type.clone(),
                    endpoint(&rel.target),
                    format_properties(&rel.properties),
                ]);
            }
            output.push('\n');
            output.push_str(&render(relationships));
        }

        output
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().bold().to_string(),
            _ => text.to_string(),
        }
    }
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn endpoint(node: &NodeSpec) -> String {
    format!("{} ({})", node.id, node.node_type)
}

fn format_properties(properties: &BTreeMap<String, String>) -> String {
    properties
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphweaver_domain::RelationshipSpec;

    fn sample() -> (Document, GraphResult) {
        let document = Document::with_id("doc-1", "Adam works for Microsoft.");
        let adam = NodeSpec::new("Adam", "Person").unwrap();
        let microsoft = NodeSpec::new("Microsoft", "Company").unwrap();
        let works = RelationshipSpec::new(adam.clone(), microsoft.clone(), "WORKS_FOR")
            .unwrap()
            .with_properties(BTreeMap::from([("startDate".to_string(), "2009".to_string())]));
        let graph = GraphResult::new(vec![adam, microsoft], vec![works], document.clone());
        (document, graph)
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let (document, graph) = sample();
        let output = formatter.format_results(&[document], &[Ok(graph)]).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["document"], "doc-1");
        assert_eq!(parsed[0]["nodes"][0]["id"], "Adam");
        assert_eq!(parsed[0]["relationships"][0]["type"], "WORKS_FOR");
    }

    #[test]
    fn test_json_format_reports_errors() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let document = Document::with_id("doc-2", "text");
        let output = formatter
            .format_results(&[document], &[Err(ExtractorError::Llm("timeout".into()))])
            .unwrap();

        assert!(output.contains("\"error\""));
        assert!(output.contains("timeout"));
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let (document, graph) = sample();
        let output = formatter.format_results(&[document], &[Ok(graph)]).unwrap();

        assert!(output.starts_with("doc-1"));
        assert!(output.contains("Adam (Person)"));
        assert!(output.contains("startDate=2009"));
    }

    #[test]
    fn test_empty_graph() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let document = Document::with_id("doc-3", "nothing here");
        let graph = GraphResult::empty(document.clone());
        let output = formatter.format_results(&[document], &[Ok(graph)]).unwrap();
        assert!(output.contains("No nodes or relationships found"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let msg = formatter.success("test");
        assert_eq!(msg, "✓ test");
    }
}
