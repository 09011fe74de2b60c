//! Schema command implementation.

use crate::cli::SchemaArgs;
use crate::config::Config;
use crate::error::Result;
use graphweaver_extractor::{structured_prompt, Constraints, GraphSchema};
use serde_json::json;

/// Execute the schema command.
pub fn execute_schema(args: SchemaArgs, config: &Config) -> Result<()> {
    println!("{}", render_schema(&args, config)?);
    Ok(())
}

/// Render the JSON Schema a structured backend would be given.
pub fn render_schema(args: &SchemaArgs, config: &Config) -> Result<String> {
    let constraints = Constraints::from_config(&config.transformer)?;
    let schema = GraphSchema::build(&constraints, args.native_enums).to_json_schema();

    let output = if args.prompt {
        let prompt = structured_prompt(&config.transformer.additional_instructions);
        json!({
            "schema": schema,
            "prompt": prompt,
        })
    } else {
        schema
    };

    Ok(serde_json::to_string_pretty(&output)?)
}
