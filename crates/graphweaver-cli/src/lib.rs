//! Graphweaver CLI library.
//!
//! Backs the `graphweaver` binary: argument parsing, the TOML configuration
//! file, the `extract`/`schema`/`init` commands and table or JSON rendering
//! of extracted graphs.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::{Config, OutputFormat};
pub use error::{CliError, Result};
pub use output::Formatter;
