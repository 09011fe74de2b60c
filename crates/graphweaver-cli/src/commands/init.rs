//! Init command implementation.

use crate::cli::InitArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::PathBuf;

/// Execute the init command.
pub fn execute_init(args: InitArgs, formatter: &Formatter) -> Result<()> {
    let path = write_default_config(args)?;
    println!(
        "{}",
        formatter.success(&format!("Wrote configuration to {}", path.display()))
    );
    Ok(())
}

/// Write the default configuration, refusing to clobber an existing file without `--force`.
pub fn write_default_config(args: InitArgs) -> Result<PathBuf> {
    let path = match args.path {
        Some(path) => path,
        None => Config::path()?,
    };

    if path.exists() && !args.force {
        return Err(CliError::InvalidInput(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save(&path)?;
    Ok(path)
}
