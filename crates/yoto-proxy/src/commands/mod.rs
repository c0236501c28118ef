//! CLI command handlers.

pub mod config;
pub mod start;

use std::path::Path;

use anyhow::Result;
use yoto_config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Load an explicit file, or discover the layered configuration.
pub fn load(config_path: Option<&Path>) -> Result<LoadedConfig> {
    let loaded = match config_path {
        Some(path) => yoto_config::load_explicit(path)?,
        None => yoto_config::load_config(None)?,
    };

    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }

    Ok(loaded)
}
