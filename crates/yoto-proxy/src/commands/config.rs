//! Config command - configuration inspection.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use yoto_config::LoadedConfig;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration with secrets redacted
    Show {
        /// Path to config file (overrides default discovery)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the user configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show { config } => {
            let loaded = super::load(config.as_deref())?;
            cmd_show(&loaded, ctx)
        }
        ConfigCommand::Path => cmd_path(),
    }
}

fn cmd_show(loaded: &LoadedConfig, ctx: &Context) -> Result<()> {
    let redacted = loaded.config.redacted();

    if ctx.json_output {
        let output = serde_json::json!({
            "config": redacted,
            "sources": loaded.loaded_from(),
            "env_overrides": loaded.env_overrides,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("# yoto-proxy configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    if !loaded.env_overrides.is_empty() {
        println!("Environment overrides: {}\n", loaded.env_overrides.join(", "));
    }

    print!("{}", redacted.to_toml()?);
    Ok(())
}

fn cmd_path() -> Result<()> {
    match yoto_config::user_config_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("No user configuration directory on this platform"),
    }
    Ok(())
}
