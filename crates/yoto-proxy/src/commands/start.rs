//! Start command - launches the proxy server.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use yoto_config::ProxyConfig;
use yoto_server::{Server, ServerConfig};

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file and environment values.
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to, `host` or `host:port` (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Use the deployment's own OAuth client for every user
    #[arg(long)]
    pub use_env_credentials: bool,

    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    let mut loaded = super::load(args.config.as_deref())?;

    if ctx.verbose {
        let sources = loaded.loaded_from();
        if sources.is_empty() {
            println!("No config files found, using defaults + environment + CLI args");
        }
        for source in sources {
            println!("Loaded config: {}", source.display());
        }
        for var in &loaded.env_overrides {
            println!("Environment override: {}", var);
        }
    }

    apply_cli_overrides(&mut loaded.config, &args)?;
    let config = ServerConfig::from_proxy_config(&loaded.config)?;

    let mode = if config.credentials.use_env_credentials {
        "server credentials"
    } else {
        "caller credentials"
    };
    println!("Bind address: {}", config.bind_address);
    println!("Credential mode: {}", mode);

    let addr = config.bind_address;
    Server::new(config)?
        .run_with_shutdown(addr, shutdown_signal())
        .await?;

    Ok(())
}

/// Fold `--bind`, `--port` and `--use-env-credentials` into the loaded config.
fn apply_cli_overrides(config: &mut ProxyConfig, args: &StartArgs) -> Result<()> {
    let mut addr = config.server.bind_address()?;

    if let Some(bind) = &args.bind {
        addr = match bind.parse::<SocketAddr>() {
            Ok(full) => full,
            Err(_) => {
                let ip: IpAddr = bind
                    .parse()
                    .with_context(|| format!("invalid bind address: {}", bind))?;
                SocketAddr::new(ip, addr.port())
            }
        };
    }
    if let Some(port) = args.port {
        addr.set_port(port);
    }
    config.server.bind = Some(addr.to_string());

    if args.use_env_credentials {
        config.yoto.use_env_credentials = Some(true);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
