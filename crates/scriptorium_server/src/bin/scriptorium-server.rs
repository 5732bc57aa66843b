//! Scriptorium server binary.

use anyhow::Result;
use clap::Parser;
use scriptorium_server::{ScriptoriumConfig, init_logging, serve};
use std::path::PathBuf;
use tracing::info;

/// Command-line arguments for the Scriptorium server.
#[derive(Parser, Debug)]
#[command(name = "scriptorium-server")]
#[command(about = "Scriptorium - marketing script generation and selection")]
#[command(version)]
struct Args {
    /// Configuration file layered over the defaults
    #[arg(short, long, env = "SCRIPTORIUM_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding server.bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the configuration and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ScriptoriumConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config = config.with_bind(bind);
        config.validate()?;
    }

    init_logging(config.logging())?;
    info!(config_file = ?args.config, "Configuration loaded");

    if args.check_config {
        println!("Configuration OK");
        println!("  bind:      {}", config.server().bind());
        println!("  builder:   {}", config.generation().builder());
        println!("  store:     {}", config.storage().store);
        println!(
            "  variants:  default {}, max {}",
            config.pipeline().default_variant_count(),
            config.pipeline().max_variant_count()
        );
        println!("  timeout:   {:?}", config.pipeline().generation_timeout());
        return Ok(());
    }

    serve(&config).await?;
    Ok(())
}
