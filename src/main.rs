//! Ambient Context — demo server
//!
//! Serves a handful of pages guarded by ambient context policies, plus the
//! setup flow that lets callers without trusted claims pick a household
//! and person.
//!
//! Usage:
//!   ambient-context                                  # Default port 5080
//!   ambient-context --port 8080                      # Custom port
//!   ambient-context --identities identities.json     # Bearer token → claims table
//!   ambient-context --setup-path /Context            # Custom setup flow path

mod pages;

use std::path::PathBuf;

use ambient_server::{AmbientContextOptions, AmbientRouter, PolicyRegistry};
use ambient_transport::{IdentityTable, TransportConfig, TransportServer};
use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ambient-context", about = "Ambient context demo server")]
struct Cli {
    /// Port to listen on (0 for OS-assigned)
    #[arg(long, default_value = "5080")]
    port: u16,

    /// Hostname to bind to
    #[arg(long, default_value = "127.0.0.1")]
    hostname: String,

    /// Path of the context setup flow
    #[arg(long, default_value = "/SetupContext")]
    setup_path: String,

    /// JSON file mapping bearer tokens to identities
    #[arg(long)]
    identities: Option<PathBuf>,

    /// Enable permissive CORS
    #[arg(long)]
    cors: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Write logs to a file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if let Some(ref log_path) = cli.log_file {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating log directory {}", parent.display()))?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .with_context(|| format!("opening log file {}", log_path.display()))?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    Ok(())
}

/// Strip trailing slashes; the result must be a non-root absolute path.
fn normalize_setup_path(raw: &str) -> anyhow::Result<String> {
    anyhow::ensure!(raw.starts_with('/'), "setup path must start with '/': {raw}");
    let path = raw.trim_end_matches('/');
    anyhow::ensure!(!path.is_empty(), "setup path must not be the root path");
    Ok(path.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let identities = match &cli.identities {
        Some(path) => IdentityTable::load(path)?,
        None => IdentityTable::new(),
    };
    info!("Loaded {} identities", identities.len());

    let options = AmbientContextOptions {
        setup_path: normalize_setup_path(&cli.setup_path)?,
        ..Default::default()
    };

    let setup_path = options.setup_path.clone();
    let app = pages::register(AmbientRouter::new())
        .build(options, PolicyRegistry::with_standard_policies(), identities)
        .context("invalid ambient context configuration")?;

    let config = TransportConfig {
        port: cli.port,
        hostname: cli.hostname.clone(),
        enable_cors: cli.cors,
    };

    let mut transport = TransportServer::start(config, app).await?;

    println!();
    println!("  Ambient context server running on http://{}:{}", cli.hostname, transport.port());
    println!("  Setup flow:  {}", setup_path);
    println!("  Press Ctrl+C to stop.");
    println!();

    tokio::signal::ctrl_c().await?;

    println!();
    println!("  Shutting down...");
    transport.stop().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_path_loses_trailing_slashes() {
        assert_eq!(normalize_setup_path("/SetupContext").unwrap(), "/SetupContext");
        assert_eq!(normalize_setup_path("/Context/").unwrap(), "/Context");
        assert_eq!(normalize_setup_path("/Context//").unwrap(), "/Context");
    }

    #[test]
    fn setup_path_must_be_absolute_and_not_root() {
        assert!(normalize_setup_path("SetupContext").is_err());
        assert!(normalize_setup_path("").is_err());
        assert!(normalize_setup_path("/").is_err());
        assert!(normalize_setup_path("//").is_err());
    }
}
