//! livebuild CLI - monitor, compile and reload
//!
//! Usage: livebuild [OPTIONS] SOURCE[:COMPILED]...
//!
//! Sources are compiled at startup when stale, then monitored until Ctrl-C.
//! Each update recompiles the file and reloads the browser.

mod cli;
mod commands;
mod ui;

use std::env;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    debug!("livebuild v{} starting", env!("CARGO_PKG_VERSION"));
    commands::run::cmd_run(&cli)
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => env::var("LIVEBUILD_LOG").unwrap_or_else(|_| "warn".to_string()),
            1 => "info".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let mut filter = EnvFilter::from_default_env();
    if env::var("RUST_LOG").is_err() {
        match format!("livebuild={}", level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(_) => eprintln!("Invalid log level '{}', using the default", level),
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
