//! Quire - a static documentation site generator for markdown notes.

mod build;
mod clear;
mod cli;
mod config;
mod content;
mod emit;
mod error;
mod generator;
mod init;
mod logger;
mod nav;
mod render;
mod search;
mod serve;
mod utils;
mod watch;

use anyhow::{Result, bail};
use build::{BuildSummary, Mode, build_site};
use clap::Parser;
use clear::clear_site;
use cli::{Cli, Commands};
use config::{SiteConfig, cfg, init_config};
use init::new_site;
use serve::serve_site;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config = load_config(cli)?;

    match &cli.command {
        Commands::Init { name } => new_site(&config, name.is_some()),
        Commands::Build { .. } => {
            let summary = build_site(&config, Mode::Production)?;
            report(&summary);
            summary.ensure_success()
        }
        Commands::Start { .. } => {
            init_config(config);
            let summary = build_site(&cfg(), Mode::Development)?;
            report(&summary);
            serve_site(true)
        }
        Commands::Clear => clear_site(&config).map(|_| ()),
        Commands::Serve { .. } => {
            if !config.build.output.is_dir() {
                bail!(
                    "`{}` does not exist. Run `quire build` first.",
                    config.build.output.display()
                );
            }
            init_config(config);
            serve_site(false)
        }
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &'static Cli) -> Result<SiteConfig> {
    let config = SiteConfig::load(cli)?;

    // Validate config state based on command
    let config_exists = config.config_path.exists();
    match (cli.is_init(), config_exists) {
        (true, true) => {
            bail!("Config file already exists. Remove it manually or init in a different path.")
        }
        (false, false) => bail!(
            "Config file `{}` not found. Run `quire init` to create a site.",
            config.config_path.display()
        ),
        _ => {}
    }

    if !cli.is_init() {
        config.validate()?;
    }

    Ok(config)
}

fn report(summary: &BuildSummary) {
    if !summary.warnings.is_empty() {
        log!("build"; "{} warning(s)", summary.warnings.len());
    }
    if !summary.failed.is_empty() {
        log!("error"; "{} document(s) failed", summary.failed.len());
    }
}
