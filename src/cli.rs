//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quire documentation site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Content directory path (relative to project root)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Config file name (default: quire.toml)
    #[arg(short = 'C', long, default_value = "quire.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared server arguments for Start and Serve commands
#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Interface to bind on
    #[arg(short, long)]
    pub interface: Option<String>,

    /// The port you should provide
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Init a template site
    Init {
        /// the name(path) of site directory, related to `root`
        name: Option<PathBuf>,
    },

    /// Build the site in development mode, serve it and rebuild on change
    Start {
        #[command(flatten)]
        serve_args: ServeArgs,

        /// enable watch
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },

    /// Build the static site into the output directory
    Build {
        /// Minify the html content
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        minify: Option<bool>,

        /// Include documents marked `draft: true`
        #[arg(long)]
        drafts: bool,

        /// Override the base URL path for the site.
        ///
        /// Useful for CI/CD deployments where the site lives under a project path
        /// that differs from local development, without editing quire.toml.
        ///
        /// Example: deploying to a project page (example.github.io/notes/):
        ///   quire build --base-url "/notes/"
        #[arg(long = "base-url")]
        base_url: Option<String>,
    },

    /// Remove the build cache and the output directory
    Clear,

    /// Serve a previously built output directory
    Serve {
        #[command(flatten)]
        serve_args: ServeArgs,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }
    pub const fn is_start(&self) -> bool {
        matches!(self.command, Commands::Start { .. })
    }
    pub const fn is_build(&self) -> bool {
        matches!(self.command, Commands::Build { .. })
    }
    pub const fn is_clear(&self) -> bool {
        matches!(self.command, Commands::Clear)
    }
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
}
