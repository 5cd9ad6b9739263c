//! Command-line interface
//!
//! A single `build` subcommand: load configuration, merge `key=value`
//! overrides, run the compiler, print a summary.

mod build;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use build::BuildCommand;

/// Packlet - a minimal JavaScript module bundler
#[derive(Parser, Debug)]
#[command(name = "packlet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to packlet.toml config file
    #[arg(short, long, global = true, default_value = "packlet.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build all configured entry points
    Build(BuildCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Build(cmd) => cmd.execute(&self.config),
        }
    }
}
