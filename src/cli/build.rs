//! Build command implementation

use std::time::Instant;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::compiler::Compiler;
use crate::config::Config;
use crate::utils::format_size;

/// Build all configured entry points
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Configuration overrides as key=value pairs (e.g. output.path=build)
    #[arg(value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Print the compilation stats as JSON after the build
    #[arg(long)]
    pub json: bool,
}

impl BuildCommand {
    pub fn execute(&self, config_path: &str) -> Result<()> {
        let start = Instant::now();

        info!("loading configuration from {}", config_path);
        let mut config = Config::load(config_path)?;
        config.apply_overrides(self.overrides.iter().map(String::as_str))?;

        eprintln!("{} Building project...", "→".blue());

        let mut compiler = Compiler::new(config)?;
        let stats = compiler.run()?;

        eprintln!(
            "\n{} Built {} bundle(s) in {:.2}s\n",
            "✓".green().bold(),
            stats.assets.len(),
            start.elapsed().as_secs_f64()
        );

        let output_dir = compiler.output_dir();
        for (file_name, code) in &stats.assets {
            eprintln!(
                "  {} {} {}",
                "•".dimmed(),
                output_dir.join(file_name).display().to_string().cyan(),
                format_size(code.len()).dimmed()
            );
        }
        eprintln!();

        if self.json {
            println!("{}", stats.to_json()?);
        }

        Ok(())
    }
}
