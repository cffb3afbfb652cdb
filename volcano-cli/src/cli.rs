use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use volcano_core::{
    Collector, Config,
    provider::{expected_parameters, providers_from_config},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "volcano-aq", version, about = "Collect hourly air quality around volcanoes")]
pub struct Cli {
    /// Config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the output file path.
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every location once and write the snapshot (default).
    Collect,

    /// List configured locations and the parameters expected for each.
    Locations,

    /// Write the default configuration to the config file.
    InitConfig,
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "volcano_core=debug,info",
            _ => "trace",
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        match self.command.unwrap_or(Command::Collect) {
            Command::Collect => {
                let mut config = Config::load(self.config.as_deref())?;
                if let Some(output) = self.output {
                    config.output_path = output;
                }
                config.validate()?;

                let collector = Collector::from_config(&config)?;
                collector.run().await?;
            }
            Command::Locations => {
                let config = Config::load(self.config.as_deref())?;
                let providers = providers_from_config(&config)?;

                for loc in &config.locations {
                    println!("{:<16} {:>9.4} {:>10.4}", loc.name, loc.latitude, loc.longitude);
                }
                println!();
                for provider in &providers {
                    println!("{}: {}", provider.id(), provider.parameters().join());
                }
                println!("expected: {}", expected_parameters(&providers).join());
            }
            Command::InitConfig => {
                let path = match self.config {
                    Some(path) => path,
                    None => Config::config_file_path()?,
                };
                if path.exists() {
                    bail!("Config file already exists: {}", path.display());
                }

                Config::default()
                    .save(&path)
                    .with_context(|| format!("Failed to initialise config at {}", path.display()))?;
                println!("Wrote default config to {}", path.display());
            }
        }

        Ok(())
    }
}
