// Jumper RL Control CLI
// Trains a Q-table against the game server and inspects saved tables

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use jumper_rl_agent::TrainerConfig;

mod commands;

#[derive(Parser)]
#[command(name = "jumperctl")]
#[command(about = "Jumper RL Control CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Learn online against a running game server
    Train {
        #[command(flatten)]
        common: CommonArgs,

        /// Game server host
        #[arg(long)]
        host: Option<String>,

        /// Game server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Stop after this many steps
        #[arg(long)]
        max_steps: Option<u64>,

        /// Seed for the exploration RNG
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print a saved Q-table with decoded states and greedy actions
    Inspect {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(clap::Args)]
struct CommonArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Q-table snapshot file
    #[arg(short, long)]
    snapshot: Option<PathBuf>,
}

impl CommonArgs {
    fn load(&self) -> Result<TrainerConfig> {
        let mut config = match &self.config {
            Some(path) => TrainerConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => TrainerConfig::default(),
        };
        if let Some(snapshot) = &self.snapshot {
            config.snapshot_path = snapshot.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            common,
            host,
            port,
            max_steps,
            seed,
        } => {
            let mut config = common.load()?;
            if let Some(host) = host {
                config.channel.host = host;
            }
            if let Some(port) = port {
                config.channel.port = port;
            }
            if max_steps.is_some() {
                config.max_steps = max_steps;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            config.validate().context("Invalid configuration")?;
            commands::train(config).await?;
        }

        Commands::Inspect { common } => {
            commands::inspect(&common.load()?).await?;
        }
    }

    Ok(())
}
