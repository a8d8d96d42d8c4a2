//! byond-topic - Command-line client for BYOND world topics
//!
//! Provides both a REPL and one-shot command execution.

mod commands;
mod repl;

use byond_topic_client::{Client, ClientConfig, ReadStrategy, ResponseKind, ServerAddress};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "byond-topic")]
#[command(about = "Send topics to BYOND game servers and print their replies")]
#[command(version)]
struct Cli {
    /// Server address (host:port)
    #[arg(short, long, env = "BYOND_TOPIC_SERVER")]
    server: Option<ServerAddress>,

    /// YAML config file
    #[arg(short, long, env = "BYOND_TOPIC_CONFIG")]
    config: Option<PathBuf>,

    /// Read timeout in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// How the end of a reply is detected (until_timeout, declared_length)
    #[arg(long)]
    strategy: Option<ReadStrategy>,

    /// Print replies as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Start interactive REPL
    Repl,

    /// Send a topic and print the reply
    Send {
        /// Topic, e.g. "status" or "?ping&key=value"
        topic: String,

        /// Expected reply kind (any, float, string, none)
        #[arg(short, long, default_value = "any")]
        expect: ResponseKind,
    },

    /// Send a topic without waiting for a reply
    Command {
        /// Topic to send
        topic: String,
    },

    /// Print the request frame for a topic as hex
    Encode {
        /// Topic to encode
        topic: String,
    },

    /// Decode a reply frame given as hex
    Decode {
        /// Reply bytes, e.g. "0083 0005 2a 0000b841"
        hex: String,
    },
}

fn load_config(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = ClientConfig::load_layered(cli.config.as_deref())?;
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    if let Some(server) = &cli.server {
        config.server = Some(server.clone());
    }
    if let Some(ms) = cli.timeout_ms {
        config.read_timeout_ms = ms;
    }
    if let Some(strategy) = cli.strategy {
        config.read_strategy = strategy;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Repl) | None => {
            let Some(server) = config.server.clone() else {
                eprintln!(
                    "{}: no server given, use --server host:port or BYOND_TOPIC_SERVER",
                    "Error".red()
                );
                std::process::exit(1);
            };
            repl::run(Client::new(config), server, cli.json).await?;
        }
        Some(cmd) => {
            let client = Client::new(config);
            match commands::execute(&client, cmd, cli.json).await {
                Ok(output) => println!("{}", output),
                Err(e) => {
                    eprintln!("{}: {}", "Error".red(), e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
