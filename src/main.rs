use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chatrelay::config::Settings;

mod cmd;

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(version, about = "Chat with a hosted LLM from the terminal or the browser")]
pub struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a chatrelay.toml (defaults to ./chatrelay.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive chat in the terminal
    Chat,
    /// Run the relay server and browser client
    Serve {
        /// Port to listen on (overrides PORT and the config file)
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,

        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Allow cross-origin requests (browser client hosted elsewhere)
        #[arg(long)]
        cors: bool,

        /// Open the browser client once the server is up
        #[arg(long)]
        open: bool,
    },
    /// Terminal client for a running relay server
    Connect {
        /// Relay base URL (overrides CHATRELAY_SERVER_URL and the config file)
        #[arg(long)]
        server_url: Option<String>,

        /// Milliseconds per revealed character
        #[arg(long)]
        reveal_ms: Option<u64>,
    },
    /// View or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Write a default chatrelay.toml in the current directory
    Init,
}

fn init_tracing(verbose: bool, default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "chatrelay=debug".to_string()
        } else {
            format!("chatrelay={}", default_level)
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env file is fine; variables may come from the environment.
    let _ = dotenvy::dotenv();

    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    init_tracing(cli.verbose, default_level);

    let settings = Settings::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Chat => cmd::cmd_chat(&settings).await?,
        Commands::Serve {
            port,
            host,
            cors,
            open,
        } => {
            cmd::cmd_serve(settings, *port, host.clone(), *cors, *open).await?;
        }
        Commands::Connect {
            server_url,
            reveal_ms,
        } => {
            cmd::cmd_connect(&settings, server_url.clone(), *reveal_ms).await?;
        }
        Commands::Config { command } => cmd::cmd_config(&settings, command.clone())?,
    }

    Ok(())
}
