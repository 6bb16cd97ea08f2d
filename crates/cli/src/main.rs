//! chatrelay CLI: the main entry point.
//!
//! Commands:
//! - `serve`     — Start the chat server
//! - `ask`       — Put one message through the responder and print the reply
//! - `providers` — Show the provider fallback order and availability
//! - `config`    — Validate configuration or print the defaults

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "chatrelay",
    about = "chatrelay — real-time chat with an automated responder",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP/WebSocket chat server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask the assistant a single question
    Ask {
        /// The message to send
        #[arg(short, long)]
        message: String,

        /// Who is asking
        #[arg(short, long, default_value = "You")]
        sender: String,

        /// Answer even if the gate would stay quiet
        #[arg(short, long)]
        force: bool,

        /// Seed the random source for reproducible picks
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List providers in fallback order
    Providers,

    /// Validate the configuration
    Config {
        /// Print a default config file instead
        #[arg(long)]
        defaults: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Ask {
            message,
            sender,
            force,
            seed,
        } => commands::ask::run(message, sender, force, seed).await?,
        Commands::Providers => commands::providers::run().await?,
        Commands::Config { defaults } => commands::config_cmd::run(defaults).await?,
    }

    Ok(())
}
