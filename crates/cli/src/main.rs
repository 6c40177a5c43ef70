//! EduPilot CLI: the main entry point.
//!
//! Commands:
//! - `onboard`  Create the config directory and a default config
//! - `chat`     Interactive or single-message chat with context
//! - `serve`    Start the HTTP gateway for the dashboard
//! - `profile`  Inspect or seed profile records
//! - `config`   Show, locate or validate the configuration
//! - `doctor`   Diagnose setup problems

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "edupilot",
    about = "EduPilot: a context-grounded academic assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config directory and a default config file
    Onboard,

    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// JSON file holding the academic record to ground answers in
        #[arg(short, long)]
        context: Option<PathBuf>,

        /// Read the academic record for this user from the profile store
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage profile records
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Diagnose system health
    Doctor,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Print a stored record and the context block built from it
    Show { user_id: String },

    /// Store a record read from a JSON file
    Put { user_id: String, file: PathBuf },

    /// Delete a stored record
    Remove { user_id: String },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration (keys redacted)
    Show,
    /// Print the config file path
    Path,
    /// Validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat {
            message,
            context,
            user,
        } => commands::chat::run(message, context, user).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Profile { command } => match command {
            ProfileCommands::Show { user_id } => commands::profile::show(&user_id).await?,
            ProfileCommands::Put { user_id, file } => {
                commands::profile::put(&user_id, &file).await?
            }
            ProfileCommands::Remove { user_id } => commands::profile::remove(&user_id).await?,
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config_cmd::show().await?,
            ConfigCommands::Path => commands::config_cmd::path().await?,
            ConfigCommands::Validate => commands::config_cmd::validate().await?,
        },
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
