// main.rs
mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use neuropredict::core::SortKey;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "neuropredict")]
#[command(about = "Handwriting and voice screening with a personal prediction history", long_about = None)]
struct Cli {
    /// Data directory (defaults to the user config directory)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in; any non-empty password is accepted
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out of the current session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Analyze a handwriting and/or voice sample
    Analyze {
        /// Handwriting image (.jpg, .png)
        #[arg(long)]
        handwriting: Option<PathBuf>,
        /// Voice recording (.wav, .mp3)
        #[arg(long)]
        voice: Option<PathBuf>,
        /// Write a text report to this file or directory
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// List the prediction history of the signed-in user
    Records {
        /// Match against date or prediction
        #[arg(long)]
        search: Option<String>,
        /// date or confidence
        #[arg(long, default_value = "date")]
        sort: SortKey,
    },
    /// Export the prediction history as CSV
    Export {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value = "date")]
        sort: SortKey,
        /// Output file or directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("NEUROPREDICT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let data_dir = cli.data_dir;

    match cli.command {
        Commands::Login { email, password } => cli::handle_login(email, password, data_dir).await,
        Commands::Logout => cli::handle_logout(data_dir).await,
        Commands::Whoami => cli::handle_whoami(data_dir).await,
        Commands::Analyze {
            handwriting,
            voice,
            report,
        } => cli::handle_analyze(handwriting, voice, report, data_dir).await,
        Commands::Records { search, sort } => cli::handle_records(search, sort, data_dir).await,
        Commands::Export { search, sort, out } => {
            cli::handle_export(search, sort, out, data_dir).await
        }
    }
}
