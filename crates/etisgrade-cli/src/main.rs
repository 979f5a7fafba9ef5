//! etisgrade CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "etisgrade", version, about = "ETIS grade scraper and analyser")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Portal login, overriding the configured one
    #[arg(long, global = true)]
    username: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the terms available on the portal
    Terms,

    /// Scrape grades, print statistics and write tables and charts
    Analyze {
        /// Analyse a single term instead of all of them
        #[arg(long)]
        term: Option<u32>,

        /// Output directory (default: output_dir from the config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the analysis as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Create a starter config
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("etisgrade=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Terms => commands::terms::execute(cli.config, cli.username).await,
        Commands::Analyze { term, output, json } => {
            commands::analyze::execute(cli.config, cli.username, term, output, json).await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
