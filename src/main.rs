// MindMitra - Journal analysis and supportive chat backend
// Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use mindmitra::config::load_config;
use mindmitra::crisis::CrisisDetector;
use mindmitra::server::MindServer;

#[derive(Parser, Debug)]
#[command(name = "mindmitra")]
#[command(about = "Journal analysis and supportive chat backend", version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config.toml (default: ~/.mindmitra/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Bind address, overrides the config file
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run the offline crisis screen on a piece of text
    Screen {
        /// Text to screen
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    match args.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => run_server(args.config, bind).await,
        Command::Screen { text } => run_screen(args.config, &text),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn run_server(config_path: Option<PathBuf>, bind: Option<String>) -> Result<()> {
    let mut config = load_config(config_path.as_deref())?;
    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }

    let server = MindServer::from_config(&config)?;
    server.serve().await
}

/// Screening needs no API key, so the config file is only consulted for a
/// custom keyword list
fn run_screen(config_path: Option<PathBuf>, text: &str) -> Result<()> {
    let keywords_path = match config_path {
        Some(path) => {
            let contents = std::fs::read_to_string(&path)?;
            mindmitra::config::parse_config(&contents)?.crisis_keywords_path
        }
        None => None,
    };

    let detector = match keywords_path {
        Some(path) => CrisisDetector::load_from_file(&path)?,
        None => CrisisDetector::default(),
    };

    println!("{}", detector.detect_crisis(text));
    Ok(())
}
