//! Observer CLI - observer command

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli_lib::{runner, Config};
use std::path::PathBuf;
use tracing::Level;

/// Observer - run scripts when watched files change
#[derive(Parser)]
#[command(name = "observer")]
#[command(author, about, long_about = None)]
#[command(after_help = "Examples:\n  observer -w main.c -r ./run.sh\n  observer -w main.c -w 'src/*.c' -r run.sh -d 1")]
struct Cli {
    /// File or shell pattern to watch (repeatable)
    #[arg(short = 'w', long = "watch", value_name = "PATH")]
    watch: Vec<String>,

    /// Command line to run on file modification events (repeatable)
    #[arg(short = 'r', long = "run", value_name = "CMD")]
    run: Vec<String>,

    /// Buffer events for N seconds
    #[arg(short = 'd', long = "damping", value_name = "SECS")]
    damping: Option<u64>,

    /// Dump debug data
    #[arg(short = 'V', long)]
    verbose: bool,

    /// Load settings from a TOML file
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        config.merge(self.watch, self.run, self.damping, self.verbose);
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Cli::parse().into_config()?;

    if let Err(e) = config.validate() {
        eprintln!("Error: {}\n", e);
        Cli::command().print_help()?;
        std::process::exit(1);
    }

    // Initialize tracing
    let level = if config.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    runner::run(config).await
}
