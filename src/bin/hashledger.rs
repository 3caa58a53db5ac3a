#![forbid(unsafe_code)]
//! Interactive shell for a single in-memory ledger.

use clap::Parser;
use colored::*;
use hashledger::cli::Shell;
use hashledger::config::{load_config, DEFAULT_CONFIG_PATH};
use hashledger::Ledger;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hashledger", version, about = "Proof-of-work ledger shell")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Require this many leading zero bytes in every block hash
    #[arg(long, conflicts_with = "zero_bits")]
    zero_bytes: Option<usize>,

    /// Require this many leading zero bits in every block hash
    #[arg(long)]
    zero_bits: Option<u32>,

    /// Give up mining after this long (e.g. "30s", "2m")
    #[arg(long)]
    timeout: Option<String>,

    /// Give up mining after this many nonces
    #[arg(long)]
    max_attempts: Option<u64>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(bytes) = args.zero_bytes {
        config.validator.zero_bytes = bytes;
        config.validator.zero_bits = None;
    }
    if let Some(bits) = args.zero_bits {
        config.validator.zero_bits = Some(bits);
    }
    if args.timeout.is_some() {
        config.miner.timeout = args.timeout;
    }
    if args.max_attempts.is_some() {
        config.miner.max_attempts = args.max_attempts;
    }
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let interactive = io::stdout().is_terminal();
    let color = interactive && !args.no_color;
    if !color {
        colored::control::set_override(false);
    }

    println!("{}", "hashledger".bright_cyan().bold());
    println!(
        "{} {}",
        "Validator:".bright_green(),
        config.validator.describe().bright_white()
    );

    let started = Instant::now();
    let ledger = Ledger::with_control(config.validator.build(), &config.miner.control()?)?;
    info!(elapsed = ?started.elapsed(), "ledger ready");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut shell = Shell::new(ledger, stdin.lock(), stdout.lock())
        .with_miner(config.miner.clone())
        .with_color(color)
        .with_progress(interactive);
    shell.run()?;

    Ok(())
}
