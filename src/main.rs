//! pfrule - render packet filter rules as configuration text
//!
//! # Usage
//!
//! ```bash
//! pfrule render rules.json             # Print one configuration line per rule
//! pfrule render rules.json --no-system-protocols
//! pfrule protocols                     # List known protocol names
//! ```

use clap::{Parser, Subcommand};
use pfrule::RuleSet;
use pfrule::config::{self, AppConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "pfrule")]
#[command(about = "Render packet filter rules as configuration text", long_about = None)]
struct Cli {
    /// Configuration file (default: XDG config dir)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Protocol database overriding the configured one
    #[arg(long, global = true, value_name = "FILE")]
    protocols: Option<PathBuf>,
    /// Use only the built-in protocol names
    #[arg(long, global = true)]
    no_system_protocols: bool,
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a JSON rule set document
    Render {
        /// Rule set document
        file: PathBuf,
    },
    /// List the protocol name table
    Protocols,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> pfrule::Result<()> {
    let mut app_config: AppConfig = config::load_config(cli.config.as_deref())?;
    if let Some(path) = cli.protocols {
        app_config.protocols_file = path;
    }
    if cli.no_system_protocols {
        app_config.load_system_protocols = false;
    }
    let protocols = app_config.protocol_table();

    match cli.command {
        Commands::Render { file } => {
            let ruleset = RuleSet::load(&file)?;
            tracing::debug!("Rendering {} rules from {}", ruleset.rules.len(), file.display());
            let text = ruleset.to_pf_conf(&protocols)?;
            if !text.is_empty() {
                println!("{text}");
            }
        }
        Commands::Protocols => {
            for (proto, name) in protocols.iter() {
                println!("{:>3}  {name}", proto.0);
            }
        }
    }
    Ok(())
}
