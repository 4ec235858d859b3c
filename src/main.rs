//! Command-line shell around the resolver.
//!
//! Results go to stdout as JSON, one document per input link; logs go to
//! stderr.

mod error;

use clap::{ArgAction, Parser, Subcommand};
use exn::ResultExt;
use reelfetch_config::Config;
use reelfetch_resolve::Resolver;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::error::{ErrorKind, Result};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML, YAML or JSON); defaults to the per-user file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More logging on stderr; repeat for more. Ignored when RUST_LOG is set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve post links into playable media.
    Resolve {
        #[arg(required = true)]
        urls: Vec<String>,

        /// Pretty-print each result.
        #[arg(long)]
        pretty: bool,
    },
    /// Print the effective configuration.
    Config,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match args.command {
        Command::Config => print(&config, true),
        Command::Resolve { urls, pretty } => {
            let resolver = Resolver::from_config(&config).or_raise(|| ErrorKind::Startup)?;
            let sweeper = resolver.spawn_sweeper();
            let mut failures = 0;
            for url in &urls {
                let result = resolver.resolve(url).await;
                if !result.success {
                    failures += 1;
                }
                print(&result, pretty)?;
            }
            sweeper.abort();
            tracing::info!(resolved = urls.len() - failures, failed = failures, "Done");
            Ok(())
        },
    }
}

fn print(value: &impl serde::Serialize, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .or_raise(|| ErrorKind::Output)?;
    writeln!(std::io::stdout().lock(), "{json}").or_raise(|| ErrorKind::Output)
}
