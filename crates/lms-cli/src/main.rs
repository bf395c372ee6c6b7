//! # lms CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Store-backed commands open the datastore selected by `LMS_STORE`.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lms_cli::certificate::{run_issue, run_key, run_validate, IssueArgs, KeyArgs, ValidateArgs};
use lms_cli::course::{run_course, CourseArgs};
use lms_core::{Clock, SystemClock};
use lms_store::{Datastore, StoreConfig};

/// LMS operator CLI.
///
/// Derives certificate keys, issues and validates certificates, and manages
/// courses against the configured datastore.
#[derive(Parser, Debug)]
#[command(name = "lms", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Derive the key a certificate would receive, without storing it.
    Key(KeyArgs),

    /// Issue a certificate.
    Issue(IssueArgs),

    /// Check whether a certificate key exists.
    Validate(ValidateArgs),

    /// Create or list courses.
    Course(CourseArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Key(args) => run_key(&args, clock.as_ref(), cli.json, &mut stdout),
        Commands::Issue(args) => run_issue(&args, open_store().await?, clock, cli.json, &mut stdout).await,
        Commands::Validate(args) => run_validate(&args, open_store().await?, cli.json, &mut stdout).await,
        Commands::Course(args) => run_course(&args, open_store().await?, clock, cli.json, &mut stdout).await,
    }
}

async fn open_store() -> Result<Arc<dyn Datastore>> {
    let config = StoreConfig::from_env().context("datastore configuration is invalid")?;
    tracing::debug!(backend = config.backend_name(), "opening datastore");
    lms_store::connect(config)
        .await
        .context("datastore could not be opened")
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
