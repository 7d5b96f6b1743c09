//! Hangar Command-Line Interface
//!
//! An interactive shell and script runner over an in-memory Hangar
//! database.
//!
//! # Usage
//!
//! ```bash
//! # Start interactive REPL with the booking platform schema
//! hangar --bootstrap
//!
//! # Execute a single statement
//! hangar -c "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)"
//!
//! # Execute statements from a file
//! hangar -f seed.sql
//!
//! # Output as JSON
//! hangar -o json -f seed.sql
//!
//! # Write the effective settings to a config file
//! hangar --strict --save-config ~/.config/hangar/config.toml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use hangar_db::DatabaseConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod formatter;
mod repl;

use config::CliConfig;
use formatter::OutputFormat;
use repl::Repl;

/// Hangar command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "hangar",
    author = "Hangar Team",
    version,
    about = "Shell for the Hangar in-memory statement engine",
    long_about = "An interactive shell for the Hangar in-memory statement engine.\n\n\
                  Use this tool to try statements against a fresh database, run\n\
                  seed scripts and inspect the booking platform schema."
)]
struct Args {
    /// Execute a single statement and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Execute statements from file and exit
    #[arg(short = 'f', long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, env = "HANGAR_OUTPUT")]
    output: Option<OutputFormatArg>,

    /// Create the booking platform relations before anything else runs
    #[arg(short = 'b', long)]
    bootstrap: bool,

    /// Reject unsupported statements, report true update counts and
    /// enforce UNIQUE columns
    #[arg(long)]
    strict: bool,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Suppress banner (for scripting)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE", env = "HANGAR_CONFIG")]
    config: Option<PathBuf>,

    /// Write the effective configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    save_config: Option<PathBuf>,
}

/// Output format argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Display results in a formatted table
    Table,
    /// Display results as JSON
    Json,
    /// Display results as CSV
    Csv,
    /// Display raw values
    Raw,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Raw => OutputFormat::Raw,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    execute(&args)
}

fn execute(args: &Args) -> Result<()> {
    let config = load_config(args)?;

    if let Some(path) = &args.save_config {
        config.save(path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let format = output_format(args, &config)?;
    let mut repl = Repl::new(config, format)?;

    if let Some(command) = &args.command {
        info!("Executing command: {}", command);
        repl.run_script(command)?;
        Ok(())
    } else if let Some(file) = &args.file {
        info!("Executing file: {}", file.display());
        let content = std::fs::read_to_string(file)?;
        repl.run_script(&content)?;
        Ok(())
    } else {
        if !args.quiet {
            repl.print_banner();
        }
        repl.run()
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("hangar=debug,hangar_db=debug,hangar_sql=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("hangar=warn,hangar_db=warn,hangar_sql=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn load_config(args: &Args) -> Result<CliConfig> {
    let mut config = if let Some(path) = &args.config {
        CliConfig::from_file(path)?
    } else {
        CliConfig::load_default()?
    };

    if args.strict {
        config.database = DatabaseConfig {
            statement_logging: config.database.statement_logging,
            slow_statement_threshold_ms: config.database.slow_statement_threshold_ms,
            ..DatabaseConfig::strict()
        };
    }
    if args.bootstrap {
        config.bootstrap = true;
    }

    Ok(config)
}

fn output_format(args: &Args, config: &CliConfig) -> Result<OutputFormat> {
    match args.output {
        Some(arg) => Ok(arg.into()),
        None => config
            .output_format
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e)),
    }
}
