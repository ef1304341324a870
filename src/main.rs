use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use schemaforge::sink::FileSink;
use schemaforge::sql::Dialect;
use schemaforge::workspace::{Report, Workspace, WorkspaceConfig};

/// Log level options
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    /// Only errors
    Error,
    /// Warnings and errors
    Warn,
    /// Info, warnings, and errors
    Info,
    /// Debug messages and above
    Debug,
    /// Everything
    Trace,
    /// Disable all logging
    Off,
}

impl LogLevel {
    fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// SchemaForge - SQL schema import, inspection and export
#[derive(Parser)]
#[command(name = "schemaforge")]
#[command(version)]
struct Cli {
    /// Input dialect (standard, postgresql, mysql, cockroachdb, sqlite); guessed when omitted
    #[arg(short, long, global = true)]
    dialect: Option<String>,

    /// Set log level
    #[arg(short = 'l', long = "log-level", global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print tables, relationships and skipped clauses as JSON
    Inspect {
        /// SQL file to read
        input: PathBuf,
    },

    /// Parse a SQL file and write it back out as schema.sql
    Convert {
        /// SQL file to read
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Output dialect (default: the input dialect)
        #[arg(long)]
        to: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.to_level_filter())
        .init();

    if let Err(message) = run(cli) {
        eprintln!("{}", message);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Inspect { input } => {
            let loaded = load(&input, cli.dialect.as_deref())?;
            println!("{}", loaded.report);
            Ok(())
        }
        Commands::Convert { input, output, to } => {
            let mut loaded = load(&input, cli.dialect.as_deref())?;
            if let Some(to) = to {
                loaded.workspace.set_dialect(parse_dialect(&to)?);
            }
            let mut sink = FileSink::new(&output);
            loaded
                .workspace
                .export(&mut sink, chrono::Utc::now())
                .map_err(|e| e.to_string())?;
            Ok(())
        }
    }
}

struct Loaded {
    workspace: Workspace,
    /// Pretty JSON report
    report: String,
}

fn parse_dialect(name: &str) -> Result<Dialect, String> {
    Dialect::from_str(name).ok_or_else(|| format!("Invalid dialect: {}", name))
}

fn load(path: &Path, dialect: Option<&str>) -> Result<Loaded, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let dialect = match dialect {
        Some(name) => parse_dialect(name)?,
        None => Dialect::detect(&text),
    };
    log::info!("reading {} as {}", path.display(), dialect);

    let mut workspace = Workspace::new(WorkspaceConfig {
        dialect,
        ..Default::default()
    });
    let summary = workspace
        .import(&text)
        .map_err(|e| format!("Failed to import {}: {}", path.display(), e))?;

    let report = serde_json::to_string_pretty(&Report::new(workspace.model(), &summary.diagnostics))
        .map_err(|e| e.to_string())?;

    Ok(Loaded { workspace, report })
}
