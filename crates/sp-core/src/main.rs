//! Survey pipeline publishing CLI.
//!
//! Thin operator surface over the publishing engine: staging
//! validation, atomic publish, rollback, status, and publication
//! history. stdout carries the command payload; logs go to stderr.

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

use sp_common::{OutputFormat, RunTimestamp};
use sp_config::{ConfigResolver, ConfigSnapshot};
use sp_core::exit_codes::ExitCode;
use sp_core::logging::{init_logging, LogFormat};
use sp_publish::{PublishEngine, PublishError};

/// Survey pipeline - atomic publication of cleaned survey data
#[derive(Parser)]
#[command(name = "sp-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to pipeline config file (default: <project-root>/pipeline.json)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Project root containing the staging and stable directories
    #[arg(long, global = true, default_value = ".", env = "SURVEY_PIPELINE_ROOT")]
    project_root: PathBuf,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log output format on stderr
    #[arg(long, global = true, default_value = "human")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that staging data is ready for publication
    Validate,

    /// Atomically publish staged data to the stable directory
    Publish {
        /// Skip validation checks (operator escape hatch)
        #[arg(long)]
        force: bool,

        /// Run timestamp (YYYY-MM-DD_HH-MM-SS); defaults to now
        #[arg(long)]
        run_timestamp: Option<String>,
    },

    /// Restore a previous backup as the stable state
    Rollback {
        /// Backup timestamp to restore (YYYY-MM-DD_HH-MM-SS)
        #[arg(long = "to")]
        to: String,
    },

    /// Show publication status and the current stable inventory
    Status,

    /// List publication records, newest first
    List {
        /// Maximum number of records to show
        #[arg(long)]
        limit: Option<usize>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Validate => "validate",
            Commands::Publish { .. } => "publish",
            Commands::Rollback { .. } => "rollback",
            Commands::Status => "status",
            Commands::List { .. } => "list",
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose, cli.global.quiet, cli.global.log_format);
    let code = run(&cli);
    std::process::exit(code.into());
}

fn run(cli: &Cli) -> ExitCode {
    let resolver = ConfigResolver::new(cli.global.config.clone());
    let (config, snapshot) = match resolver.load(&cli.global.project_root) {
        Ok(loaded) => loaded,
        Err(err) => {
            emit_failure(cli.global.format, &err.to_string(), &[]);
            return ExitCode::ArgsError;
        }
    };
    let engine = PublishEngine::new(config, &cli.global.project_root);

    info!(
        command = cli.command.name(),
        root = %cli.global.project_root.display(),
        config = %snapshot.resolution,
        "dispatching command"
    );

    match &cli.command {
        Commands::Validate => cmd_validate(cli, &engine),
        Commands::Publish {
            force,
            run_timestamp,
        } => cmd_publish(cli, &engine, *force, run_timestamp.as_deref()),
        Commands::Rollback { to } => cmd_rollback(cli, &engine, to),
        Commands::Status => cmd_status(cli, &engine, &snapshot),
        Commands::List { limit } => cmd_list(cli, &engine, *limit),
    }
}

fn cmd_validate(cli: &Cli, engine: &PublishEngine) -> ExitCode {
    let report = engine.validate_staging();
    match cli.global.format {
        OutputFormat::Json => {
            print_json(&json!({
                "success": report.valid,
                "valid": report.valid,
                "issues": report.issues,
                "datasets_found": report.datasets_found,
                "total_records": report.total_records,
            }));
        }
        OutputFormat::Text => {
            if report.valid {
                println!("staging is ready: {} record(s)", report.total_records);
            } else {
                println!("staging is not ready");
            }
            for dataset in &report.datasets_found {
                println!(
                    "  {}: {} record(s), {} column(s)",
                    dataset.file, dataset.records, dataset.columns
                );
            }
            for issue in &report.issues {
                println!("  issue: {issue}");
            }
        }
    }
    if report.valid {
        ExitCode::Ok
    } else {
        ExitCode::StagingRejected
    }
}

fn cmd_publish(
    cli: &Cli,
    engine: &PublishEngine,
    force: bool,
    run_timestamp: Option<&str>,
) -> ExitCode {
    let ts = match run_timestamp {
        Some(raw) => match RunTimestamp::parse(raw) {
            Some(ts) => ts,
            None => {
                emit_failure(
                    cli.global.format,
                    &format!("invalid run timestamp '{raw}' (expected YYYY-MM-DD_HH-MM-SS)"),
                    &[],
                );
                return ExitCode::ArgsError;
            }
        },
        None => RunTimestamp::now(),
    };

    match engine.publish(&ts, force) {
        Ok(receipt) => {
            match cli.global.format {
                OutputFormat::Json => print_json(&json!({
                    "success": true,
                    "run_timestamp": receipt.run_timestamp,
                    "datasets_published": receipt.datasets_published,
                    "total_records": receipt.total_records,
                    "backup_path": receipt.backup_path,
                    "metadata": receipt.record,
                })),
                OutputFormat::Text => {
                    println!(
                        "published {} dataset(s), {} record(s) as run {}",
                        receipt.datasets_published, receipt.total_records, receipt.run_timestamp
                    );
                    match receipt.backup_path {
                        Some(backup) => println!("previous generation backed up to {}", backup.display()),
                        None => println!("no previous generation to back up"),
                    }
                }
            }
            ExitCode::Ok
        }
        Err(err) => fail(cli.global.format, &err),
    }
}

fn cmd_rollback(cli: &Cli, engine: &PublishEngine, to: &str) -> ExitCode {
    if RunTimestamp::parse(to).is_none() {
        emit_failure(
            cli.global.format,
            &format!("invalid backup timestamp '{to}' (expected YYYY-MM-DD_HH-MM-SS)"),
            &[],
        );
        return ExitCode::ArgsError;
    }

    match engine.rollback(to) {
        Ok(receipt) => {
            match cli.global.format {
                OutputFormat::Json => print_json(&json!({
                    "success": true,
                    "restored_from": receipt.restored_from,
                    "current_backup": receipt.current_backup,
                    "rollback_timestamp": receipt.rollback_timestamp,
                })),
                OutputFormat::Text => {
                    println!("restored stable data from {}", receipt.restored_from.display());
                    if let Some(backup) = receipt.current_backup {
                        println!("previous state preserved at {}", backup.display());
                    }
                }
            }
            ExitCode::Ok
        }
        Err(err) => fail(cli.global.format, &err),
    }
}

fn cmd_status(cli: &Cli, engine: &PublishEngine, snapshot: &ConfigSnapshot) -> ExitCode {
    match engine.status() {
        Ok(status) => {
            match cli.global.format {
                OutputFormat::Json => print_json(&json!({
                    "success": true,
                    "status": status,
                    "config": snapshot,
                })),
                OutputFormat::Text => {
                    println!(
                        "stable directory: {} ({})",
                        status.stable_directory_path,
                        if status.stable_directory_exists {
                            "exists"
                        } else {
                            "missing"
                        }
                    );
                    println!(
                        "staging: {} ({})",
                        status.staging_path,
                        if status.staging_ready { "ready" } else { "missing" }
                    );
                    println!(
                        "current datasets: {} ({} record(s))",
                        status.current_datasets.len(),
                        status.total_records
                    );
                    println!("backups available: {}", status.backups_available);
                    match status.last_publication {
                        Some(record) => println!(
                            "last publication: {} ({} record(s))",
                            record.publication_timestamp, record.total_records_published
                        ),
                        None => println!("last publication: none"),
                    }
                }
            }
            ExitCode::Ok
        }
        Err(err) => fail(cli.global.format, &err),
    }
}

fn cmd_list(cli: &Cli, engine: &PublishEngine, limit: Option<usize>) -> ExitCode {
    match engine.list_publications() {
        Ok(mut records) => {
            if let Some(limit) = limit {
                records.truncate(limit);
            }
            match cli.global.format {
                OutputFormat::Json => print_json(&json!({
                    "success": true,
                    "count": records.len(),
                    "publications": records,
                })),
                OutputFormat::Text => {
                    if records.is_empty() {
                        println!("no publications found");
                    }
                    for record in &records {
                        println!(
                            "{}  {} record(s)  by {}",
                            record.publication_timestamp,
                            record.total_records_published,
                            record.publisher
                        );
                    }
                }
            }
            ExitCode::Ok
        }
        Err(err) => fail(cli.global.format, &err),
    }
}

fn fail(format: OutputFormat, err: &PublishError) -> ExitCode {
    let issues = match err {
        PublishError::StagingNotReady { issues } => issues.clone(),
        _ => Vec::new(),
    };
    emit_failure(format, &err.to_string(), &issues);
    ExitCode::from_publish_error(err)
}

fn emit_failure(format: OutputFormat, error: &str, issues: &[String]) {
    match format {
        OutputFormat::Json => print_json(&json!({
            "success": false,
            "error": error,
            "issues": issues,
        })),
        OutputFormat::Text => {
            println!("error: {error}");
            for issue in issues {
                println!("  - {issue}");
            }
        }
    }
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}
