//! Structured logging for the publishing CLI.
//!
//! - stdout is reserved for command payloads (JSON/text output)
//! - stderr receives all log output, human-readable or JSONL
//! - `SP_LOG` / `RUST_LOG` override the verbosity flags

use std::io::IsTerminal;

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

const ENV_LOG: &str = "SP_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// Machine-parseable JSON lines.
    Jsonl,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs.
pub fn init_logging(verbose: u8, quiet: bool, format: LogFormat) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "sp_core={level},sp_publish={level},sp_config={level}"
            ))
        });

    match format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Jsonl => {
            let _ = tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
