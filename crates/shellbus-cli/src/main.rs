//! Shellbus CLI - interactive host for the shellbus event bus.
//!
//! Starts an in-process host with simulated UI surfaces and reads
//! commands from stdin (see [`command`] for the list).
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`SHELLBUS_*`)
//! 3. Project config (`.shellbus/config.toml` in the project directory)
//! 4. Global config (`~/.shellbus/config.toml`)
//! 5. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `SHELLBUS_DEBUG`: Enable debug mode (`true`/`false`)
//! - `SHELLBUS_REQUEST_TIMEOUT_MS`: Blocking call timeout
//! - `SHELLBUS_CATCH_PANICS`: Contain listener panics (`true`/`false`)
//! - `SHELLBUS_LOG_LEVEL`: Log level when no flag or `RUST_LOG` is given
//! - `SHELLBUS_LOG_FILE`: Also write logs to this file

mod command;
mod log_file;
mod shell;

use anyhow::Result;
use clap::Parser;
use command::Command;
use log_file::LogFile;
use shell::Shell;
use shellbus_runtime::config::{ConfigLoader, ConfigResolver, ShellbusConfig};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Pause after each command so surface output lands before the next one.
const SETTLE: Duration = Duration::from_millis(50);

/// Shellbus - cross-context event bus demo host
#[derive(Parser, Debug)]
#[command(name = "shellbus")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Project root directory (defaults to current directory)
    #[arg(short = 'C', long)]
    project: Option<PathBuf>,

    /// Number of surfaces to open at startup
    #[arg(long, value_name = "N")]
    surfaces: Option<usize>,

    /// Also write logs to this file (also: SHELLBUS_LOG_FILE)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log level when neither --debug nor --verbose is given
    /// (also: SHELLBUS_LOG_LEVEL, default: warn)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

/// Applies CLI flags on top of the file/env configuration.
struct CliConfigResolver {
    project_root: PathBuf,
    debug: bool,
    surfaces: Option<usize>,
    log_file: Option<PathBuf>,
    log_level: Option<String>,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Self {
        let project_root = args.project.clone().unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to get current directory, using '.'");
                PathBuf::from(".")
            })
        });

        Self {
            project_root,
            debug: args.debug,
            surfaces: args.surfaces,
            log_file: args.log_file.clone(),
            log_level: args.log_level.clone(),
        }
    }

    fn resolve(&self) -> Result<ShellbusConfig> {
        let mut config = ConfigLoader::new()
            .with_project_root(&self.project_root)
            .load()?;
        self.apply(&mut config);
        Ok(config)
    }
}

impl ConfigResolver for CliConfigResolver {
    fn apply(&self, config: &mut ShellbusConfig) {
        if self.debug {
            config.debug = true;
        }
        if let Some(n) = self.surfaces {
            config.surfaces.initial = n;
        }
        if let Some(ref p) = self.log_file {
            config.logging.file_path = Some(p.clone());
        }
        if let Some(ref level) = self.log_level {
            config.logging.level.clone_from(level);
        }
    }
}

/// Terminal filter: --debug > --verbose > RUST_LOG > config level.
fn terminal_filter(args: &Args, config: &ShellbusConfig) -> EnvFilter {
    if args.debug || config.debug {
        EnvFilter::new("debug,tokio=warn")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()))
    }
}

fn init_tracing(args: &Args, config: &ShellbusConfig) {
    let terminal_layer = fmt::layer()
        .with_target(false)
        .with_filter(terminal_filter(args, config));

    let file_layer = config.logging.file_path.as_ref().and_then(|path| {
        match LogFile::open(path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(file)
                    .with_filter(EnvFilter::new("debug,tokio=warn")),
            ),
            Err(e) => {
                eprintln!("Warning: cannot open log file {}: {e}", path.display());
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(terminal_layer)
        .with(file_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let resolver = CliConfigResolver::from_args(&args);
    let config = resolver
        .resolve()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;

    init_tracing(&args, &config);

    println!("shellbus v{}", env!("CARGO_PKG_VERSION"));
    info!(
        path = %resolver.project_root.display(),
        timeout_ms = config.bus.request_timeout_ms,
        "Project root"
    );

    let mut shell = Shell::start(&config)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Ok(Some(command)) => {
                if !shell.execute(command).await {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => println!("error: {e:#}"),
        }
        tokio::time::sleep(SETTLE).await;
    }

    shell.shutdown().await;
    Ok(())
}
