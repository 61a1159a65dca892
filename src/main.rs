//! dirwatch - Report files added, modified and deleted under a directory.
//!
//! Usage:
//!   dirwatch scan [PATH]           One-shot scan summary
//!   dirwatch info PATH NAME        Show one file's details
//!   dirwatch watch [PATH]          Scan periodically, with a command prompt
//!   dirwatch --help                Show help

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use dirwatch_core::{FileStatus, MonitorConfig, Snapshot};
use dirwatch_monitor::{Monitor, Scheduler};
use dirwatch_scan::{DirectoryScanner, ScanProgress};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "DIRWATCH_LOG";

#[derive(Parser)]
#[command(
    name = "dirwatch",
    version,
    about = "Watch a directory for added, modified and deleted files",
    long_about = "dirwatch scans a directory tree, records text, image and program files \
                  with a little metadata about each, and reports what changed between scans."
)]
struct Cli {
    /// Load settings from a TOML file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan once and list the recorded files
    Scan {
        /// Directory to scan (defaults to current directory)
        path: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Scan once and describe a single file
    Info {
        /// Directory to scan
        path: PathBuf,

        /// File name relative to the directory
        name: String,
    },

    /// Scan on an interval and accept commands on stdin
    Watch {
        /// Directory to watch (defaults to current directory)
        path: Option<PathBuf>,

        /// Seconds between scans
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Scan { path, format } => {
            let config = load_config(cli.config.as_deref(), path)?;
            run_scan(&config, format)?;
        }
        Command::Info { path, name } => {
            let config = load_config(cli.config.as_deref(), Some(path))?;
            run_info(&config, &name)?;
        }
        Command::Watch { path, interval } => {
            let mut config = load_config(cli.config.as_deref(), path)?;
            if let Some(secs) = interval {
                config.interval_secs = secs;
            }
            config.validate().context("Invalid configuration")?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start runtime")?;
            runtime.block_on(run_watch(config))?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Build the config from an optional file, letting a command-line path
/// override the file's root.
fn load_config(file: Option<&Path>, path: Option<PathBuf>) -> Result<MonitorConfig> {
    let mut config = match file {
        Some(file) => MonitorConfig::from_toml_file(file)
            .with_context(|| format!("Failed to load {}", file.display()))?,
        None => MonitorConfig::new("."),
    };
    if let Some(path) = path {
        config.root = path;
    }
    Ok(config)
}

/// Scan once, reporting progress on stderr when it is a terminal.
fn scan(config: &MonitorConfig) -> Result<Snapshot> {
    eprintln!("Scanning {}...", config.root.display());

    let scanner = DirectoryScanner::new();
    let reporter = std::io::stderr().is_terminal().then(|| {
        let mut updates = scanner.subscribe();
        std::thread::spawn(move || {
            loop {
                match updates.blocking_recv() {
                    Ok(progress) => report_progress(&progress),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        })
    });

    let result = scanner.scan(config);
    // Closes the progress channel.
    drop(scanner);
    if let Some(reporter) = reporter {
        reporter
            .join()
            .map_err(|_| eyre!("Progress reporter panicked"))?;
    }
    result.context("Scan failed")
}

fn report_progress(progress: &ScanProgress) {
    eprint!(
        "\r {} items ({} files, {:.0} files/s)",
        progress.total_items(),
        progress.files_seen,
        progress.files_per_second()
    );
    if progress.finished {
        eprintln!();
    }
}

/// Run a one-shot scan and print the recorded files.
fn run_scan(config: &MonitorConfig, format: OutputFormat) -> Result<()> {
    let snapshot = scan(config)?;

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(60));
            println!(
                " {} - {}",
                snapshot.root.display(),
                format_size(snapshot.stats.total_size)
            );
            println!(
                " {} text, {} image, {} program ({} unclassified skipped)",
                snapshot.stats.text_files,
                snapshot.stats.image_files,
                snapshot.stats.program_files,
                snapshot.stats.unclassified
            );
            println!(" Scanned in {:.2}s", snapshot.scan_duration.as_secs_f64());
            println!("{}", "─".repeat(60));
            println!();

            for record in snapshot.records() {
                println!(
                    " {:<8} {:>10}  {}",
                    record.kind().to_string(),
                    format_size(record.size),
                    record.name
                );
            }

            if snapshot.has_warnings() {
                println!();
                println!("{} warning(s) during scan", snapshot.warnings.len());
                for warning in &snapshot.warnings {
                    println!("   {warning}");
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}

/// Scan once and describe `name`.
fn run_info(config: &MonitorConfig, name: &str) -> Result<()> {
    let snapshot = scan(config)?;
    let record = snapshot
        .get(name)
        .ok_or_else(|| eyre!("File not found: {name}"))?;
    print!("{}", record.describe());
    Ok(())
}

/// Watch until `quit` or ctrl-c.
async fn run_watch(config: MonitorConfig) -> Result<()> {
    let interval = config.interval();
    let monitor = Arc::new(Monitor::new(config)?);
    let mut events = monitor.subscribe();

    let scheduler = Scheduler::new(Arc::clone(&monitor));
    scheduler.start(interval)?;

    eprintln!(
        "Watching {} every {}s. Commands: commit, info NAME, status, scan, quit",
        monitor.config().root.display(),
        interval.as_secs()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => println!("{event}"),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event output fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if !run_command(&monitor, line.trim()).await {
                        break;
                    }
                }
                // Keep watching until ctrl-c when stdin is not interactive.
                None => stdin_open = false,
            },
        }
    }

    eprintln!("Stopping...");
    scheduler.stop().await;
    Ok(())
}

/// Execute one prompt command. Returns `false` to quit.
async fn run_command(monitor: &Arc<Monitor>, line: &str) -> bool {
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "quit" | "exit" => return false,
        "commit" => {
            let baseline = monitor.commit();
            println!(
                "Snapshot committed at {}.",
                dirwatch_core::format_time(baseline)
            );
        }
        "info" if arg.is_empty() => println!("Usage: info NAME"),
        "info" => match monitor.info(arg) {
            Some(record) => print!("{}", record.describe()),
            None => println!("File not found."),
        },
        "status" => print_status(&monitor.status()),
        "scan" => {
            // Events are printed by the subscriber loop.
            let monitor = Arc::clone(monitor);
            match tokio::task::spawn_blocking(move || monitor.scan_once()).await {
                Ok(Ok(events)) if events.is_empty() => println!("No changes."),
                Ok(Ok(_)) => {}
                Ok(Err(e)) => println!("Scan failed: {e}"),
                Err(e) => println!("Scan failed: {e}"),
            }
        }
        other => println!("Unknown command: {other}"),
    }
    true
}

fn print_status(status: &[FileStatus]) {
    println!("Status:");
    for entry in status {
        if entry.changed_since_baseline {
            println!("{} has been changed since the snapshot time.", entry.name);
        } else {
            println!("{} has not been changed since the snapshot time.", entry.name);
        }
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
