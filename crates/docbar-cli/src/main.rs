//! docbar CLI
//!
//! Command line host for the docbar search plugin. Provides:
//! - One-shot and interactive searches against the indexing daemon
//! - Requirements check and daemon statistics
//! - Config inspection

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use docbar_bus::{ConnectionManager, SessionConnector};
use docbar_core::config::{Config, Directories};
use docbar_core::{Completion, Requirements, SearchService, check_requirements};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::timeout;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Extra wait on top of the reply timeout for connecting and the lookup itself
const LOOKUP_GRACE: Duration = Duration::from_secs(2);

/// docbar - document search from the command line
#[derive(Parser)]
#[command(name = "docbar")]
#[command(about = "docbar - search the desktop document index")]
#[command(version)]
#[command(after_help = "\
Examples:
  docbar search kernel scheduler     Search and print matches
  docbar search --json --max 5 rust  Print the completion as JSON
  docbar interactive                 Search each line typed on stdin
  docbar check                       Check whether searching can work
  docbar status                      Show index statistics
  docbar config show                 Print the effective config
  docbar config init                 Write a default config file
")]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/docbar/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Submit queries without waiting for typing to pause
    #[arg(long, global = true)]
    no_debounce: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one search and print the matches
    Search {
        /// Query text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Maximum number of matches (0 = configured maximum)
        #[arg(long, default_value_t = 0)]
        max: u32,

        /// Print the completion as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search each line read from stdin, as if typed into a search bar
    Interactive {
        /// Maximum number of matches (0 = configured maximum)
        #[arg(long, default_value_t = 0)]
        max: u32,

        /// Print completions as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Check whether the session bus and the indexing daemon are available
    Check,

    /// Show index statistics reported by the daemon
    Status,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the config file location
    Path,

    /// Print the effective config
    Show,

    /// Write the default config to the config file location
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Set up logging to stderr so stdout only carries results.
/// In debug builds, defaults to debug level and also logs to a timestamped file.
fn setup_logging() {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("docbar={default_level}")));

    if cfg!(debug_assertions) {
        let temp_dir = std::env::temp_dir();
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let log_filename = format!("docbar-{timestamp}.log");
        let log_path = temp_dir.join(&log_filename);

        #[cfg(unix)]
        {
            let symlink_path = temp_dir.join("docbar.log");
            let _ = std::fs::remove_file(&symlink_path);
            let _ = std::os::unix::fs::symlink(&log_path, &symlink_path);
        }

        let file_appender = tracing_appender::rolling::never(&temp_dir, &log_filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        std::mem::forget(guard);

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true);

        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .with(filter)
            .init();

        debug!("Logging to: {}", log_path.display());
    } else {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(filter)
            .init();
    }
}

fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(Directories::new()
            .context("Failed to locate config directory")?
            .config_file),
    }
}

fn load_config(path: &Path, no_debounce: bool) -> Result<Config> {
    let mut config = Config::load(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    if no_debounce {
        config.search.debounce_ms = 0;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging();

    let path = config_path(cli.config)?;

    match cli.command {
        Commands::Search { text, max, json } => {
            let config = load_config(&path, cli.no_debounce)?;
            run_search(&config, &text.join(" "), max, json).await
        }
        Commands::Interactive { max, json } => {
            let config = load_config(&path, cli.no_debounce)?;
            run_interactive(&config, max, json).await
        }
        Commands::Check => run_check(&load_config(&path, cli.no_debounce)?).await,
        Commands::Status => run_status(&load_config(&path, cli.no_debounce)?).await,
        Commands::Config { command } => run_config_command(command, &path, cli.no_debounce),
    }
}

fn connector(config: &Config) -> SessionConnector {
    SessionConnector::new(config.daemon.bus_names())
}

/// Submit one query immediately and print its completion
async fn run_search(config: &Config, text: &str, max: u32, json: bool) -> Result<()> {
    let (handle, mut completions, task) = SearchService::spawn(config, connector(config));
    handle.query_now(text, max)?;

    let wait = config.search.reply_timeout() + LOOKUP_GRACE;
    let completion = timeout(wait, completions.recv()).await.ok().flatten();

    handle.shutdown();
    let _ = task.await;

    match completion {
        Some(completion) => print_completion(&completion, json),
        None => {
            // Lookups that fail emit nothing; explain why if we can
            match check_requirements(&connector(config)).await {
                Requirements::Ready => bail!("The indexing daemon did not answer the query"),
                other => bail!(
                    "Search unavailable: {}",
                    other.reason().unwrap_or("unknown reason")
                ),
            }
        }
    }
}

/// Treat every stdin line as the current search bar text
async fn run_interactive(config: &Config, max: u32, json: bool) -> Result<()> {
    let (handle, mut completions, task) = SearchService::spawn(config, connector(config));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    info!("Reading queries from stdin");

    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("Failed to read stdin")? {
                Some(line) => handle.query(line, max)?,
                None => break,
            },
            Some(completion) = completions.recv() => print_completion(&completion, json)?,
        }
    }

    // The last line may still be debouncing or collecting
    let wait = config.search.debounce() + config.search.reply_timeout() + LOOKUP_GRACE;
    if let Ok(Some(completion)) = timeout(wait, completions.recv()).await {
        print_completion(&completion, json)?;
    }

    handle.shutdown();
    let _ = task.await;
    Ok(())
}

async fn run_check(config: &Config) -> Result<()> {
    match check_requirements(&connector(config)).await {
        Requirements::Ready => {
            println!("Status: Ready");
            println!("Service: {}", config.daemon.service);
            Ok(())
        }
        Requirements::NeedsActivation { reason } => {
            println!("Status: Needs activation");
            bail!("{reason}")
        }
        Requirements::NotApplicable { reason } => {
            println!("Status: Not applicable");
            bail!("{reason}")
        }
    }
}

async fn run_status(config: &Config) -> Result<()> {
    let connections = ConnectionManager::new(connector(config));
    let backend = connections
        .ensure_connected()
        .await
        .with_context(|| format!("Failed to connect to {}", config.daemon.service))?;
    let stats = backend
        .statistics()
        .await
        .context("Failed to query index statistics")?;

    println!("Service: {}", config.daemon.service);
    println!("Object path: {}", config.daemon.path);
    println!("Crawled files: {}", stats.crawled_files);
    println!("Indexed documents: {}", stats.documents);
    Ok(())
}

fn run_config_command(command: ConfigCommands, path: &Path, no_debounce: bool) -> Result<()> {
    match command {
        ConfigCommands::Path => {
            if path.exists() {
                println!("{}", path.display());
            } else {
                println!("{} (not found, using defaults)", path.display());
            }
        }
        ConfigCommands::Show => {
            let config = load_config(path, no_debounce)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Init { force } => {
            init_config(path, force)?;
            println!("Wrote default config to {}", path.display());
        }
    }
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default()
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn print_completion(completion: &Completion, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(completion)?);
    } else {
        print!("{}", format_completion(completion));
    }
    Ok(())
}

fn format_completion(completion: &Completion) -> String {
    let mut out = String::new();

    let _ = write!(
        out,
        "{}: {} match{}",
        completion.query,
        completion.matches.len(),
        if completion.matches.len() == 1 { "" } else { "es" }
    );
    if completion.failed > 0 {
        let _ = write!(out, ", {} failed", completion.failed);
    }
    if completion.timed_out {
        out.push_str(" (timed out)");
    }
    out.push('\n');

    for m in &completion.matches {
        let _ = writeln!(out, "  [{}] {}", m.category, m.name);
        let _ = writeln!(out, "      {}: {}", m.verb, m.action.target());
        if let Some(snippet) = &m.snippet {
            let _ = writeln!(out, "      {snippet}");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbar_core::{Category, HitMatch, MatchAction};

    fn sample_match() -> HitMatch {
        HitMatch {
            id: Some(1),
            name: "Notes (~/notes.txt)".to_string(),
            category: Category::Files,
            verb: "Open".to_string(),
            action: MatchAction::OpenFile {
                path: "/home/alice/notes.txt".to_string(),
            },
            icon: "text-plain".to_string(),
            mime_type: "text/plain".to_string(),
            language: None,
            snippet: Some("meeting notes".to_string()),
        }
    }

    #[test]
    fn test_format_completion_lists_matches() {
        let mut completion = Completion::empty("notes");
        completion.expected = 1;
        completion.matches.push(sample_match());

        let out = format_completion(&completion);
        assert_eq!(
            out,
            "notes: 1 match\n  [files] Notes (~/notes.txt)\n      Open: /home/alice/notes.txt\n      meeting notes\n"
        );
    }

    #[test]
    fn test_format_completion_flags_partial_sets() {
        let mut completion = Completion::empty("slow");
        completion.expected = 3;
        completion.failed = 1;
        completion.timed_out = true;

        assert_eq!(
            format_completion(&completion),
            "slow: 0 matches, 1 failed (timed out)\n"
        );
    }

    #[test]
    fn test_cli_parses_search() {
        let cli = Cli::try_parse_from([
            "docbar",
            "--no-debounce",
            "search",
            "kernel",
            "sched",
            "--max",
            "3",
        ])
        .unwrap();
        assert!(cli.no_debounce);
        match cli.command {
            Commands::Search { text, max, json } => {
                assert_eq!(text.join(" "), "kernel sched");
                assert_eq!(max, 3);
                assert!(!json);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_cli_requires_search_text() {
        assert!(Cli::try_parse_from(["docbar", "search"]).is_err());
    }

    #[test]
    fn test_init_config_writes_defaults_once() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("docbar").join("config.json");

        init_config(&path, false).unwrap();
        let config = load_config(&path, false).unwrap();
        assert_eq!(config.search.max_results, 10);

        assert!(init_config(&path, false).is_err());
        init_config(&path, true).unwrap();
    }

    #[test]
    fn test_load_config_no_debounce_override() {
        let path = std::env::temp_dir().join("docbar-cli-test-missing-config.json");
        let config = load_config(&path, true).unwrap();
        assert_eq!(config.search.debounce_ms, 0);
        assert_eq!(config.search.max_results, 10);
    }
}
