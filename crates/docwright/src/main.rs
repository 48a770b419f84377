mod config;
mod prompt;

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;

use docwright_agent::{create_backend, BackendConfig};
use docwright_core::{CapabilityRegistry, ChatLoop, ChatOutcome, LoopConfig};
use docwright_git::{ChangeCollector, ChangeSet};
use docwright_logging::{init_tracing, LogEvent, LogFormat, Logger};

use crate::config::{FileConfig, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "docwright",
    about = "Keeps project documentation in step with code changes",
    version,
    author
)]
struct Cli {
    /// Working directory (default: current directory)
    #[arg(short = 'd', long)]
    working_dir: Option<PathBuf>,

    /// Base revision; documents the changes between --base and --head
    #[arg(long, requires = "head")]
    base: Option<String>,

    /// Head revision
    #[arg(long, requires = "base")]
    head: Option<String>,

    /// Documentation file to update (default: README.md)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Model to use (default: gpt-4.1)
    #[arg(short, long)]
    model: Option<String>,

    /// Sampling temperature (default: 0.7)
    #[arg(short, long)]
    temperature: Option<f32>,

    /// Maximum model round-trips, 0 for unlimited (default: 50)
    #[arg(short = 'n', long)]
    max_turns: Option<usize>,

    /// API key for the model endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint
    #[arg(long, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Tracing level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Also append JSON event lines to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Output final result as JSON
    #[arg(long)]
    json_output: bool,

    /// Dry run: show the collected changes without calling the model
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Settings given on the command line, highest precedence
    fn overrides(&self) -> FileConfig {
        FileConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            max_turns: self.max_turns,
            base_url: self.base_url.clone(),
            file: self.file.clone(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_format: LogFormat = cli.log_format.into();
    init_tracing(&cli.log_level, log_format);

    let working_dir = match cli.working_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    // Precedence: CLI flags > project config > user config > defaults
    let project_config =
        FileConfig::load_project(&working_dir).context("Failed to load project configuration")?;
    let global_config = FileConfig::load_global().context("Failed to load user configuration")?;
    let settings = Settings::resolve(
        cli.overrides(),
        project_config
            .unwrap_or_default()
            .or(global_config.unwrap_or_default()),
    );

    let changes = collect_changes(&cli, &working_dir)?;

    if cli.dry_run {
        print_dry_run(&working_dir, &settings, &changes)?;
        return Ok(());
    }

    if changes.is_empty() {
        eprintln!("{} No changes to document.", "->".dimmed());
        return Ok(());
    }

    let logger = match cli.log_file {
        Some(ref path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(log_format),
    };
    let logger = Arc::new(logger);

    logger.log(&LogEvent::RunStarted {
        working_dir: working_dir.clone(),
        model: settings.model.clone(),
        target_file: settings.file.display().to_string(),
    });
    logger.log(&LogEvent::ChangesCollected {
        files_changed: changes.summary.files_changed,
        insertions: changes.summary.insertions,
        deletions: changes.summary.deletions,
        patch_bytes: changes.patch.len(),
    });

    let api_key = cli
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .context("No API key provided. Set OPENAI_API_KEY or pass --api-key")?;

    let mut backend_config = BackendConfig::new(api_key).with_timeout(settings.timeout);
    if let Some(ref base_url) = settings.base_url {
        backend_config = backend_config.with_base_url(base_url.clone());
    }
    let backend = create_backend(backend_config)?;

    let mut registry = CapabilityRegistry::new();
    docwright_tools::register_builtin(&mut registry, &working_dir);

    let loop_config = LoopConfig::new(prompt::system_prompt(&working_dir, &changes.patch))
        .with_model(settings.model.clone())
        .with_temperature(settings.temperature)
        .with_max_turns(settings.max_turns);

    let chat = ChatLoop::new(backend.as_ref(), registry, loop_config).with_logger(logger);

    // Handle Ctrl+C gracefully
    let interrupt_handle = chat.interrupt_handle();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted. Stopping before the next model call...");
        interrupt_handle.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    match chat
        .run(&prompt::user_message(&settings.file), Vec::new())
        .await
    {
        Ok(outcome) => {
            if cli.json_output {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "error:".bright_red().bold(), e);
            std::process::exit(e.exit_code());
        }
    }
}

fn collect_changes(cli: &Cli, working_dir: &Path) -> Result<ChangeSet> {
    let collector = ChangeCollector::new();
    let changes = match (&cli.base, &cli.head) {
        (Some(base), Some(head)) => collector
            .changes_between(working_dir, base, head)
            .with_context(|| format!("Failed to diff {}..{}", base, head))?,
        _ => collector
            .changes(working_dir)
            .context("Failed to collect working tree changes")?,
    };
    Ok(changes)
}

fn print_dry_run(working_dir: &Path, settings: &Settings, changes: &ChangeSet) -> Result<()> {
    println!("=== Dry Run ===");
    println!("Working dir: {}", working_dir.display());
    println!("Target file: {}", settings.file.display());
    println!("Model: {} (temperature {})", settings.model, settings.temperature);
    match settings.max_turns {
        Some(max) => println!("Max turns: {}", max),
        None => println!("Max turns: unlimited"),
    }

    let status = ChangeCollector::new()
        .status(working_dir)
        .context("Failed to read git status")?;
    if status.is_clean() {
        println!("Status: clean");
    } else {
        println!("Status:");
        for (marker, path) in status.entries() {
            println!("  {} {}", marker, path);
        }
    }

    if changes.is_empty() {
        println!("Changes: none");
    } else {
        println!(
            "Changes: {} file(s), +{} -{} ({} bytes of patch)",
            changes.summary.files_changed,
            changes.summary.insertions,
            changes.summary.deletions,
            changes.patch.len()
        );
    }
    Ok(())
}

fn print_outcome(outcome: &ChatOutcome) {
    eprintln!();
    eprintln!("=== DONE ===");
    eprintln!("Turns: {}", outcome.turns);
    eprintln!("Tool calls: {}", outcome.invocations);
    eprintln!("Duration: {:.1}s", outcome.total_duration_secs);
    println!("{}", outcome.text);
}
