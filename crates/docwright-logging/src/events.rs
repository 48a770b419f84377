use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Structured log events for a documentation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    RunStarted {
        working_dir: PathBuf,
        model: String,
        target_file: String,
    },
    ChangesCollected {
        files_changed: usize,
        insertions: usize,
        deletions: usize,
        patch_bytes: usize,
    },
    TurnStarted {
        turn: usize,
        messages: usize,
    },
    ModelResponded {
        turn: usize,
        finish_reason: Option<String>,
        tool_calls: usize,
    },
    ToolInvoked {
        turn: usize,
        call_id: String,
        tool: String,
    },
    ToolCompleted {
        turn: usize,
        call_id: String,
        tool: String,
        success: bool,
        error: Option<String>,
    },
    /// Model stopped without tool calls for a non-terminal reason
    TurnIncomplete {
        turn: usize,
        finish_reason: Option<String>,
    },
    RunCompleted {
        turns: usize,
        invocations: usize,
        duration_secs: f64,
    },
    MaxTurnsReached {
        turns: usize,
    },
    ErrorEncountered {
        turn: usize,
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors and visual structure
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for docwright events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    console: bool,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            console: true,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            console: true,
            file_writer: Some(Mutex::new(file)),
        })
    }

    /// Stop echoing events to stderr (file output, if any, is kept)
    pub fn without_console(mut self) -> Self {
        self.console = false;
        self
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        if !self.console {
            return;
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::RunStarted {
                working_dir,
                model,
                target_file,
            } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╭─────────────────────────────────────────────────────────────────────╮"
                        .bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {}{}",
                    "│".bright_blue(),
                    "docwright".bold().bright_white(),
                    " ".repeat(58) + &"│".bright_blue().to_string()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "File:".dimmed(),
                    Self::truncate_with_padding(target_file, 62, 68).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Model:".dimmed(),
                    Self::truncate_with_padding(model, 61, 68).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Dir:".dimmed(),
                    Self::truncate_with_padding(&working_dir.display().to_string(), 63, 68)
                        .dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╰─────────────────────────────────────────────────────────────────────╯"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::ChangesCollected {
                files_changed,
                insertions,
                deletions,
                ..
            } => {
                if *files_changed > 0 {
                    let _ = writeln!(
                        stderr,
                        "  {} {} {} {}, {} {}, {} {}",
                        "📁".dimmed(),
                        "Changes:".dimmed(),
                        files_changed,
                        if *files_changed == 1 { "file" } else { "files" },
                        format!("+{}", insertions).green(),
                        if *insertions == 1 { "line" } else { "lines" },
                        format!("-{}", deletions).red(),
                        if *deletions == 1 { "line" } else { "lines" }
                    );
                } else {
                    let _ = writeln!(
                        stderr,
                        "  {} {}",
                        "📁".dimmed(),
                        "Changes: none".dimmed()
                    );
                }
                let _ = writeln!(stderr);
            }
            LogEvent::TurnStarted { turn, .. } => {
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_cyan(),
                    format!("TURN {}", turn).bright_cyan().bold()
                );
            }
            LogEvent::ToolInvoked { tool, .. } => {
                let _ = writeln!(stderr, "    {} {}", "│".dimmed(), tool.bright_white());
            }
            LogEvent::ToolCompleted {
                tool,
                success,
                error,
                ..
            } => {
                if *success {
                    let _ = writeln!(stderr, "    {} {} ok", "✓".bright_green(), tool);
                } else {
                    let _ = writeln!(
                        stderr,
                        "    {} {} {}",
                        "✗".bright_red(),
                        tool,
                        error.as_deref().unwrap_or("failed").bright_red()
                    );
                }
            }
            LogEvent::TurnIncomplete { finish_reason, .. } => {
                let _ = writeln!(
                    stderr,
                    "    {} Model stopped early ({}), asking again",
                    "⚠".bright_yellow(),
                    finish_reason.as_deref().unwrap_or("no reason")
                );
            }
            LogEvent::RunCompleted {
                turns,
                invocations,
                duration_secs,
            } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} Done after {} {} and {} tool {} ({:.1}s)",
                    "✓".bright_green(),
                    turns,
                    if *turns == 1 { "turn" } else { "turns" },
                    invocations,
                    if *invocations == 1 { "call" } else { "calls" },
                    duration_secs
                );
                let _ = writeln!(stderr);
            }
            LogEvent::MaxTurnsReached { turns } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} Maximum turns reached ({})",
                    "⚠".bright_yellow(),
                    turns
                );
            }
            LogEvent::ErrorEncountered { turn, error } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} Error in turn {}: {}",
                    "✗".bright_red(),
                    turn,
                    error.bright_red()
                );
            }
            LogEvent::ModelResponded { .. } => {
                // Debug info, skipped in pretty mode
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::RunStarted { target_file, .. } => {
                format!("[{}] run:start {}", timestamp, target_file)
            }
            LogEvent::ChangesCollected {
                files_changed,
                insertions,
                deletions,
                patch_bytes,
            } => format!(
                "[{}] changes {}f +{} -{} {}b",
                timestamp, files_changed, insertions, deletions, patch_bytes
            ),
            LogEvent::TurnStarted { turn, messages } => {
                format!("[{}] turn:start:{} msgs={}", timestamp, turn, messages)
            }
            LogEvent::ModelResponded {
                turn,
                finish_reason,
                tool_calls,
            } => format!(
                "[{}] model:{} finish={} calls={}",
                timestamp,
                turn,
                finish_reason.as_deref().unwrap_or("-"),
                tool_calls
            ),
            LogEvent::ToolInvoked { turn, tool, .. } => {
                format!("[{}] tool:start:{} {}", timestamp, turn, tool)
            }
            LogEvent::ToolCompleted {
                turn,
                tool,
                success,
                error,
                ..
            } => match error {
                Some(error) if !success => {
                    format!("[{}] tool:fail:{} {} {}", timestamp, turn, tool, error)
                }
                _ => format!("[{}] tool:done:{} {}", timestamp, turn, tool),
            },
            LogEvent::TurnIncomplete {
                turn,
                finish_reason,
            } => format!(
                "[{}] turn:incomplete:{} {}",
                timestamp,
                turn,
                finish_reason.as_deref().unwrap_or("-")
            ),
            LogEvent::RunCompleted {
                turns,
                duration_secs,
                ..
            } => format!("[{}] run:done:{} {:.1}s", timestamp, turns, duration_secs),
            LogEvent::MaxTurnsReached { turns } => {
                format!("[{}] run:limit:{}", timestamp, turns)
            }
            LogEvent::ErrorEncountered { turn, error } => {
                format!("[{}] error:{}:{}", timestamp, turn, error)
            }
        };
        let _ = writeln!(stderr, "{}", msg);
    }

    /// Truncate a string and pad to exact width
    fn truncate_with_padding(s: &str, max_len: usize, total_width: usize) -> String {
        let truncated = if s.chars().count() > max_len {
            let kept: String = s.chars().take(max_len - 3).collect();
            format!("{}...", kept)
        } else {
            s.to_string()
        };

        let padding_needed = total_width.saturating_sub(truncated.chars().count() + 1);
        format!("{}{}│", truncated, " ".repeat(padding_needed))
    }
}
