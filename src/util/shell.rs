//! Centralized shell output.
//!
//! The Shell module provides a unified API for all CLI output:
//! - Status messages with consistent formatting on stderr
//! - Command results on stdout
//! - JSON output mode for machine-readable output
//!
//! JSON mode is mutually exclusive with human output: when it is enabled,
//! status lines are dropped and only JSON events reach stdout.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

/// Shell output mode - Human and Json are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    /// Human-readable output with optional colors.
    Human {
        verbosity: Verbosity,
        color: ColorChoice,
    },
    /// Machine-readable JSON output only.
    Json,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
        }
    }
}

/// Output verbosity level (Human mode only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only
    Quiet,
    /// Default: status messages
    #[default]
    Normal,
    /// --verbose: status messages and debug info
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Status types for output messages.
///
/// Shell handles all formatting - callers just specify the semantic status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Linked,
    Located,
    Finished,

    // In-progress statuses (cyan)
    Resolving,
    Verifying,

    // Info statuses (blue/default)
    Info,

    // Warning statuses (yellow)
    Skipped,
    Warning,

    // Error status (red)
    Error,
}

impl Status {
    /// Get the display text for this status.
    fn as_str(&self) -> &'static str {
        match self {
            Status::Linked => "Linked",
            Status::Located => "Located",
            Status::Finished => "Finished",
            Status::Resolving => "Resolving",
            Status::Verifying => "Verifying",
            Status::Info => "Info",
            Status::Skipped => "Skipped",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    /// Get the ANSI color code for this status.
    fn color_code(&self) -> &'static str {
        match self {
            // Success: bold green
            Status::Linked | Status::Located | Status::Finished => "\x1b[1;32m",
            // In-progress: bold cyan
            Status::Resolving | Status::Verifying => "\x1b[1;36m",
            // Info: bold blue
            Status::Info => "\x1b[1;34m",
            // Warning: bold yellow
            Status::Skipped | Status::Warning => "\x1b[1;33m",
            // Error: bold red
            Status::Error => "\x1b[1;31m",
        }
    }

    /// Get the width for alignment (12 characters).
    fn width(&self) -> usize {
        12
    }
}

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    mode: ShellMode,
    use_color: bool,
}

impl Shell {
    /// Create a new shell with the given mode.
    pub fn new(mode: ShellMode) -> Self {
        let use_color = match &mode {
            ShellMode::Json => false,
            ShellMode::Human { color, .. } => match color {
                ColorChoice::Auto => io::stderr().is_terminal(),
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            },
        };

        Shell { mode, use_color }
    }

    /// Create a shell from CLI flags with proper precedence.
    ///
    /// JSON mode takes precedence over quiet/verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice, json: bool) -> Self {
        let mode = if json {
            ShellMode::Json
        } else {
            let verbosity = if quiet {
                Verbosity::Quiet
            } else if verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Normal
            };
            ShellMode::Human { verbosity, color }
        };

        Shell::new(mode)
    }

    /// Check if shell is in quiet mode.
    pub fn is_quiet(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Quiet,
                ..
            }
        )
    }

    /// Check if shell is in verbose mode.
    pub fn is_verbose(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Verbose,
                ..
            }
        )
    }

    /// Check if shell is in JSON mode.
    pub fn is_json(&self) -> bool {
        matches!(self.mode, ShellMode::Json)
    }

    /// Check if colors are enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message.
    ///
    /// Format: `{status:>12} {message}`
    ///
    /// In quiet mode, only Error status is printed.
    /// In JSON mode, messages are silently ignored (use json_event for JSON output).
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_json() {
            return;
        }

        if self.is_quiet() && status != Status::Error {
            return;
        }

        eprintln!("{} {}", self.format_status(status), msg);
    }

    /// Print an info message.
    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Print an error message.
    ///
    /// In JSON mode, this outputs a JSON error event.
    pub fn error(&self, msg: impl Display) {
        if self.is_json() {
            let event = serde_json::json!({
                "reason": "error",
                "message": msg.to_string()
            });
            self.json_event(&event);
        } else {
            self.status(Status::Error, msg);
        }
    }

    /// Print a result line to stdout. Quiet mode still prints results.
    pub fn print(&self, line: impl Display) {
        if self.is_json() {
            return;
        }
        println!("{}", line);
    }

    /// Print a JSON event to stdout.
    ///
    /// Only works in JSON mode; silently ignored in human mode.
    pub fn json_event(&self, event: &serde_json::Value) {
        if !self.is_json() {
            return;
        }

        let json_str = serde_json::to_string(event).unwrap_or_default();
        println!("{}", json_str);
        let _ = io::stdout().flush();
    }

    /// Format a status prefix with optional color.
    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        let width = status.width();

        if self.use_color {
            let color = status.color_code();
            format!("{}{:>width$}\x1b[0m", color, text, width = width)
        } else {
            format!("{:>width$}", text, width = width)
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}
