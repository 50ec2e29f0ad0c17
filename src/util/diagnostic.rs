//! User-friendly diagnostic messages.
//!
//! Every fatal build-configuration problem names the offending modules and
//! says how to fix them; nothing here is retried.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no project config file is found.
    pub const NO_PROJECT: &str = "Create a Modlink.toml in the project root";

    /// Suggestion when the map file has not been produced.
    pub const NO_MAP_FILE: &str =
        "Run the link step first, with the linker map output enabled (-Wl,--Map=<file>)";

    /// Suggestion when a module is built as a static archive.
    pub const ARCHIVED_MODULE: &str =
        "Disable archiving for the module (libArchive = false) so its objects are linked directly";

    /// Suggestion when a module left nothing in the linked image.
    pub const MISSING_MODULE: &str =
        "Make sure the module registers itself and is not built as a static archive";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    fn with_severity(message: impl Into<String>, severity: Severity) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Error)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Warning)
    }

    /// Create a new note.
    pub fn note(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Note)
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  -> {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("no object files from 2 module(s) found in linked output")
            .with_context("`audio` (build dir `audio_reactive`)")
            .with_context("`rotary` (build dir `rotary_encoder`)")
            .with_location("build/firmware.map")
            .with_suggestion(suggestions::MISSING_MODULE);

        let output = diag.format(false);
        assert!(output.starts_with("error: no object files"));
        assert!(output.contains("  --> build/firmware.map"));
        assert!(output.contains("-> `audio` (build dir `audio_reactive`)"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Make sure the module registers itself"));
    }

    #[test]
    fn test_colored_severity() {
        let output = Diagnostic::warning("duplicate request").format(true);
        assert!(output.starts_with("\x1b[1;33mwarning\x1b[0m"));
        assert_eq!(Diagnostic::note("x").to_string(), "note: x\n");
    }
}
