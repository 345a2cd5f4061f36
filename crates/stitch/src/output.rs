//! Colored terminal output utilities.

use console::{Style, Term};
use stitch_diagnostics::{Diagnostic, DiagnosticsCollector, Severity};

/// Terminal output formatter.
///
/// Messages go to stderr; only command results go to stdout.
pub(crate) struct Output {
    term: Term,
    stdout: Term,
    green: Style,
    yellow: Style,
    red: Style,
    dim: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            stdout: Term::stdout(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            dim: Style::new().dim(),
        }
    }

    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print a command result on stdout.
    pub(crate) fn result(&self, msg: &str) {
        let _ = self.stdout.write_line(msg);
    }

    pub(crate) fn diagnostic(&self, diagnostic: &Diagnostic) {
        let location = self.dim.apply_to(&diagnostic.location);
        match diagnostic.severity {
            Severity::Error => self.error(&format!("error: {location}: {}", diagnostic.message)),
            Severity::Warning => self.warning(&format!("warning: {location}: {}", diagnostic.message)),
            Severity::Hint => self.info(&format!("hint: {location}: {}", diagnostic.message)),
        }
    }

    /// Print every collected diagnostic followed by the counts.
    pub(crate) fn diagnostics(&self, collector: &DiagnosticsCollector) {
        for diagnostic in collector.diagnostics() {
            self.diagnostic(&diagnostic);
        }
        let (errors, warnings) = (collector.errors(), collector.warnings());
        if errors + warnings > 0 {
            self.info(&format!("{errors} error(s), {warnings} warning(s)"));
        }
    }
}
