//! Diagnostics for the stitch assembler.
//!
//! Every recoverable problem found while assembling a site (a malformed
//! navigation entry, a missing file, an unresolvable cross-link) is reported
//! through a [`DiagnosticsSink`] instead of aborting the build. The sink is
//! shared by every stage, including the concurrent resolution passes, so
//! implementations must be `Send + Sync`.
//!
//! [`DiagnosticsCollector`] is the default sink: it keeps every diagnostic in
//! arrival order, maintains error and warning counters, and mirrors each
//! diagnostic into `tracing`. Whether the build succeeded is decided once at
//! the end through [`DiagnosticsCollector::success`].
//!
//! # Example
//!
//! ```
//! use stitch_diagnostics::{DiagnosticsCollector, DiagnosticsSink};
//!
//! let diagnostics = DiagnosticsCollector::new();
//! diagnostics.warning("navigation.yml: toc[0]", "missing path_prefix");
//! assert!(diagnostics.success(false));
//! assert!(!diagnostics.success(true));
//! ```

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Hint => "hint",
        };
        f.write_str(label)
    }
}

/// A single reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Where the problem was found, e.g. `navigation.yml: toc[1].children[0]`
    /// or `elasticsearch://reference/setup.md`.
    pub location: String,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(severity: Severity, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            location: location.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, location, message)
    }

    #[must_use]
    pub fn warning(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, location, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.location, self.message)
    }
}

/// Receiver of build diagnostics.
///
/// Only [`emit`](Self::emit) is required; the severity helpers forward to it.
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);

    fn error(&self, location: &str, message: &str) {
        self.emit(Diagnostic::error(location, message));
    }

    fn warning(&self, location: &str, message: &str) {
        self.emit(Diagnostic::warning(location, message));
    }

    fn hint(&self, location: &str, message: &str) {
        self.emit(Diagnostic::new(Severity::Hint, location, message));
    }
}

/// Thread-safe [`DiagnosticsSink`] that records everything it receives.
#[derive(Debug, Default)]
pub struct DiagnosticsCollector {
    diagnostics: Mutex<Vec<Diagnostic>>,
    errors: AtomicUsize,
    warnings: AtomicUsize,
}

impl DiagnosticsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of errors emitted so far.
    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Number of warnings emitted so far.
    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    /// Snapshot of all diagnostics in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().unwrap().clone()
    }

    /// Whether any diagnostic with the given severity mentions `needle`
    /// in its message.
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.diagnostics()
            .iter()
            .any(|d| d.severity == severity && d.message.contains(needle))
    }

    /// Final build verdict.
    ///
    /// A build succeeds when no errors were emitted. In strict mode warnings
    /// count as failures too.
    pub fn success(&self, strict: bool) -> bool {
        let failures = if strict {
            self.errors() + self.warnings()
        } else {
            self.errors()
        };
        failures == 0
    }
}

impl DiagnosticsSink for DiagnosticsCollector {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                tracing::error!(location = %diagnostic.location, "{}", diagnostic.message);
            }
            Severity::Warning => {
                self.warnings.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(location = %diagnostic.location, "{}", diagnostic.message);
            }
            Severity::Hint => {
                tracing::info!(location = %diagnostic.location, "{}", diagnostic.message);
            }
        }
        self.diagnostics.lock().unwrap().push(diagnostic);
    }
}
