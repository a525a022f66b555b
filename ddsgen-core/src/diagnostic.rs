//! Error reporting seam.
//!
//! Expected failure modes (missing files, ambiguous queries, malformed
//! documents) never surface as faults. They are funnelled through an
//! [`ErrorHandler`] with an assigned [`Severity`].

use std::{
    error::Error as StdError,
    sync::{PoisonError, RwLock},
};

use serde::Serialize;

/// Severity level for a reported problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    /// A failure that aborted the current step.
    Error,
    /// An expected, steady-state condition worth surfacing.
    Warning,
    /// Informational message about generation.
    Info,
}

impl Severity {
    /// Returns true if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Receives every problem the generator reports.
pub trait ErrorHandler {
    fn report(
        &self,
        severity: Severity,
        title: &str,
        message: &str,
        cause: Option<&(dyn StdError + 'static)>,
    );
}

impl<T: ErrorHandler + ?Sized> ErrorHandler for std::sync::Arc<T> {
    fn report(
        &self,
        severity: Severity,
        title: &str,
        message: &str,
        cause: Option<&(dyn StdError + 'static)>,
    ) {
        (**self).report(severity, title, message, cause)
    }
}

/// A recorded report.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// Short title (e.g. "Generate Demo.idl").
    pub title: String,
    /// The diagnostic message.
    pub message: String,
    /// Rendered cause chain, if a cause was given.
    pub cause: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Attach a cause description to this diagnostic.
    pub fn caused_by(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.title, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " (caused by: {})", cause)?;
        }
        Ok(())
    }
}

fn render_cause(cause: &(dyn StdError + 'static)) -> String {
    let mut rendered = cause.to_string();
    let mut source = cause.source();
    while let Some(err) = source {
        rendered.push_str(": ");
        rendered.push_str(&err.to_string());
        source = err.source();
    }
    rendered
}

/// Handler that forwards every report to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorHandler;

impl ErrorHandler for TracingErrorHandler {
    fn report(
        &self,
        severity: Severity,
        title: &str,
        message: &str,
        cause: Option<&(dyn StdError + 'static)>,
    ) {
        let cause = cause.map(render_cause).unwrap_or_default();
        match severity {
            Severity::Error => tracing::error!(title = %title, cause = %cause, "{}", message),
            Severity::Warning => tracing::warn!(title = %title, cause = %cause, "{}", message),
            Severity::Info => tracing::info!(title = %title, cause = %cause, "{}", message),
        }
    }
}

/// Handler that records reports for later inspection.
#[derive(Debug, Default)]
pub struct CollectingErrorHandler {
    diagnostics: RwLock<Vec<Diagnostic>>,
}

impl CollectingErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Check if any error diagnostics have been recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Count the number of error diagnostics.
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Count the number of warning diagnostics.
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Count the diagnostics recorded at `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Number of diagnostics recorded so far.
    pub fn len(&self) -> usize {
        self.diagnostics.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.diagnostics.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl ErrorHandler for CollectingErrorHandler {
    fn report(
        &self,
        severity: Severity,
        title: &str,
        message: &str,
        cause: Option<&(dyn StdError + 'static)>,
    ) {
        let mut diagnostic = Diagnostic::new(severity, title, message);
        if let Some(cause) = cause {
            diagnostic = diagnostic.caused_by(render_cause(cause));
        }
        self.diagnostics.write().unwrap_or_else(PoisonError::into_inner).push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Info.to_string(), "info");
    }

    #[test]
    fn test_collecting_handler_counts() {
        let handler = CollectingErrorHandler::new();

        handler.report(Severity::Error, "Generate", "template failed", None);
        handler.report(Severity::Warning, "Model name", "no name", None);
        handler.report(Severity::Info, "Generate", "done", None);

        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 1);
        assert_eq!(handler.warning_count(), 1);
        assert_eq!(handler.len(), 3);

        handler.clear();
        assert!(handler.is_empty());
    }

    #[test]
    fn test_collecting_handler_records_cause() {
        let handler = CollectingErrorHandler::new();
        let cause = io::Error::new(io::ErrorKind::NotFound, "demo.opendds");

        handler.report(Severity::Warning, "Load", "missing model", Some(&cause));

        let diags = handler.diagnostics();
        assert_eq!(diags[0].cause.as_deref(), Some("demo.opendds"));
        assert_eq!(
            diags[0].to_string(),
            "warning: Load: missing model (caused by: demo.opendds)"
        );
    }

    #[test]
    fn test_arc_handler_forwards() {
        let handler = std::sync::Arc::new(CollectingErrorHandler::new());
        let shared: std::sync::Arc<dyn ErrorHandler> = handler.clone();

        shared.report(Severity::Info, "t", "m", None);

        assert_eq!(handler.len(), 1);
    }
}
