//! Error and warning reporting infrastructure.
//!
//! The [`Handler`] collects diagnostics from every front-end phase and, for
//! the interactive driver, renders them to stderr the moment they arrive so
//! that error output interleaves correctly with program output.

use std::cell::RefCell;
use std::fmt;

use crate::Span;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that abandons the current item.
    Error,
    /// A warning that does not stop anything.
    Warning,
    /// Additional information about a diagnostic.
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with severity and location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity level.
    pub level: Level,
    /// Main diagnostic message.
    pub message: String,
    /// Source location.
    pub span: Span,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    pub fn new(level: Level, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            message: message.into(),
            span,
        }
    }

    /// Creates an error diagnostic.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, message, span)
    }

    /// Creates a warning diagnostic.
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Warning, message, span)
    }

    /// Renders the diagnostic in the language's stderr convention.
    pub fn render(&self) -> String {
        match self.level {
            Level::Error => format!("Kukanganisa pa line {}: {}", self.span.line, self.message),
            _ => format!("{} pa line {}: {}", self.level, self.span.line, self.message),
        }
    }
}

/// Handler for collecting and reporting diagnostics.
///
/// Uses interior mutability so the lexer and parser can share one handler
/// while both hold only shared references.
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
    /// When set, diagnostics are collected but not written to stderr.
    silent: bool,
}

impl Handler {
    /// Creates a new handler that renders diagnostics to stderr eagerly.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            silent: false,
        }
    }

    /// Creates a handler that only collects, for tests.
    pub fn silent() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            silent: true,
        }
    }

    /// Emits a diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        if !self.silent {
            eprintln!("{}", diagnostic.render());
        }
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Reports an error at the given span.
    pub fn error(&self, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::error(message, span));
    }

    /// Reports a warning at the given span.
    pub fn warning(&self, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::warning(message, span));
    }

    /// Returns true if any errors have been reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Returns the number of errors reported so far.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Returns a snapshot of all collected diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Clears all collected diagnostics.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_display() {
        assert_eq!(format!("{}", Level::Error), "error");
        assert_eq!(format!("{}", Level::Warning), "warning");
    }

    #[test]
    fn test_diagnostic_render() {
        let diag = Diagnostic::error("Panotarisirwa ')'", Span::point(4, 1));
        assert_eq!(diag.render(), "Kukanganisa pa line 4: Panotarisirwa ')'");
    }

    #[test]
    fn test_handler_collects() {
        let handler = Handler::silent();
        assert!(!handler.has_errors());
        handler.error("bad token", Span::DUMMY);
        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 1);
    }

    #[test]
    fn test_handler_warning_is_not_error() {
        let handler = Handler::silent();
        handler.warning("odd literal", Span::DUMMY);
        assert!(!handler.has_errors());
        assert_eq!(handler.diagnostics().len(), 1);
    }

    #[test]
    fn test_handler_clear() {
        let handler = Handler::silent();
        handler.error("x", Span::DUMMY);
        handler.clear();
        assert!(!handler.has_errors());
    }
}
