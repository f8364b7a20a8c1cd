// Author: Dustin Pilgrim
// License: MIT

//! Recoverable diagnostics and the listeners that receive them.

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::warn;

use crate::ast::Span;
use crate::error::PaircError;

mod codes;

pub use codes::ErrorCode;

/// Hard cap on accumulated diagnostics.
pub const DEFAULT_MAX_ERRORS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorOrigin {
    Parse,
    Resolve,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    pub file_name: String,
    #[serde(skip)]
    pub file_index: usize,
    pub span: Span,
    pub origin: ErrorOrigin,
}

impl Diagnostic {
    /// Builds a diagnostic, formatting `args` into the code's message template.
    pub fn new(
        code: ErrorCode,
        args: &[&str],
        file_name: &Rc<str>,
        file_index: usize,
        span: Span,
        origin: ErrorOrigin,
    ) -> Self {
        Diagnostic {
            code,
            message: code.format(args),
            file_name: file_name.to_string(),
            file_index,
            span,
            origin,
        }
    }

    pub fn line(&self) -> usize {
        self.span.start.line
    }

    pub fn column(&self) -> usize {
        self.span.start.column
    }

    fn sort_key(&self) -> (usize, usize, &'static str, &str) {
        (
            self.file_index,
            self.span.start.offset,
            self.code.as_str(),
            self.message.as_str(),
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} ({}): {}",
            self.file_name,
            self.line(),
            self.column(),
            self.code,
            self.code.code(),
            self.message
        )
    }
}

/// Receives diagnostics as they are raised by the parser and resolver.
///
/// Returning an error aborts the stage that raised the diagnostic.
pub trait ErrorListener {
    fn on_error(&mut self, diagnostic: &Diagnostic) -> Result<(), PaircError>;
}

/// Broadcasts every diagnostic to all attached listeners, in attach order.
#[derive(Default)]
pub struct ErrorListenerProxy<'a> {
    listeners: Vec<&'a mut dyn ErrorListener>,
}

impl<'a> ErrorListenerProxy<'a> {
    pub fn new() -> Self {
        ErrorListenerProxy { listeners: Vec::new() }
    }

    pub fn attach(&mut self, listener: &'a mut dyn ErrorListener) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl ErrorListener for ErrorListenerProxy<'_> {
    fn on_error(&mut self, diagnostic: &Diagnostic) -> Result<(), PaircError> {
        for listener in self.listeners.iter_mut() {
            listener.on_error(diagnostic)?;
        }
        Ok(())
    }
}

/// The session's error collection. Append-only; refuses the diagnostic that
/// would exceed the cap with [`PaircError::TooManyErrors`].
#[derive(Debug, Clone)]
pub struct ErrorCollection {
    diagnostics: Vec<Diagnostic>,
    max_errors: usize,
}

impl Default for ErrorCollection {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ERRORS)
    }
}

impl ErrorCollection {
    pub fn new(max_errors: usize) -> Self {
        ErrorCollection {
            diagnostics: Vec::new(),
            max_errors,
        }
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    /// Diagnostics ordered by file, source position, code, then message.
    pub fn sorted(&self) -> Vec<Diagnostic> {
        let mut out = self.diagnostics.clone();
        sort_diagnostics(&mut out);
        out
    }

    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        sort_diagnostics(&mut self.diagnostics);
        self.diagnostics
    }
}

impl ErrorListener for ErrorCollection {
    fn on_error(&mut self, diagnostic: &Diagnostic) -> Result<(), PaircError> {
        if self.diagnostics.len() >= self.max_errors {
            return Err(PaircError::TooManyErrors {
                limit: self.max_errors,
            });
        }
        self.diagnostics.push(diagnostic.clone());
        Ok(())
    }
}

/// Forwards diagnostics to `tracing` as warnings.
#[derive(Debug, Default)]
pub struct TracingListener;

impl ErrorListener for TracingListener {
    fn on_error(&mut self, diagnostic: &Diagnostic) -> Result<(), PaircError> {
        warn!(
            code = diagnostic.code.as_str(),
            file = %diagnostic.file_name,
            line = diagnostic.line(),
            column = diagnostic.column(),
            "{}",
            diagnostic.message
        );
        Ok(())
    }
}

/// Stable ordering: the sort is total over (file, offset, code, message), so
/// identical input always yields identical output.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}
