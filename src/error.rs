// Author: Dustin Pilgrim
// License: MIT

use thiserror::Error;

fn fmt_hint(hint: &Option<String>) -> String {
    hint.as_ref().map_or(String::new(), |h| format!(" Hint: {}", h))
}

fn fmt_code(code: &Option<u32>) -> String {
    code.map_or(String::new(), |c| format!(" Code: {}", c))
}

/// Fatal errors. Any of these aborts the remaining pipeline stage.
///
/// Recoverable problems in the input are never reported through this type;
/// they are [`crate::diagnostics::Diagnostic`]s collected by an error listener.
#[derive(Debug, Error)]
pub enum PaircError {
    #[error("[PAIRC] File Error '{path}': {message}{}{}", fmt_hint(.hint), fmt_code(.code))]
    FileError {
        message: String,
        path: String,
        hint: Option<String>,
        code: Option<u32>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Raised when the options file cannot be read or deserialized.
    #[error("[PAIRC] Options Error '{path}': {message}{}{}", fmt_hint(.hint), fmt_code(.code))]
    OptionsError {
        message: String,
        path: String,
        hint: Option<String>,
        code: Option<u32>,
    },

    /// An internal tree invariant was violated while building the pair tree.
    #[error("[PAIRC] Structural Error: {0}")]
    Structural(#[from] StructuralFault),

    /// The diagnostic cap was reached.
    #[error("[PAIRC] Too many errors: compilation stopped after {limit} diagnostics")]
    TooManyErrors { limit: usize },

    #[error("[PAIRC] Export Error: {message}")]
    ExportError {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl PaircError {
    /// Every fatal error is reported under one generic code; the original
    /// cause stays reachable through `source()` and `Display`.
    pub fn code(&self) -> &'static str {
        "Fatal"
    }
}

/// Violations of the pair tree's structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralFault {
    #[error(
        "namespace definition '{prefix}' at {line}:{column} must precede all other content of its parent"
    )]
    NamespaceDefinitionOutOfOrder {
        prefix: String,
        line: usize,
        column: usize,
    },

    #[error("{kind} at {line}:{column} cannot have children")]
    ChildrenNotAllowed {
        kind: &'static str,
        line: usize,
        column: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_fault_display() {
        let fault = StructuralFault::NamespaceDefinitionOutOfOrder {
            prefix: "ns".into(),
            line: 3,
            column: 1,
        };
        let err = PaircError::from(fault);
        assert_eq!(
            err.to_string(),
            "[PAIRC] Structural Error: namespace definition 'ns' at 3:1 must precede all other content of its parent"
        );
        assert_eq!(err.code(), "Fatal");
    }

    #[test]
    fn test_file_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = PaircError::FileError {
            message: "Failed to read file: missing".into(),
            path: "a.pxml".into(),
            hint: Some("Check the path".into()),
            code: Some(301),
            source: Some(io),
        };
        assert_eq!(
            err.to_string(),
            "[PAIRC] File Error 'a.pxml': Failed to read file: missing Hint: Check the path Code: 301"
        );
        assert!(err.source().is_some());
    }
}
