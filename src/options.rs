// Author: Dustin Pilgrim
// License: MIT

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ast::TargetFormat;
use crate::diagnostics::DEFAULT_MAX_ERRORS;
use crate::error::PaircError;
use crate::expand::DEFAULT_MAX_DEPTH;

/// Settings of a compilation session.
///
/// Every field has a default, so an options file only names what it changes:
///
/// ```json
/// { "default_format": "json", "max_errors": 50 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Format of inputs whose extension names neither format.
    pub default_format: TargetFormat,
    /// Diagnostic cap; reaching it aborts with [`PaircError::TooManyErrors`].
    pub max_errors: usize,
    pub xml_extensions: Vec<String>,
    pub json_extensions: Vec<String>,
    /// Descend into subdirectories when a directory is given as input.
    pub recursive: bool,
    pub expand_max_depth: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            default_format: TargetFormat::Xml,
            max_errors: DEFAULT_MAX_ERRORS,
            xml_extensions: vec!["pxml".to_string()],
            json_extensions: vec!["pjson".to_string()],
            recursive: true,
            expand_max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CompilerOptions {
    /// Load options from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PaircError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| PaircError::OptionsError {
            message: format!("Failed to read file: {}", e),
            path: path.display().to_string(),
            hint: Some("Check that the options file exists and is readable".into()),
            code: Some(302),
        })?;
        Self::from_json_str(&content, &path.display().to_string())
    }

    pub fn from_json_str(content: &str, origin: &str) -> Result<Self, PaircError> {
        let options: CompilerOptions =
            serde_json::from_str(content).map_err(|e| PaircError::OptionsError {
                message: format!("Invalid options: {}", e),
                path: origin.to_string(),
                hint: Some("Options are a JSON object; unknown fields are ignored".into()),
                code: Some(303),
            })?;

        if options.max_errors == 0 {
            return Err(PaircError::OptionsError {
                message: "max_errors must be at least 1".into(),
                path: origin.to_string(),
                hint: None,
                code: Some(303),
            });
        }
        Ok(options)
    }

    /// Format named by the extension of `path`, if it is one of ours.
    pub fn format_for(&self, path: &Path) -> Option<TargetFormat> {
        let ext = path.extension()?.to_str()?;
        let listed = |list: &[String]| list.iter().any(|e| e.eq_ignore_ascii_case(ext));
        if listed(&self.xml_extensions) {
            Some(TargetFormat::Xml)
        } else if listed(&self.json_extensions) {
            Some(TargetFormat::Json)
        } else {
            None
        }
    }

    /// Whether directory enumeration picks up `path`.
    pub fn accepts(&self, path: &Path) -> bool {
        self.format_for(path).is_some()
    }

    /// Format of an input: its extension, or the default.
    pub fn resolve_format(&self, path: &Path) -> TargetFormat {
        self.format_for(path).unwrap_or(self.default_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = CompilerOptions::default();
        assert_eq!(options.default_format, TargetFormat::Xml);
        assert_eq!(options.max_errors, 1000);
        assert_eq!(options.expand_max_depth, 64);
        assert!(options.recursive);
    }

    #[test]
    fn test_partial_options_file() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        write!(file, r#"{{ "default_format": "json", "max_errors": 5 }}"#).expect("Failed to write options");

        let options = CompilerOptions::from_file(file.path()).expect("Failed to load options");
        assert_eq!(options.default_format, TargetFormat::Json);
        assert_eq!(options.max_errors, 5);
        assert_eq!(options.xml_extensions, vec!["pxml".to_string()]);
    }

    #[test]
    fn test_invalid_options() {
        let err = CompilerOptions::from_json_str("{ \"max_errors\": \"many\" }", "inline")
            .expect_err("Expected invalid options");
        assert!(matches!(err, PaircError::OptionsError { code: Some(303), .. }));

        let err = CompilerOptions::from_json_str("{ \"max_errors\": 0 }", "inline").expect_err("Expected zero cap to fail");
        assert!(err.to_string().contains("max_errors"));

        let err = CompilerOptions::from_file("/nonexistent/pairc.json").expect_err("Expected missing file");
        assert!(matches!(err, PaircError::OptionsError { code: Some(302), .. }));
    }

    #[test]
    fn test_format_by_extension() {
        let options = CompilerOptions::default();
        assert_eq!(options.format_for(Path::new("a/site.PXML")), Some(TargetFormat::Xml));
        assert_eq!(options.format_for(Path::new("data.pjson")), Some(TargetFormat::Json));
        assert_eq!(options.format_for(Path::new("notes.txt")), None);
        assert_eq!(options.resolve_format(Path::new("notes.txt")), TargetFormat::Xml);
        assert!(!options.accepts(Path::new("README")));
    }
}
