// Author: Dustin Pilgrim
// License: MIT

use std::path::Path;

use tracing::{debug, info};

use crate::ast::{CompileUnit, TargetFormat};
use crate::diagnostics::{Diagnostic, ErrorCollection, ErrorListenerProxy, TracingListener};
use crate::error::PaircError;
use crate::expand::{ExpandedPair, Expander};
use crate::options::CompilerOptions;
use crate::parser::parse_module;
use crate::resolver::resolve;

mod helpers;

pub use helpers::{collect_inputs, expand_home};

/// One input: a file name (used in diagnostics and for the implicit
/// document's name), its text and, optionally, a forced format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
    pub format: Option<TargetFormat>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        SourceFile {
            name: name.into(),
            text: text.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: TargetFormat) -> Self {
        self.format = Some(format);
        self
    }
}

impl<N: Into<String>, T: Into<String>> From<(N, T)> for SourceFile {
    fn from((name, text): (N, T)) -> Self {
        SourceFile::new(name, text)
    }
}

/// Result of a compilation that was not aborted.
#[derive(Debug)]
pub struct CompileOutput {
    pub unit: CompileUnit,
    /// Sorted by module order, then source position.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Runs the whole pipeline: every module is parsed before the unit is
/// resolved.
pub struct Compiler {
    options: CompilerOptions,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Compiler { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compile in-memory sources in the given order.
    ///
    /// # Examples
    /// ```
    /// use pairc::compiler::Compiler;
    /// use pairc::options::CompilerOptions;
    ///
    /// let output = Compiler::new(CompilerOptions::default())
    ///     .compile_sources([("greeting.pxml", "!doc:\n    greeting = hello\n")])
    ///     .unwrap();
    /// assert!(!output.has_errors());
    /// ```
    pub fn compile_sources<I, S>(&self, sources: I) -> Result<CompileOutput, PaircError>
    where
        I: IntoIterator<Item = S>,
        S: Into<SourceFile>,
    {
        let mut unit = CompileUnit::new();
        let mut errors = ErrorCollection::new(self.options.max_errors);
        let mut log = TracingListener;

        {
            let mut listener = ErrorListenerProxy::new();
            listener.attach(&mut errors);
            listener.attach(&mut log);

            for source in sources {
                let source: SourceFile = source.into();
                let format = source
                    .format
                    .unwrap_or_else(|| self.options.resolve_format(Path::new(&source.name)));
                debug!(file = %source.name, format = format.as_str(), "parsing module");
                parse_module(&mut unit, &source.name, &source.text, format, &mut listener)?;
            }
            unit = resolve(unit, &mut listener)?;
        }

        let diagnostics = errors.into_sorted();
        info!(
            modules = unit.modules().len(),
            diagnostics = diagnostics.len(),
            "compilation finished"
        );
        Ok(CompileOutput { unit, diagnostics })
    }

    /// Compile files and directories. Directories are enumerated in sorted
    /// order and filtered by extension; files named explicitly are always read.
    pub fn compile_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<CompileOutput, PaircError> {
        let files = collect_inputs(paths, &self.options)?;
        let sources = files
            .iter()
            .map(|path| helpers::read_source(path))
            .collect::<Result<Vec<_>, _>>()?;
        self.compile_sources(sources)
    }

    /// Expanded documents of a compiled unit, with the configured depth cap.
    pub fn expand(&self, output: &CompileOutput) -> Vec<ExpandedPair> {
        Expander::new(&output.unit)
            .with_max_depth(self.options.expand_max_depth)
            .expand_unit()
    }
}
