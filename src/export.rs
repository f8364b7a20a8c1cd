// Author: Dustin Pilgrim
// License: MIT

use serde_json::json;

use crate::ast::{CompileUnit, ValueKind};
use crate::diagnostics::Diagnostic;
use crate::error::PaircError;
use crate::expand::{ExpandedPair, Expander};

/// Render one expanded pair as a JSON value.
///
/// Every pair becomes an object with `name`, `kind`, `value`, `namespace` and
/// `children`. Values keep the text as written; `value_kind` tells how it was
/// written (`Number`, `DoubleQuoted`, ...). Choice alternatives carry
/// `"choice": true`.
pub fn pair_to_json(pair: &ExpandedPair) -> serde_json::Value {
    let mut out = json!({
        "name": pair.name,
        "kind": pair.kind.as_str(),
        "value": pair.value,
        "namespace": pair.namespace,
        "children": pair.children.iter().map(pair_to_json).collect::<Vec<_>>(),
    });

    if let Some(map) = out.as_object_mut() {
        if let Some(prefix) = &pair.prefix {
            map.insert("prefix".into(), json!(prefix));
        }
        if pair.value_kind != ValueKind::None {
            map.insert("value_kind".into(), json!(pair.value_kind));
        }
        if pair.is_choice {
            map.insert("choice".into(), json!(true));
        }
    }
    out
}

/// Export one expanded document as pretty-printed JSON.
///
/// # Examples
/// ```no_run
/// use pairc::compiler::Compiler;
/// use pairc::export::export_document_to_json;
/// use pairc::options::CompilerOptions;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let compiler = Compiler::new(CompilerOptions::default());
/// let output = compiler.compile_paths(&["site.pxml"])?;
/// for document in compiler.expand(&output) {
///     println!("{}", export_document_to_json(&document)?);
/// }
/// # Ok(())
/// # }
/// ```
pub fn export_document_to_json(document: &ExpandedPair) -> Result<String, PaircError> {
    to_pretty(&pair_to_json(document))
}

/// Export every document of `unit`, grouped by module file.
pub fn export_unit_to_json(unit: &CompileUnit, max_depth: usize) -> Result<String, PaircError> {
    let expander = Expander::new(unit).with_max_depth(max_depth);
    let modules: Vec<serde_json::Value> = unit
        .modules()
        .iter()
        .map(|module| {
            let documents: Vec<serde_json::Value> = unit
                .documents(*module)
                .into_iter()
                .filter_map(|d| expander.expand_document(d))
                .map(|d| pair_to_json(&d))
                .collect();
            json!({
                "module": &*unit.tree[*module].file_name,
                "format": unit.module_format(*module).map(|f| f.as_str()),
                "documents": documents,
            })
        })
        .collect();
    to_pretty(&json!(modules))
}

/// Export diagnostics for `--json` output.
pub fn export_diagnostics_to_json(diagnostics: &[Diagnostic]) -> Result<String, PaircError> {
    let entries: Vec<serde_json::Value> = diagnostics
        .iter()
        .map(|d| {
            json!({
                "code": d.code.as_str(),
                "number": d.code.code(),
                "message": d.message,
                "file": d.file_name,
                "line": d.line(),
                "column": d.column(),
                "offset": d.span.start.offset,
                "origin": d.origin,
            })
        })
        .collect();
    to_pretty(&json!(entries))
}

fn to_pretty(value: &serde_json::Value) -> Result<String, PaircError> {
    serde_json::to_string_pretty(value).map_err(|e| PaircError::ExportError {
        message: format!("Failed to serialize JSON: {}", e),
        source: Some(e),
    })
}
