use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::SourceFile;
use crate::error::PaircError;
use crate::options::CompilerOptions;

/// Expands a leading `~/` to the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

fn file_error(path: &Path, message: String, source: Option<std::io::Error>) -> PaircError {
    PaircError::FileError {
        message,
        path: path.display().to_string(),
        hint: Some("Check that the path exists and is readable".into()),
        code: Some(301),
        source,
    }
}

/// Input files named by `paths`, in argument order. Directories contribute
/// their accepted files sorted by path.
pub fn collect_inputs<P: AsRef<Path>>(paths: &[P], options: &CompilerOptions) -> Result<Vec<PathBuf>, PaircError> {
    let mut files = Vec::new();
    for raw in paths {
        let path = expand_home(&raw.as_ref().to_string_lossy());
        if path.is_dir() {
            let mut found = Vec::new();
            walk(&path, options, &mut found)?;
            found.sort();
            files.extend(found);
        } else if path.is_file() {
            files.push(path);
        } else {
            return Err(file_error(&path, "No such file or directory".into(), None));
        }
    }
    trace!(count = files.len(), "collected input files");
    Ok(files)
}

fn walk(dir: &Path, options: &CompilerOptions, out: &mut Vec<PathBuf>) -> Result<(), PaircError> {
    let entries = fs::read_dir(dir).map_err(|e| file_error(dir, format!("Failed to read directory: {}", e), Some(e)))?;
    for entry in entries {
        let entry = entry.map_err(|e| file_error(dir, format!("Failed to read directory: {}", e), Some(e)))?;
        let path = entry.path();
        if path.is_dir() {
            if options.recursive {
                walk(&path, options, out)?;
            }
        } else if options.accepts(&path) {
            out.push(path);
        }
    }
    Ok(())
}

pub(super) fn read_source(path: &Path) -> Result<SourceFile, PaircError> {
    let text = fs::read_to_string(path).map_err(|e| file_error(path, format!("Failed to read file: {}", e), Some(e)))?;
    Ok(SourceFile::new(path.display().to_string(), text))
}
