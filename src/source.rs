use std::path::Path;

use crate::ast::SourceUnit;
use crate::error::LoadError;

/// A parsed AST together with the source text its ranges point into.
#[derive(Debug)]
pub struct LoadedUnit {
    pub unit: SourceUnit,
    /// Empty when no source file was given; call snippets then fall back
    /// to their source range.
    pub source: String,
    pub file: String,
}

/// Read `path` to a string, refusing files larger than `max_size` bytes.
pub fn read_bounded(path: &Path, max_size: u64) -> Result<String, LoadError> {
    let io_error = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let size = std::fs::metadata(path).map_err(io_error)?.len();
    if size > max_size {
        return Err(LoadError::TooLarge {
            path: path.to_path_buf(),
            size,
            max: max_size,
        });
    }
    std::fs::read_to_string(path).map_err(io_error)
}

pub fn load_ast(path: &Path, max_size: u64) -> Result<SourceUnit, LoadError> {
    let json = read_bounded(path, max_size)?;
    SourceUnit::from_json(&json).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// The diagnostic file name is the source path when one is given, then the
/// unit's `absolutePath`, then the AST path.
pub fn load_unit(
    ast_path: &Path,
    source_path: Option<&Path>,
    max_size: u64,
) -> Result<LoadedUnit, LoadError> {
    let unit = load_ast(ast_path, max_size)?;
    let source = match source_path {
        Some(path) => read_bounded(path, max_size)?,
        None => String::new(),
    };
    let file = match source_path {
        Some(path) => path.to_string_lossy().to_string(),
        None if !unit.absolute_path.is_empty() => unit.absolute_path.clone(),
        None => ast_path.to_string_lossy().to_string(),
    };
    tracing::debug!(file = %file, bytes = source.len(), "loaded source unit");
    Ok(LoadedUnit { unit, source, file })
}
