//! Loading schema text from disk
//!
//! A schema source is either a single SQL file or a directory whose `.sql`
//! files are concatenated in path order.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Read the schema text at `path`
pub fn read_schema_source(path: &Path) -> Result<String> {
    if path.is_dir() {
        let files = collect_sql_files(path)?;
        tracing::debug!(path = %path.display(), files = files.len(), "Reading schema directory");

        let mut sql = String::new();
        for file in files {
            sql.push_str(&fs::read_to_string(&file)?);
            sql.push('\n');
        }
        Ok(sql)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

/// All `.sql` files below `dir`, sorted by path
fn collect_sql_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| Error::IoError(e.into()))?;
        let path = entry.path();
        let is_sql = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("sql"));
        if entry.file_type().is_file() && is_sql {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}
