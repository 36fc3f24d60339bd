#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the `SQLite` data directory.
//!
//! All paths are relative to the project root's `data/` directory.

use std::path::{Path, PathBuf};

/// File name of the crash database inside `data/`.
pub const DATABASE_FILE_NAME: &str = "database.sqlite";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`. Falls back to the
/// current directory if the manifest is not nested two levels deep.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the default path of the crash database file.
#[must_use]
pub fn database_path() -> PathBuf {
    data_dir().join(DATABASE_FILE_NAME)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_path_lives_under_data_dir() {
        let path = database_path();
        assert!(path.ends_with("data/database.sqlite"));
        assert!(path.starts_with(project_root()));
    }

    #[test]
    fn ensure_dir_accepts_empty_parent() {
        assert!(ensure_dir(Path::new("")).is_ok());
    }
}
