//! Database location resolution.

use std::path::{Path, PathBuf};

use crate::{Store, StoreError, paths};

/// Environment variable naming the crash database file.
pub const DATABASE_PATH_ENV: &str = "CRASH_MAP_DB";

/// Resolves the database path: an explicit path wins, then the
/// `CRASH_MAP_DB` environment variable, then `data/database.sqlite`.
#[must_use]
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    std::env::var(DATABASE_PATH_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map_or_else(paths::database_path, PathBuf::from)
}

/// Opens the store at the resolved path read-only.
///
/// # Errors
///
/// Returns [`StoreError`] if the database cannot be opened.
pub fn connect(explicit: Option<&Path>) -> Result<Store, StoreError> {
    let path = resolve_path(explicit);
    log::debug!("Connecting to crash database at {}", path.display());
    Store::open(&path)
}

/// Opens the store at the resolved path, degrading to an unavailable store
/// when the file cannot be opened.
///
/// Listing queries against the returned store yield empty results instead
/// of failing.
#[must_use]
pub fn connect_or_unavailable(explicit: Option<&Path>) -> Store {
    match connect(explicit) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open crash database: {e}");
            Store::unavailable()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let path = Path::new("/tmp/explicit.sqlite");
        assert_eq!(resolve_path(Some(path)), path.to_path_buf());
    }

    #[test]
    fn unopenable_path_degrades_to_unavailable() {
        let path = std::env::temp_dir().join("crash_map_no_such_dir/missing.sqlite");
        let store = connect_or_unavailable(Some(&path));
        assert!(!store.is_available());
    }
}
