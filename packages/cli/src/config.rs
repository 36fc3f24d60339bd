//! Query defaults loaded from TOML.
//!
//! The built-in defaults are embedded from `config/defaults.toml`. A file
//! passed with `--config` replaces them; keys it omits fall back to
//! [`QueryDefaults::default`].

use std::path::{Path, PathBuf};

use crash_map_database_models::QueryDefaults;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("../config/defaults.toml");

/// Errors from loading the query configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`QueryDefaults`].
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads query defaults from `path`, or the embedded defaults if `None`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed.
pub fn load(path: Option<&Path>) -> Result<QueryDefaults, ConfigError> {
    let Some(path) = path else {
        return parse(DEFAULTS_TOML);
    };

    log::debug!("Loading query config from {}", path.display());

    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse(&text)
}

fn parse(text: &str) -> Result<QueryDefaults, ConfigError> {
    Ok(toml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse() {
        let defaults = load(None).unwrap();
        assert_eq!(defaults.max_limit, 1000);
        assert_eq!(defaults.name_search_limit, 25);
        assert!((defaults.near_distance_feet - 5280.0).abs() < f64::EPSILON);
        assert_eq!(defaults.window_days, 90);
        assert_eq!(defaults.region_category, "neighborhood");
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let defaults = parse("window_days = 540\nnear_distance_feet = 2500.0\n").unwrap();
        assert_eq!(defaults.window_days, 540);
        assert!((defaults.near_distance_feet - 2500.0).abs() < f64::EPSILON);
        assert_eq!(defaults.name_search_limit, 25);
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(matches!(
            parse("window_days = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = Path::new("/nonexistent/crash_map.toml");
        let err = load(Some(path)).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/crash_map.toml"));
    }
}
