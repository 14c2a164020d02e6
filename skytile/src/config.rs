//! INI configuration file.
//!
//! Optional settings read from `~/.skytile/config.ini` (or an explicit path):
//!
//! ```ini
//! [cache]
//! directory = /var/cache/skytile
//!
//! [render]
//! line_width = 2.0
//! max_dimension = 4096
//! ```
//!
//! Command-line flags take precedence over the file, which takes precedence
//! over built-in defaults.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::projection::MAX_TILE_DIMENSION;

/// Errors raised while reading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Settings loaded from the configuration file. Unset keys are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub cache_dir: Option<PathBuf>,
    pub line_width: Option<f64>,
    pub max_dimension: Option<u32>,
}

/// Default location of the configuration file.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".skytile").join("config.ini"))
}

impl ConfigFile {
    /// Load the file at the default location. A missing file gives defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load a specific file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ini(&ini)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Read {
            path: PathBuf::from("<string>"),
            source: ini::Error::Parse(e),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let get = |section: &str, key: &str| {
            ini.section(Some(section))
                .and_then(|s| s.get(key))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let cache_dir = get("cache", "directory").map(expand_home);

        let line_width = match get("render", "line_width") {
            Some(v) => Some(
                v.parse::<f64>()
                    .ok()
                    .filter(|w| w.is_finite() && *w > 0.0)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        key: "render.line_width",
                        value: v.to_string(),
                    })?,
            ),
            None => None,
        };

        let max_dimension = match get("render", "max_dimension") {
            Some(v) => Some(
                v.parse::<u32>()
                    .ok()
                    .filter(|d| (1..=MAX_TILE_DIMENSION).contains(d))
                    .ok_or_else(|| ConfigError::InvalidValue {
                        key: "render.max_dimension",
                        value: v.to_string(),
                    })?,
            ),
            None => None,
        };

        Ok(Self {
            cache_dir,
            line_width,
            max_dimension,
        })
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(value: &str) -> PathBuf {
    match (value.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(value),
    }
}
