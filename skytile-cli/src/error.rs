//! CLI error type and exit codes.

use std::fmt;
use std::io;
use std::path::PathBuf;

use skytile::config::ConfigError;
use skytile::request::RequestError;
use skytile::TileError;

/// Exit status for a request rejected before rendering.
pub const EXIT_CONFIG: i32 = 2;

/// Exit status for every other failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug)]
pub enum CliError {
    /// Required flags are missing.
    Usage(String),
    /// The configuration file could not be used.
    Config(ConfigError),
    /// An argument file could not be read.
    ArgFile { path: PathBuf, source: io::Error },
    /// Rendering or writing the tile failed.
    Tile(TileError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) | CliError::Config(_) | CliError::ArgFile { .. } => EXIT_CONFIG,
            CliError::Tile(e) if e.is_config() => EXIT_CONFIG,
            CliError::Tile(_) => EXIT_FAILURE,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::ArgFile { path, source } => {
                write!(f, "Failed to read args file \"{}\": {}", path.display(), source)
            }
            CliError::Tile(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Usage(_) => None,
            CliError::Config(e) => Some(e),
            CliError::ArgFile { source, .. } => Some(source),
            CliError::Tile(e) => Some(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<TileError> for CliError {
    fn from(e: TileError) -> Self {
        CliError::Tile(e)
    }
}

impl From<RequestError> for CliError {
    fn from(e: RequestError) -> Self {
        CliError::Tile(TileError::Config(e))
    }
}
