//! Top-level error type.
//!
//! Only failures that end the whole request surface here. Layer failures,
//! cache misses and cache write failures are logged where they happen and
//! never reach the caller.

use std::io;

use thiserror::Error;

use crate::canvas::CanvasError;
use crate::output::OutputError;
use crate::projection::GeometryError;
use crate::request::RequestError;

/// Errors returned by [`render_tile`](crate::render_tile).
#[derive(Debug, Error)]
pub enum TileError {
    /// The request was rejected before rendering started.
    #[error("Invalid tile request: {0}")]
    Config(#[from] RequestError),

    /// The drawing backend failed in a way that invalidates the tile.
    #[error("Rendering backend failed: {0}")]
    Backend(#[from] CanvasError),

    /// Encoding or writing the finished tile failed.
    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<GeometryError> for TileError {
    fn from(e: GeometryError) -> Self {
        TileError::Config(RequestError::Geometry(e))
    }
}

impl TileError {
    /// Whether the request itself was at fault.
    pub fn is_config(&self) -> bool {
        matches!(self, TileError::Config(_))
    }

    /// Whether the drawing backend failed, during rendering or while writing a PDF.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            TileError::Backend(_) | TileError::Output(OutputError::Canvas(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let config: TileError = RequestError::MissingBounds.into();
        assert!(config.is_config());
        assert!(!config.is_backend());

        let geometry: TileError = GeometryError::InvalidRaRange { min: 1.0, max: 0.0 }.into();
        assert!(geometry.is_config());

        let backend: TileError = CanvasError::Allocation {
            width: 1,
            height: 1,
        }
        .into();
        assert!(backend.is_backend());
        assert!(!backend.is_config());

        let pdf: TileError = OutputError::Canvas(CanvasError::Pdf("broken".into())).into();
        assert!(pdf.is_backend());
    }

    #[test]
    fn test_display_includes_cause() {
        let err: TileError = RequestError::ConflictingOutputs("pdf + raw".into()).into();
        assert_eq!(
            err.to_string(),
            "Invalid tile request: Conflicting output formats requested: pdf + raw"
        );
    }
}
