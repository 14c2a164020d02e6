//! Validated tile requests.
//!
//! A [`TileRequest`] is assembled once with [`TileRequest::builder`] and
//! then only read. Everything that can make a request unusable (missing or
//! degenerate bounds, oversized tiles, contradictory output flags) is
//! rejected by [`TileRequestBuilder::build`], before any rendering starts.

use std::path::PathBuf;

use thiserror::Error;

use crate::cache::TileCache;
use crate::output::{OutputMode, OutputSelection};
use crate::projection::{GeometryError, ViewGeometry, MAX_TILE_DIMENSION};
use crate::render::LayerArgs;

/// Stroke width used when neither the caller nor the config sets one.
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// Errors that reject a request before rendering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("Tile bounds not specified")]
    MissingBounds,

    #[error("Tile size not specified")]
    MissingSize,

    #[error("Tile size {width}×{height} exceeds the limit of {limit}")]
    TooLarge { width: u32, height: u32, limit: u32 },

    #[error("Invalid line width {0}")]
    InvalidLineWidth(f64),

    #[error("Conflicting output formats requested: {0}")]
    ConflictingOutputs(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// The tile rectangle, in one of the two accepted coordinate systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    /// Degrees of right ascension and declination.
    Celestial {
        ra_min: f64,
        ra_max: f64,
        dec_min: f64,
        dec_max: f64,
    },
    /// Unit-square Mercator coordinates.
    Mercator {
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },
}

/// Immutable description of one tile to render.
#[derive(Debug, Clone)]
pub struct TileRequest {
    geometry: ViewGeometry,
    layers: Vec<String>,
    output_mode: OutputMode,
    cache: TileCache,
    line_width: f64,
    args: LayerArgs,
}

impl TileRequest {
    pub fn builder() -> TileRequestBuilder {
        TileRequestBuilder::default()
    }

    pub fn geometry(&self) -> &ViewGeometry {
        &self.geometry
    }

    /// Layer names, bottom first.
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    pub fn args(&self) -> &LayerArgs {
        &self.args
    }
}

/// Builder for [`TileRequest`].
#[derive(Debug, Clone)]
pub struct TileRequestBuilder {
    bounds: Option<Bounds>,
    width: Option<u32>,
    height: Option<u32>,
    layers: Vec<String>,
    output: OutputSelection,
    cache_dir: Option<PathBuf>,
    line_width: f64,
    args: LayerArgs,
    max_dimension: u32,
}

impl Default for TileRequestBuilder {
    fn default() -> Self {
        Self {
            bounds: None,
            width: None,
            height: None,
            layers: Vec::new(),
            output: OutputSelection::default(),
            cache_dir: None,
            line_width: DEFAULT_LINE_WIDTH,
            args: LayerArgs::new(),
            max_dimension: MAX_TILE_DIMENSION,
        }
    }
}

impl TileRequestBuilder {
    pub fn bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Set width and height in pixels.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Append one layer on top of those already added.
    pub fn layer(mut self, name: impl Into<String>) -> Self {
        self.layers.push(name.into());
        self
    }

    pub fn layers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layers.extend(names.into_iter().map(Into::into));
        self
    }

    /// Select a single output mode.
    pub fn output(mut self, mode: OutputMode) -> Self {
        self.output = match mode {
            OutputMode::Png => OutputSelection::default(),
            OutputMode::Jpeg => OutputSelection {
                jpeg: true,
                ..Default::default()
            },
            OutputMode::Pdf => OutputSelection {
                pdf: true,
                ..Default::default()
            },
            OutputMode::RawFloat => OutputSelection {
                raw: true,
                ..Default::default()
            },
        };
        self
    }

    /// Use raw output flags; conflicts are reported by [`build`](Self::build).
    pub fn output_selection(mut self, selection: OutputSelection) -> Self {
        self.output = selection;
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }

    pub fn args(mut self, args: LayerArgs) -> Self {
        self.args = args;
        self
    }

    /// Append one free-form layer argument line.
    pub fn arg(mut self, line: impl Into<String>) -> Self {
        self.args.push(line);
        self
    }

    /// Lower the size cap below [`MAX_TILE_DIMENSION`]. Larger values are ignored.
    pub fn max_dimension(mut self, limit: u32) -> Self {
        self.max_dimension = limit.min(MAX_TILE_DIMENSION);
        self
    }

    /// Validate everything and produce the request.
    ///
    /// # Errors
    ///
    /// Returns `RequestError` for missing bounds or size, a size above the
    /// cap, a non-positive line width, conflicting output flags, or bounds
    /// that do not describe a proper tile.
    pub fn build(self) -> Result<TileRequest, RequestError> {
        let bounds = self.bounds.ok_or(RequestError::MissingBounds)?;
        let (Some(width), Some(height)) = (self.width, self.height) else {
            return Err(RequestError::MissingSize);
        };
        if width > self.max_dimension || height > self.max_dimension {
            return Err(RequestError::TooLarge {
                width,
                height,
                limit: self.max_dimension,
            });
        }
        if !(self.line_width.is_finite() && self.line_width > 0.0) {
            return Err(RequestError::InvalidLineWidth(self.line_width));
        }
        let output_mode = self.output.resolve()?;

        let geometry = match bounds {
            Bounds::Celestial {
                ra_min,
                ra_max,
                dec_min,
                dec_max,
            } => ViewGeometry::new(ra_min, ra_max, dec_min, dec_max, width, height)?,
            Bounds::Mercator {
                x_min,
                x_max,
                y_min,
                y_max,
            } => ViewGeometry::from_mercator(x_min, x_max, y_min, y_max, width, height)?,
        };

        let cache = match self.cache_dir {
            Some(dir) => TileCache::new(dir),
            None => TileCache::disabled(),
        };

        Ok(TileRequest {
            geometry,
            layers: self.layers,
            output_mode,
            cache,
            line_width: self.line_width,
            args: self.args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn celestial() -> Bounds {
        Bounds::Celestial {
            ra_min: 10.0,
            ra_max: 11.0,
            dec_min: 0.0,
            dec_max: 1.0,
        }
    }

    #[test]
    fn test_build_minimal() {
        let request = TileRequest::builder()
            .bounds(celestial())
            .size(256, 256)
            .layer("solid")
            .layer("grid")
            .build()
            .unwrap();

        assert_eq!(request.layers(), &["solid".to_string(), "grid".to_string()]);
        assert_eq!(request.output_mode(), OutputMode::Png);
        assert_eq!(request.line_width(), DEFAULT_LINE_WIDTH);
        assert!(!request.cache().is_enabled());
        assert_eq!(request.geometry().zoom_level(), 8);
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            TileRequest::builder().size(1, 1).build().unwrap_err(),
            RequestError::MissingBounds
        );
        assert_eq!(
            TileRequest::builder()
                .bounds(celestial())
                .width(10)
                .build()
                .unwrap_err(),
            RequestError::MissingSize
        );
    }

    #[test]
    fn test_size_cap() {
        let err = TileRequest::builder()
            .bounds(celestial())
            .size(4097, 10)
            .build()
            .unwrap_err();
        assert!(matches!(err, RequestError::TooLarge { limit: 4096, .. }));

        let err = TileRequest::builder()
            .bounds(celestial())
            .size(600, 10)
            .max_dimension(512)
            .build()
            .unwrap_err();
        assert!(matches!(err, RequestError::TooLarge { limit: 512, .. }));

        // The cap can only go down
        let builder = TileRequest::builder().max_dimension(10_000);
        assert_eq!(builder.max_dimension, MAX_TILE_DIMENSION);
    }

    #[test]
    fn test_zero_size_is_geometry_error() {
        let err = TileRequest::builder()
            .bounds(celestial())
            .size(0, 10)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Geometry(GeometryError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_degenerate_bounds() {
        let err = TileRequest::builder()
            .bounds(Bounds::Celestial {
                ra_min: 10.0,
                ra_max: 10.0,
                dec_min: 0.0,
                dec_max: 1.0,
            })
            .size(10, 10)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Geometry(GeometryError::InvalidRaRange { .. })
        ));
    }

    #[test]
    fn test_conflicting_outputs() {
        let err = TileRequest::builder()
            .bounds(celestial())
            .size(10, 10)
            .output_selection(OutputSelection {
                jpeg: false,
                pdf: true,
                raw: true,
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, RequestError::ConflictingOutputs(_)));
    }

    #[test]
    fn test_mercator_bounds() {
        let request = TileRequest::builder()
            .bounds(Bounds::Mercator {
                x_min: 0.25,
                x_max: 0.5,
                y_min: 0.5,
                y_max: 0.75,
            })
            .size(256, 256)
            .build()
            .unwrap();
        let (x_min, x_max) = request.geometry().merc_x_range();
        assert!((x_min - 0.25).abs() < 1e-9);
        assert!((x_max - 0.5).abs() < 1e-9);
        assert_eq!(request.geometry().zoom_level(), 2);
    }

    #[test]
    fn test_options_carried() {
        let request = TileRequest::builder()
            .bounds(celestial())
            .size(10, 10)
            .output(OutputMode::Pdf)
            .cache_dir("/tmp/skytile-cache")
            .line_width(0.5)
            .arg("grid_color 1 0 0 1")
            .build()
            .unwrap();
        assert_eq!(request.output_mode(), OutputMode::Pdf);
        assert!(request.cache().is_enabled());
        assert_eq!(request.line_width(), 0.5);
        assert_eq!(request.args().len(), 1);
    }

    #[test]
    fn test_invalid_line_width() {
        let err = TileRequest::builder()
            .bounds(celestial())
            .size(10, 10)
            .line_width(0.0)
            .build()
            .unwrap_err();
        assert_eq!(err, RequestError::InvalidLineWidth(0.0));
    }
}
