//! Drawing backends for tile output.
//!
//! Vector renderers draw through the [`Canvas`] trait, a small current-path
//! model (`move_to` / `line_to` / `stroke` / `fill`) shared by both backends:
//!
//! ```text
//! ┌──────────────────────┐
//! │   Vector renderers   │
//! │   &mut dyn Canvas    │
//! └──────────┬───────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//! ┌──────────┐ ┌──────────┐
//! │  Raster  │ │   PDF    │
//! │  Canvas  │ │  Canvas  │
//! │(tiny-skia│ │(printpdf)│
//! └──────────┘ └──────────┘
//! ```
//!
//! Raster renderers never see a canvas; they fill their own [`Pixmap`]
//! which the pipeline hands to [`Canvas::composite`].

mod path;
mod pdf;
mod raster;

pub use path::{PathRecorder, Shape};
pub use pdf::PdfCanvas;
pub use raster::RasterCanvas;

pub(crate) use raster::new_layer_pixmap;

pub use tiny_skia::Pixmap;

use thiserror::Error;

use crate::projection::PathSink;

/// Errors reported by a drawing backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    /// The backend could not allocate a surface of the requested size.
    #[error("Failed to allocate {width}×{height} surface")]
    Allocation { width: u32, height: u32 },

    /// The backend cannot paint a raster layer.
    #[error("Raster composite not supported by the {backend} canvas")]
    UnsupportedComposite { backend: &'static str },

    /// A composited layer does not match the canvas size.
    #[error("Layer size {actual_width}×{actual_height} does not match canvas {width}×{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// Writing the finished document failed.
    #[error("Failed to write PDF: {0}")]
    Pdf(String),

    /// A path operation received a non-finite coordinate. The canvas
    /// ignores every drawing call after this.
    #[error("Non-finite coordinate passed to {op}")]
    NonFinite { op: &'static str },
}

impl CanvasError {
    /// Whether this error leaves the backend unusable for the rest of the request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CanvasError::Allocation { .. } | CanvasError::Pdf(_) | CanvasError::NonFinite { .. }
        )
    }
}

/// Sticky error state shared by the backends.
///
/// The first failure is kept; once set, the canvas stops drawing.
#[derive(Debug, Default, Clone)]
pub(crate) struct Status {
    error: Option<CanvasError>,
}

impl Status {
    pub(crate) fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Record `op` as failed unless every value is finite. Returns whether
    /// the canvas may still draw.
    pub(crate) fn check(&mut self, op: &'static str, values: &[f64]) -> bool {
        if self.error.is_none() && !values.iter().all(|v| v.is_finite()) {
            tracing::error!(op, "Non-finite coordinate, canvas disabled");
            self.error = Some(CanvasError::NonFinite { op });
        }
        self.is_ok()
    }

    pub(crate) fn result(&self) -> Result<(), CanvasError> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// RGBA colour with components in [0, 1], not premultiplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    /// Create a colour; components are used as given.
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour from red, green, blue.
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// The same colour with every component clamped to [0, 1] (NaN → 0).
    pub fn clamped(self) -> Self {
        let c = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self::new(c(self.r), c(self.g), c(self.b), c(self.a))
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::BLACK
    }
}

/// A drawing surface covering exactly one tile.
///
/// Paths are built with the [`PathSink`] methods in pixel coordinates
/// (origin top-left, y down) and consumed by [`Canvas::stroke`] or
/// [`Canvas::fill`], which also clear the current path.
pub trait Canvas: PathSink {
    /// Surface width in pixels.
    fn width(&self) -> u32;

    /// Surface height in pixels.
    fn height(&self) -> u32;

    /// Set the source colour for subsequent stroke, fill and paint operations.
    fn set_color(&mut self, color: Rgba);

    /// Set the stroke width in pixels.
    fn set_line_width(&mut self, width: f64);

    /// Close the current sub-path.
    fn close_path(&mut self);

    /// Add a full circle as its own closed sub-path.
    fn circle(&mut self, cx: f64, cy: f64, radius: f64);

    /// Discard the current path without drawing it.
    fn new_path(&mut self);

    /// Stroke and clear the current path.
    fn stroke(&mut self);

    /// Fill and clear the current path.
    fn fill(&mut self);

    /// Cover the whole surface with the source colour.
    fn paint(&mut self);

    /// Paint a tile-sized raster layer over the surface (source-over).
    fn composite(&mut self, layer: &Pixmap) -> Result<(), CanvasError>;

    /// Report a fatal backend condition, if one has occurred.
    fn status(&self) -> Result<(), CanvasError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_clamped() {
        let c = Rgba::new(-0.5, 0.5, 2.0, f64::NAN).clamped();
        assert_eq!(c, Rgba::new(0.0, 0.5, 1.0, 0.0));
    }

    #[test]
    fn test_canvas_error_fatality() {
        assert!(CanvasError::Allocation {
            width: 1,
            height: 1
        }
        .is_fatal());
        assert!(CanvasError::Pdf("disk full".to_string()).is_fatal());
        assert!(!CanvasError::UnsupportedComposite { backend: "pdf" }.is_fatal());
        assert!(CanvasError::NonFinite { op: "line_to" }.is_fatal());
    }

    #[test]
    fn test_status_keeps_first_error() {
        let mut status = Status::default();
        assert!(status.check("move_to", &[1.0, 2.0]));
        assert!(status.result().is_ok());

        assert!(!status.check("line_to", &[f64::NAN, 0.0]));
        assert!(!status.check("circle", &[f64::INFINITY]));
        assert!(!status.check("move_to", &[0.0, 0.0]));
        assert_eq!(
            status.result(),
            Err(CanvasError::NonFinite { op: "line_to" })
        );
    }

    #[test]
    fn test_canvas_error_display() {
        let err = CanvasError::Allocation {
            width: 100,
            height: 200,
        };
        assert_eq!(err.to_string(), "Failed to allocate 100×200 surface");
    }
}
