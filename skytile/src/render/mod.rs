//! Content renderers and the layer registry.
//!
//! Every layer name in a request resolves, through a static table, to one
//! renderer of one of two kinds:
//!
//! ```text
//!                 ┌──────────────────┐
//!  layer name ──► │     registry     │
//!                 └────────┬─────────┘
//!                          │ RendererEntry
//!            ┌─────────────┴─────────────┐
//!            ▼                           ▼
//!   ┌─────────────────┐        ┌──────────────────┐
//!   │ VectorRenderer  │        │  RasterRenderer  │
//!   │ draws on the    │        │ fills its own    │
//!   │ shared canvas   │        │ zeroed Pixmap    │
//!   └─────────────────┘        └──────────────────┘
//! ```
//!
//! A renderer failure only loses that layer; the pipeline logs it and moves
//! on. Several names may map to the same renderer, which reads the requested
//! name from [`RenderContext::layer`] to vary its behaviour.

pub mod args;
mod catalog;
mod draw;
mod grid;
mod points;
mod registry;
mod solid;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cache::TileCache;
use crate::canvas::{Canvas, CanvasError, Pixmap};
use crate::output::FloatImage;
use crate::projection::ViewGeometry;

pub use args::{ArgError, LayerArgs};
pub use catalog::Star;
pub use registry::{lookup, names};

/// Errors that make a renderer give up on its layer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Arg(#[from] ArgError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Read-only state shared by every renderer of one request.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// The layer name as requested (aliases stay distinguishable).
    pub layer: &'a str,
    pub geometry: &'a ViewGeometry,
    pub args: &'a LayerArgs,
    pub cache: &'a TileCache,
    /// Default stroke width in pixels.
    pub line_width: f64,
}

/// Output buffers lent to a raster renderer for one call.
pub struct RasterTarget<'a> {
    /// Tile-sized, zeroed on entry, premultiplied RGBA.
    pub pixmap: &'a mut Pixmap,
    /// Float accumulation image, present only for raw output.
    pub raw: Option<&'a mut FloatImage>,
}

/// A renderer that draws directly on the shared canvas.
pub trait VectorRenderer: Sync {
    fn render(&self, canvas: &mut dyn Canvas, ctx: &RenderContext<'_>) -> Result<(), RenderError>;
}

/// A renderer that produces a raster layer composited by the pipeline.
pub trait RasterRenderer: Sync {
    fn render(&self, target: &mut RasterTarget<'_>, ctx: &RenderContext<'_>)
        -> Result<(), RenderError>;
}

/// One registered renderer.
#[derive(Clone, Copy)]
pub enum RendererEntry {
    Vector(&'static dyn VectorRenderer),
    Raster(&'static dyn RasterRenderer),
}

impl RendererEntry {
    pub fn is_raster(&self) -> bool {
        matches!(self, RendererEntry::Raster(_))
    }
}

impl std::fmt::Debug for RendererEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RendererEntry::Vector(_) => f.write_str("Vector"),
            RendererEntry::Raster(_) => f.write_str("Raster"),
        }
    }
}
