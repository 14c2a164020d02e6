//! Layer compositing.
//!
//! The compositor walks the layer list of one request, bottom to top:
//!
//! ```text
//!  Init ──► PerLayer(0) ──► PerLayer(1) ──► ... ──► Done
//!   │           │
//!   │           ├─ vector: draw on the shared canvas
//!   │           └─ raster: fill a zeroed layer pixmap, composite it
//!   │
//!   └─ allocate canvas (raster or PDF) and, for raw output, the float image
//! ```
//!
//! A layer that fails is logged and skipped; `Done` is reached whatever
//! happens to individual layers. Only a fatal backend condition, polled after
//! every layer, aborts the request.

use crate::canvas::{new_layer_pixmap, Canvas, CanvasError, PdfCanvas, RasterCanvas};
use crate::output::{FloatImage, OutputMode, Rendered};
use crate::render::{self, RasterTarget, RenderContext, RenderError, RendererEntry};
use crate::request::TileRequest;
use crate::TileError;

/// Where the compositor is in its walk over the layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    PerLayer(usize),
    Done,
}

/// What happened to one requested layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerOutcome {
    Rendered,
    /// No renderer is registered under the name.
    Unknown,
    /// The renderer or the composite step failed.
    Failed(String),
}

/// Result of a render: the finished surface plus one outcome per layer.
pub struct Composition {
    pub rendered: Rendered,
    pub outcomes: Vec<(String, LayerOutcome)>,
}

enum Surface {
    Raster(RasterCanvas),
    Pdf(PdfCanvas),
}

impl Surface {
    fn canvas(&mut self) -> &mut dyn Canvas {
        match self {
            Surface::Raster(c) => c,
            Surface::Pdf(c) => c,
        }
    }
}

/// Resolves a layer name to its renderer.
type Lookup = fn(&str) -> Option<RendererEntry>;

/// Executes the layer list of one request against a single canvas.
pub struct Compositor<'a> {
    request: &'a TileRequest,
    stage: Stage,
    lookup: Lookup,
}

impl<'a> Compositor<'a> {
    pub fn new(request: &'a TileRequest) -> Self {
        Self::with_lookup(request, render::lookup)
    }

    fn with_lookup(request: &'a TileRequest, lookup: Lookup) -> Self {
        Self {
            request,
            stage: Stage::Init,
            lookup,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Render every layer and return the finished surface.
    ///
    /// # Errors
    ///
    /// Returns `TileError::Backend` if the canvas cannot be allocated or
    /// reports a fatal condition. Individual layer failures are not errors.
    pub fn run(&mut self) -> Result<Composition, TileError> {
        let geom = self.request.geometry();
        let (width, height) = (geom.width(), geom.height());
        let mode = self.request.output_mode();

        self.stage = Stage::Init;
        let mut surface = if mode.is_vector() {
            Surface::Pdf(PdfCanvas::new(width, height))
        } else {
            Surface::Raster(RasterCanvas::new(width, height)?)
        };
        let mut raw = match mode {
            OutputMode::RawFloat => Some(
                FloatImage::new(width, height).ok_or(CanvasError::Allocation { width, height })?,
            ),
            _ => None,
        };

        if self.request.layers().is_empty() {
            tracing::warn!("Request has no layers; tile stays transparent");
        }

        let mut outcomes = Vec::with_capacity(self.request.layers().len());
        for (index, name) in self.request.layers().iter().enumerate() {
            self.stage = Stage::PerLayer(index);
            let outcome = self.render_layer(name, &mut surface, raw.as_mut())?;
            if let Err(e) = surface.canvas().status() {
                tracing::error!(layer = %name, error = %e, "Canvas failed, aborting render");
                return Err(TileError::Backend(e));
            }
            outcomes.push((name.clone(), outcome));
        }
        self.stage = Stage::Done;

        let rendered = match (surface, raw) {
            (_, Some(image)) => Rendered::Raw(image),
            (Surface::Pdf(canvas), None) => Rendered::Pdf(canvas),
            (Surface::Raster(canvas), None) if mode == OutputMode::Jpeg => {
                Rendered::Jpeg(canvas.into_pixmap())
            }
            (Surface::Raster(canvas), None) => Rendered::Png(canvas.into_pixmap()),
        };
        Ok(Composition { rendered, outcomes })
    }

    fn render_layer(
        &self,
        name: &str,
        surface: &mut Surface,
        raw: Option<&mut FloatImage>,
    ) -> Result<LayerOutcome, TileError> {
        let Some(entry) = (self.lookup)(name) else {
            tracing::warn!(layer = name, "Unknown layer, skipping");
            return Ok(LayerOutcome::Unknown);
        };

        let ctx = RenderContext {
            layer: name,
            geometry: self.request.geometry(),
            args: self.request.args(),
            cache: self.request.cache(),
            line_width: self.request.line_width(),
        };

        let result = match entry {
            RendererEntry::Vector(renderer) => renderer.render(surface.canvas(), &ctx),
            RendererEntry::Raster(renderer) => {
                let geom = self.request.geometry();
                let mut layer = new_layer_pixmap(geom.width(), geom.height())?;
                let mut target = RasterTarget {
                    pixmap: &mut layer,
                    raw,
                };
                renderer
                    .render(&mut target, &ctx)
                    .and_then(|()| surface.canvas().composite(&layer).map_err(RenderError::from))
            }
        };

        match result {
            Ok(()) => {
                tracing::info!(layer = name, kind = ?entry, "Layer rendered");
                Ok(LayerOutcome::Rendered)
            }
            Err(RenderError::Canvas(e)) if e.is_fatal() => {
                tracing::error!(layer = name, error = %e, "Fatal canvas error, aborting render");
                Err(TileError::Backend(e))
            }
            Err(e) => {
                tracing::warn!(layer = name, error = %e, "Layer failed, skipping");
                Ok(LayerOutcome::Failed(e.to_string()))
            }
        }
    }
}
