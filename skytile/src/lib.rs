//! SkyTile - celestial sphere map tiles
//!
//! This library renders one rectangular tile of the sky, given a bounding box
//! in right ascension / declination (or in the unit-square Mercator projection
//! of it), a pixel size and an ordered list of content layers.
//!
//! # High-Level API
//!
//! ```
//! use skytile::request::{Bounds, TileRequest};
//! use skytile::output::OutputMode;
//!
//! let request = TileRequest::builder()
//!     .bounds(Bounds::Celestial { ra_min: 10.0, ra_max: 11.0, dec_min: 0.0, dec_max: 1.0 })
//!     .size(256, 256)
//!     .layer("solid")
//!     .layer("grid")
//!     .output(OutputMode::Png)
//!     .build()
//!     .unwrap();
//!
//! let mut png = Vec::new();
//! skytile::render_tile(&request, &mut png).unwrap();
//! assert_eq!(&png[1..4], b"PNG");
//! ```
//!
//! # Modules
//!
//! - [`projection`] - celestial ↔ Mercator ↔ pixel math and wraparound-aware drawing
//! - [`cache`] - compressed on-disk memoization of per-layer computations
//! - [`canvas`] - raster (tiny-skia) and vector (PDF) drawing backends
//! - [`render`] - renderer contract, built-in renderers and the registry
//! - [`pipeline`] - the layer compositing state machine
//! - [`output`] - PNG / JPEG / PDF / raw float encoding

pub mod cache;
pub mod canvas;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod projection;
pub mod render;
pub mod request;

pub use error::TileError;

use std::io::Write;

/// Version of the SkyTile library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render a prepared tile request and write the encoded result to `sink`.
///
/// Runs the compositing pipeline over every requested layer, then encodes
/// the canvas according to the request's output mode.
///
/// # Errors
///
/// Only fatal conditions are returned: a drawing backend failure or an
/// encoder/sink failure. Individual layer failures are logged and skipped.
pub fn render_tile<W: Write>(request: &request::TileRequest, sink: &mut W) -> Result<(), TileError> {
    tracing::info!(
        version = VERSION,
        layers = request.layers().len(),
        mode = ?request.output_mode(),
        content_type = request.output_mode().content_type(),
        "BEGIN tile"
    );

    let composition = pipeline::Compositor::new(request).run()?;
    let failed = composition
        .outcomes
        .iter()
        .filter(|(_, outcome)| *outcome != pipeline::LayerOutcome::Rendered)
        .count();
    output::encode(composition.rendered, sink)?;

    tracing::info!(skipped_layers = failed, "END tile");
    Ok(())
}
