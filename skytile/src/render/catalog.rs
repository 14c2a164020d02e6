//! Star catalog layer.
//!
//! The catalog is a text file with one `ra dec mag` triple per line (degrees,
//! magnitudes); blank lines and `#` comments are skipped. Parsing a large
//! catalog is the expensive part of the layer, so the parsed stars are kept
//! in the tile cache as a bincode blob, keyed by file name, size and
//! modification time:
//!
//! ```text
//! catalog_file /data/hip.txt  ──►  <cache>/catalog/hip.txt-4194304-1718031201
//! ```

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Transform};

use super::args::ArgError;
use super::{RasterRenderer, RasterTarget, RenderContext, RenderError};
use crate::cache::TileCache;
use crate::canvas::Rgba;
use crate::projection::celestial_to_merc;

/// Cache domain holding parsed catalogs.
pub const CATALOG_DOMAIN: &str = "catalog";

/// Magnitude limit of the `brightstars` alias when none is given.
pub const BRIGHT_STAR_LIMIT: f64 = 6.0;

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub ra: f64,
    pub dec: f64,
    pub mag: f32,
}

impl Star {
    /// Linear flux relative to a magnitude-zero star.
    pub fn flux(&self) -> f32 {
        10f32.powf(-0.4 * self.mag)
    }
}

/// Marker radius in pixels: brighter stars are drawn larger.
fn star_radius(mag: f32) -> f32 {
    (1.0 + 0.6 * (BRIGHT_STAR_LIMIT as f32 - mag)).clamp(0.5, 6.0)
}

/// Renders catalog stars into the layer buffer.
///
/// Arguments: `catalog_file path` (required), `catalog_maglim mag`,
/// `catalog_color r g b a`. Registered as `catalog` (no magnitude limit by
/// default) and `brightstars` (limit [`BRIGHT_STAR_LIMIT`]).
pub struct CatalogRenderer;

impl RasterRenderer for CatalogRenderer {
    fn render(
        &self,
        target: &mut RasterTarget<'_>,
        ctx: &RenderContext<'_>,
    ) -> Result<(), RenderError> {
        let geom = ctx.geometry;
        let path = ctx
            .args
            .all_of_type("catalog_file ")
            .first()
            .map(|p| PathBuf::from(p.trim()))
            .ok_or(ArgError::Missing {
                keyword: "catalog_file",
            })?;
        let default_limit = if ctx.layer == "brightstars" {
            BRIGHT_STAR_LIMIT
        } else {
            f64::INFINITY
        };
        let limit = ctx.args.first_double_of_type("catalog_maglim", default_limit);
        let color = ctx
            .args
            .first_rgba_of_type("catalog_color")?
            .unwrap_or(Rgba::WHITE)
            .clamped();

        let stars = load_catalog(&path, ctx.cache)?;

        let mut pb = PathBuilder::new();
        let mut drawn = 0usize;
        for star in stars.iter().filter(|s| f64::from(s.mag) <= limit) {
            let (mx, my) = celestial_to_merc(star.ra, star.dec);
            let radius = star_radius(star.mag);
            let margin = radius.ceil() as i32 + 1;

            // Stars near the 0h seam may show up one turn away
            for offset in [0.0, 1.0, -1.0] {
                let (x, y) = geom.merc_to_pixel_f(mx + offset, my);
                let (px, py) = (x.floor() as i32, y.floor() as i32);
                if !geom.in_tile_with_margin(px, py, margin) {
                    continue;
                }
                pb.push_circle(x as f32, y as f32, radius);
                drawn += 1;

                if let Some(raw) = target.raw.as_deref_mut() {
                    let flux = star.flux();
                    raw.accumulate(
                        i64::from(px),
                        i64::from(py),
                        [
                            flux * color.r as f32,
                            flux * color.g as f32,
                            flux * color.b as f32,
                        ],
                    );
                }
            }
        }

        if let Some(shape) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color(
                Color::from_rgba(color.r as f32, color.g as f32, color.b as f32, color.a as f32)
                    .unwrap_or(Color::WHITE),
            );
            paint.anti_alias = true;
            target
                .pixmap
                .fill_path(&shape, &paint, FillRule::Winding, Transform::identity(), None);
        }

        tracing::debug!(
            layer = ctx.layer,
            catalog = %path.display(),
            total = stars.len(),
            drawn,
            "Rendered catalog stars"
        );
        Ok(())
    }
}

/// Cache key for a catalog file: sanitized name, size and mtime.
pub fn catalog_key(path: &Path, metadata: &Metadata) -> String {
    let name: String = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog".to_string())
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{}-{}-{}", name, metadata.len(), mtime)
}

/// Load a catalog, preferring the parsed copy in the cache.
pub fn load_catalog(path: &Path, cache: &TileCache) -> Result<Vec<Star>, RenderError> {
    let io_err = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    let metadata = std::fs::metadata(path).map_err(io_err)?;
    let key = catalog_key(path, &metadata);

    if let Some(bytes) = cache.load(CATALOG_DOMAIN, &key) {
        match bincode::deserialize::<Vec<Star>>(&bytes) {
            Ok(stars) => return Ok(stars),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cached catalog");
            }
        }
    }

    let text = std::fs::read_to_string(path).map_err(io_err)?;
    let stars = parse_catalog(path, &text)?;
    tracing::info!(path = %path.display(), stars = stars.len(), "Parsed star catalog");

    match bincode::serialize(&stars) {
        Ok(bytes) => {
            if let Err(e) = cache.save(CATALOG_DOMAIN, &key, &bytes) {
                tracing::warn!(key = %key, error = %e, "Failed to cache parsed catalog");
            }
        }
        Err(e) => tracing::warn!(error = %e, "Failed to serialize catalog"),
    }
    Ok(stars)
}

fn parse_catalog(path: &Path, text: &str) -> Result<Vec<Star>, RenderError> {
    let mut stars = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parse_error = |reason: String| RenderError::Parse {
            path: path.to_path_buf(),
            line: i + 1,
            reason,
        };
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [ra, dec, mag] = fields.as_slice() else {
            return Err(parse_error(format!(
                "expected 'ra dec mag', got {} fields",
                fields.len()
            )));
        };
        let num = |t: &str| {
            t.parse::<f64>()
                .map_err(|_| parse_error(format!("'{}' is not a number", t)))
        };
        stars.push(Star {
            ra: num(*ra)?,
            dec: num(*dec)?,
            mag: num(*mag)? as f32,
        });
    }
    Ok(stars)
}
