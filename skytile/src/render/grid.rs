//! RA/Dec coordinate grid.

use super::{RenderContext, RenderError, VectorRenderer};
use crate::canvas::{Canvas, Rgba};
use crate::projection::{dec_to_merc_y, draw_merc_segment, ra_to_merc_x};

/// Candidate grid steps in degrees, coarsest first.
const STEPS: [f64; 17] = [
    90.0, 45.0, 30.0, 15.0, 10.0, 5.0, 2.0, 1.0, 0.5, 0.2, 0.1, 0.05, 0.02, 0.01, 0.005, 0.002,
    0.001,
];

/// Upper bound on lines per direction, whatever the arguments say.
const MAX_LINES: i64 = 1000;

const DEFAULT_COLOR: Rgba = Rgba::new(1.0, 1.0, 1.0, 0.5);

/// Grid step for a zoom level: roughly four lines across a 256-pixel tile.
pub fn grid_spacing(zoom: i32) -> f64 {
    let target = 90.0 / 2f64.powi(zoom);
    STEPS
        .iter()
        .copied()
        .find(|&step| step <= target)
        .unwrap_or(STEPS[STEPS.len() - 1])
}

/// Draws lines of constant RA and Dec.
///
/// Arguments: `grid_color r g b a`, `grid_spacing deg` (overrides the
/// zoom-based step), `grid_linewidth px`.
pub struct GridRenderer;

impl VectorRenderer for GridRenderer {
    fn render(&self, canvas: &mut dyn Canvas, ctx: &RenderContext<'_>) -> Result<(), RenderError> {
        let geom = ctx.geometry;
        let color = ctx
            .args
            .first_rgba_of_type("grid_color")?
            .unwrap_or(DEFAULT_COLOR);
        let step = ctx
            .args
            .first_double_of_type("grid_spacing", grid_spacing(geom.zoom_level()));
        if !(step.is_finite() && step > 0.0) {
            return Err(super::ArgError::Invalid {
                line: ctx.args.first_of_type("grid_spacing").unwrap_or("").to_string(),
                reason: "spacing must be positive".to_string(),
            }
            .into());
        }
        let width = ctx.args.first_double_of_type("grid_linewidth", ctx.line_width);

        canvas.set_color(color);
        canvas.set_line_width(width);

        let (x_min, x_max) = geom.merc_x_range();
        let (y_min, y_max) = geom.merc_y_range();

        for ra in multiples(geom.ra_min(), geom.ra_max(), step) {
            let mx = ra_to_merc_x(ra);
            draw_merc_segment(canvas, geom, mx, y_min, mx, y_max);
        }
        for dec in multiples(geom.dec_min(), geom.dec_max(), step) {
            if dec.abs() >= 90.0 {
                continue;
            }
            let my = dec_to_merc_y(dec);
            draw_merc_segment(canvas, geom, x_min, my, x_max, my);
        }
        canvas.stroke();

        tracing::trace!(layer = ctx.layer, step, "Drew grid");
        Ok(())
    }
}

/// Multiples of `step` within `[lo, hi]`.
fn multiples(lo: f64, hi: f64, step: f64) -> impl Iterator<Item = f64> {
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    let last = last.min(first.saturating_add(MAX_LINES));
    (first..=last).map(move |k| k as f64 * step)
}
