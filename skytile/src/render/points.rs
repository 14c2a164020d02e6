//! Point markers from `point ra dec` arguments.

use super::args::{doubles, ArgError};
use super::{RenderContext, RenderError, VectorRenderer};
use crate::canvas::{Canvas, Rgba};

const DEFAULT_RADIUS: f64 = 4.0;

/// Draws one marker per `point` argument.
///
/// As `points` each marker is an open circle; as `userdot` it is a filled
/// dot. Colour comes from `point_color r g b a` (default green for circles,
/// red for dots), size from `point_radius px`.
pub struct PointsRenderer;

impl VectorRenderer for PointsRenderer {
    fn render(&self, canvas: &mut dyn Canvas, ctx: &RenderContext<'_>) -> Result<(), RenderError> {
        let geom = ctx.geometry;
        let filled = ctx.layer == "userdot";
        let default_color = if filled {
            Rgba::rgb(1.0, 0.0, 0.0)
        } else {
            Rgba::rgb(0.0, 1.0, 0.0)
        };
        let color = ctx
            .args
            .first_rgba_of_type("point_color")?
            .unwrap_or(default_color);
        let radius = ctx.args.first_double_of_type("point_radius", DEFAULT_RADIUS);
        // Nothing larger than the tile diagonal can be told apart from a fill
        let max_radius = f64::from(geom.width()).hypot(f64::from(geom.height()));
        if !(radius.is_finite() && radius > 0.0 && radius <= max_radius) {
            return Err(ArgError::Invalid {
                line: ctx.args.first_of_type("point_radius").unwrap_or("").to_string(),
                reason: format!("radius must be in (0, {:.0}]", max_radius),
            }
            .into());
        }

        let mut positions = Vec::new();
        for line in ctx.args.lines().iter().filter(|l| l.starts_with("point ")) {
            match doubles(line).as_slice() {
                &[ra, dec] if ra.is_finite() && dec.is_finite() => positions.push((ra, dec)),
                _ => {
                    return Err(ArgError::Invalid {
                        line: line.clone(),
                        reason: "expected ra dec".to_string(),
                    }
                    .into())
                }
            }
        }

        canvas.set_color(color);
        canvas.set_line_width(ctx.line_width);

        let margin = (radius.ceil() + 1.0) as i32;
        let mut drawn = 0;
        for (ra, dec) in positions {
            let (x, y) = geom.celestial_to_pixel_f(ra, dec);
            let visible = x.is_finite()
                && y.is_finite()
                && geom.in_tile_with_margin(x.floor() as i32, y.floor() as i32, margin);
            if !visible {
                continue;
            }
            canvas.circle(x, y, radius);
            drawn += 1;
        }
        if filled {
            canvas.fill();
        } else {
            canvas.stroke();
        }

        tracing::trace!(layer = ctx.layer, drawn, "Drew point markers");
        Ok(())
    }
}
