//! Caller-supplied drawing commands.
//!
//! Each `draw` argument line holds one command, executed in order:
//!
//! ```text
//! draw color r g b [a]         draw color <r|b|m|y|g|c|w|k>
//! draw linewidth px
//! draw moveto ra dec           draw lineto ra dec
//! draw geodesic ra1 dec1 ra2 dec2 [segments]
//! draw circle ra dec radius_px
//! draw close | stroke | fill
//! ```
//!
//! A path left open after the last command is discarded.

use super::args::{parse_color_code, ArgError};
use super::{RenderContext, RenderError, VectorRenderer};
use crate::canvas::{Canvas, Rgba};
use crate::projection::draw_geodesic;

const DEFAULT_GEODESIC_SEGMENTS: usize = 32;

/// Most vertices a single geodesic may be split into.
pub const MAX_GEODESIC_SEGMENTS: usize = 10_000;

/// Executes `draw` commands against the canvas.
pub struct DrawRenderer;

impl VectorRenderer for DrawRenderer {
    fn render(&self, canvas: &mut dyn Canvas, ctx: &RenderContext<'_>) -> Result<(), RenderError> {
        canvas.set_color(Rgba::WHITE);
        canvas.set_line_width(ctx.line_width);

        let commands = ctx.args.all_of_type("draw ");
        for command in &commands {
            execute(canvas, ctx, command)?;
        }
        canvas.new_path();

        tracing::trace!(layer = ctx.layer, commands = commands.len(), "Executed draw commands");
        Ok(())
    }
}

fn execute(canvas: &mut dyn Canvas, ctx: &RenderContext<'_>, command: &str) -> Result<(), RenderError> {
    let geom = ctx.geometry;
    let mut tokens = command.split_whitespace();
    let verb = tokens.next().unwrap_or("");
    let operands: Vec<&str> = tokens.collect();

    let invalid = |reason: &str| ArgError::Invalid {
        line: format!("draw {}", command),
        reason: reason.to_string(),
    };
    let numbers = || -> Result<Vec<f64>, ArgError> {
        operands
            .iter()
            .map(|t| match t.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(invalid(&format!("'{}' is not a finite number", t))),
            })
            .collect()
    };
    let to_pixel = |ra: f64, dec: f64| -> Result<(f64, f64), ArgError> {
        let (x, y) = geom.celestial_to_pixel_f(ra, dec);
        if x.is_finite() && y.is_finite() {
            Ok((x, y))
        } else {
            Err(invalid("position out of range"))
        }
    };

    match verb {
        "color" => {
            let color = match operands.as_slice() {
                [code] if code.chars().count() == 1 => code
                    .chars()
                    .next()
                    .and_then(parse_color_code)
                    .ok_or_else(|| invalid("unknown colour code"))?,
                _ => match numbers()?.as_slice() {
                    &[r, g, b] => Rgba::rgb(r, g, b),
                    &[r, g, b, a] => Rgba::new(r, g, b, a),
                    _ => return Err(invalid("expected 3 or 4 numbers").into()),
                },
            };
            canvas.set_color(color);
        }
        "linewidth" => match numbers()?.as_slice() {
            &[w] if w > 0.0 => canvas.set_line_width(w),
            _ => return Err(invalid("expected one positive width").into()),
        },
        "moveto" | "lineto" => match numbers()?.as_slice() {
            &[ra, dec] => {
                let (x, y) = to_pixel(ra, dec)?;
                if verb == "moveto" {
                    canvas.move_to(x, y);
                } else {
                    canvas.line_to(x, y);
                }
            }
            _ => return Err(invalid("expected ra dec").into()),
        },
        "geodesic" => {
            let nums = numbers()?;
            let (ends, segments) = match nums.as_slice() {
                &[a, b, c, d] => ([a, b, c, d], DEFAULT_GEODESIC_SEGMENTS),
                &[a, b, c, d, n] if (2.0..=MAX_GEODESIC_SEGMENTS as f64).contains(&n) => {
                    ([a, b, c, d], n as usize)
                }
                _ => {
                    return Err(invalid(&format!(
                        "expected ra1 dec1 ra2 dec2 [segments], segments in 2..={}",
                        MAX_GEODESIC_SEGMENTS
                    ))
                    .into())
                }
            };
            draw_geodesic(canvas, geom, ends[0], ends[1], ends[2], ends[3], segments);
        }
        "circle" => match numbers()?.as_slice() {
            &[ra, dec, r] if r > 0.0 => {
                let (x, y) = to_pixel(ra, dec)?;
                canvas.circle(x, y, r);
            }
            _ => return Err(invalid("expected ra dec radius").into()),
        },
        "close" => canvas.close_path(),
        "stroke" => canvas.stroke(),
        "fill" => canvas.fill(),
        _ => return Err(invalid("unknown command").into()),
    }
    Ok(())
}
