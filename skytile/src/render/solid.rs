use super::{RenderContext, RenderError, VectorRenderer};
use crate::canvas::{Canvas, Rgba};

/// Paints the whole tile opaque black, usually as the bottom layer.
pub struct SolidRenderer;

impl VectorRenderer for SolidRenderer {
    fn render(&self, canvas: &mut dyn Canvas, _ctx: &RenderContext<'_>) -> Result<(), RenderError> {
        canvas.set_color(Rgba::BLACK);
        canvas.paint();
        Ok(())
    }
}
