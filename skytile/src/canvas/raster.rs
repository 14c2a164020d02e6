//! In-memory RGBA canvas backed by tiny-skia.

use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect,
    Stroke, Transform,
};

use super::{Canvas, CanvasError, PathRecorder, Rgba, Shape, Status};
use crate::projection::PathSink;

/// Raster drawing surface.
///
/// Pixels are stored premultiplied, starting out transparent black.
pub struct RasterCanvas {
    pixmap: Pixmap,
    path: PathRecorder,
    color: Rgba,
    line_width: f64,
    status: Status,
}

impl RasterCanvas {
    /// Allocate a transparent canvas.
    ///
    /// # Errors
    ///
    /// Returns `CanvasError::Allocation` if the surface cannot be created.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        Ok(Self {
            pixmap: new_layer_pixmap(width, height)?,
            path: PathRecorder::new(),
            color: Rgba::BLACK,
            line_width: 1.0,
            status: Status::default(),
        })
    }

    /// The rendered pixels.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Consume the canvas, returning its pixels.
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    fn source_paint(&self) -> Paint<'static> {
        let c = self.color.clamped();
        let mut paint = Paint::default();
        paint.set_color(
            Color::from_rgba(c.r as f32, c.g as f32, c.b as f32, c.a as f32).unwrap_or(Color::BLACK),
        );
        paint.anti_alias = true;
        paint
    }

    fn build_path(&mut self) -> Option<Path> {
        if !self.status.is_ok() {
            return None;
        }
        let mut pb = PathBuilder::new();
        for shape in self.path.take() {
            match shape {
                Shape::Polyline { points, closed } => {
                    if let Some((first, rest)) = points.split_first() {
                        pb.move_to(first.0 as f32, first.1 as f32);
                        for p in rest {
                            pb.line_to(p.0 as f32, p.1 as f32);
                        }
                        if closed {
                            pb.close();
                        }
                    }
                }
                Shape::Circle { cx, cy, radius } => {
                    pb.push_circle(cx as f32, cy as f32, radius as f32);
                }
            }
        }
        pb.finish()
    }
}

/// Allocate a zeroed tile-sized pixmap for a raster layer.
pub(crate) fn new_layer_pixmap(width: u32, height: u32) -> Result<Pixmap, CanvasError> {
    Pixmap::new(width, height).ok_or(CanvasError::Allocation { width, height })
}

impl PathSink for RasterCanvas {
    fn move_to(&mut self, x: f64, y: f64) {
        if self.status.check("move_to", &[x, y]) {
            self.path.move_to(x, y);
        }
    }

    fn line_to(&mut self, x: f64, y: f64) {
        if self.status.check("line_to", &[x, y]) {
            self.path.line_to(x, y);
        }
    }
}

impl Canvas for RasterCanvas {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    fn close_path(&mut self) {
        self.path.close();
    }

    fn circle(&mut self, cx: f64, cy: f64, radius: f64) {
        if self.status.check("circle", &[cx, cy, radius]) {
            self.path.circle(cx, cy, radius);
        }
    }

    fn new_path(&mut self) {
        self.path.take();
    }

    fn stroke(&mut self) {
        let paint = self.source_paint();
        let stroke = Stroke {
            width: self.line_width as f32,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            ..Stroke::default()
        };
        if let Some(path) = self.build_path() {
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    fn fill(&mut self) {
        let paint = self.source_paint();
        if let Some(path) = self.build_path() {
            self.pixmap
                .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    fn paint(&mut self) {
        if !self.status.is_ok() {
            return;
        }
        let paint = self.source_paint();
        if let Some(rect) = Rect::from_xywh(0.0, 0.0, self.width() as f32, self.height() as f32) {
            self.pixmap
                .fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    fn composite(&mut self, layer: &Pixmap) -> Result<(), CanvasError> {
        if layer.width() != self.width() || layer.height() != self.height() {
            return Err(CanvasError::SizeMismatch {
                width: self.width(),
                height: self.height(),
                actual_width: layer.width(),
                actual_height: layer.height(),
            });
        }
        // Default pixmap paint is an opaque source-over blit.
        self.pixmap.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    fn status(&self) -> Result<(), CanvasError> {
        self.status.result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(canvas: &RasterCanvas, x: u32, y: u32) -> [u8; 4] {
        let p = canvas.pixmap().pixel(x, y).unwrap().demultiply();
        [p.red(), p.green(), p.blue(), p.alpha()]
    }

    #[test]
    fn test_new_canvas_is_transparent() {
        let canvas = RasterCanvas::new(8, 8).unwrap();
        assert!(canvas.pixmap().data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zero_size_fails_allocation() {
        assert!(matches!(
            RasterCanvas::new(0, 8),
            Err(CanvasError::Allocation { width: 0, height: 8 })
        ));
    }

    #[test]
    fn test_paint_covers_surface() {
        let mut canvas = RasterCanvas::new(4, 4).unwrap();
        canvas.set_color(Rgba::rgb(1.0, 0.0, 0.0));
        canvas.paint();
        assert_eq!(pixel(&canvas, 0, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&canvas, 3, 3), [255, 0, 0, 255]);
    }

    #[test]
    fn test_stroke_draws_and_clears_path() {
        let mut canvas = RasterCanvas::new(16, 16).unwrap();
        canvas.set_color(Rgba::WHITE);
        canvas.set_line_width(4.0);
        canvas.move_to(0.0, 8.0);
        canvas.line_to(16.0, 8.0);
        canvas.stroke();

        assert_eq!(pixel(&canvas, 8, 8)[3], 255);
        assert_eq!(pixel(&canvas, 8, 0)[3], 0);

        // Path was consumed: a second stroke in another colour is a no-op
        canvas.set_color(Rgba::rgb(0.0, 0.0, 1.0));
        canvas.stroke();
        assert_eq!(pixel(&canvas, 8, 8), [255, 255, 255, 255]);
    }

    #[test]
    fn test_fill_circle() {
        let mut canvas = RasterCanvas::new(16, 16).unwrap();
        canvas.set_color(Rgba::WHITE);
        canvas.circle(8.0, 8.0, 4.0);
        canvas.fill();
        assert_eq!(pixel(&canvas, 8, 8)[3], 255);
        assert_eq!(pixel(&canvas, 0, 0)[3], 0);
    }

    #[test]
    fn test_composite_source_over() {
        let mut canvas = RasterCanvas::new(4, 4).unwrap();
        canvas.set_color(Rgba::rgb(0.0, 0.0, 1.0));
        canvas.paint();

        // Layer with one opaque red pixel, the rest transparent
        let mut layer = Pixmap::new(4, 4).unwrap();
        layer.pixels_mut()[0] =
            tiny_skia::PremultipliedColorU8::from_rgba(255, 0, 0, 255).unwrap();

        canvas.composite(&layer).unwrap();
        assert_eq!(pixel(&canvas, 0, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&canvas, 1, 0), [0, 0, 255, 255]);
    }

    #[test]
    fn test_non_finite_coordinate_disables_canvas() {
        let mut canvas = RasterCanvas::new(16, 16).unwrap();
        canvas.set_color(Rgba::WHITE);
        canvas.move_to(0.0, 8.0);
        canvas.line_to(f64::NAN, 8.0);
        assert_eq!(
            canvas.status(),
            Err(CanvasError::NonFinite { op: "line_to" })
        );

        // Later drawing is ignored and the error stays
        canvas.line_to(16.0, 8.0);
        canvas.stroke();
        canvas.paint();
        assert!(canvas.pixmap().data().iter().all(|&b| b == 0));
        assert!(canvas.status().unwrap_err().is_fatal());
    }

    #[test]
    fn test_status_ok_after_normal_drawing() {
        let mut canvas = RasterCanvas::new(8, 8).unwrap();
        canvas.circle(4.0, 4.0, 2.0);
        canvas.fill();
        assert_eq!(canvas.status(), Ok(()));
    }

    #[test]
    fn test_composite_rejects_wrong_size() {
        let mut canvas = RasterCanvas::new(4, 4).unwrap();
        let layer = Pixmap::new(2, 2).unwrap();
        assert!(matches!(
            canvas.composite(&layer),
            Err(CanvasError::SizeMismatch { .. })
        ));
    }
}
