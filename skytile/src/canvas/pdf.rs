//! Single-page PDF canvas backed by printpdf.
//!
//! One tile pixel is one PDF point. PDF puts the origin at the bottom-left,
//! so y is flipped on the way out.

use std::io::{BufWriter, Write};

use printpdf::{Color, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Rgb};

use super::{Canvas, CanvasError, PathRecorder, Pixmap, Rgba, Shape, Status};
use crate::projection::PathSink;

const MM_PER_PT: f64 = 25.4 / 72.0;

/// Vertices used to approximate a circle.
const CIRCLE_VERTICES: usize = 48;

/// Vector drawing surface producing a one-page PDF.
pub struct PdfCanvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    width: u32,
    height: u32,
    path: PathRecorder,
    status: Status,
}

impl PdfCanvas {
    /// Create an empty page of `width × height` points.
    pub fn new(width: u32, height: u32) -> Self {
        let (doc, page, layer) = PdfDocument::new(
            "SkyTile",
            Mm(f64::from(width) * MM_PER_PT),
            Mm(f64::from(height) * MM_PER_PT),
            "Tile",
        );
        let layer = doc.get_page(page).get_layer(layer);
        layer.set_outline_thickness(1.0);

        Self {
            doc,
            layer,
            width,
            height,
            path: PathRecorder::new(),
            status: Status::default(),
        }
    }

    /// Finalize the document and write it to `sink`.
    pub fn finish(self, sink: &mut dyn Write) -> Result<(), CanvasError> {
        let mut writer = BufWriter::new(sink);
        self.doc
            .save(&mut writer)
            .map_err(|e| CanvasError::Pdf(format!("{:?}", e)))?;
        writer.flush().map_err(|e| CanvasError::Pdf(e.to_string()))
    }

    fn point(&self, x: f64, y: f64) -> (Point, bool) {
        let y = f64::from(self.height) - y;
        (Point::new(Mm(x * MM_PER_PT), Mm(y * MM_PER_PT)), false)
    }

    fn emit(&mut self, fill: bool) {
        let shapes = self.path.take();
        if !self.status.is_ok() {
            return;
        }
        for shape in shapes {
            let (points, closed) = match shape {
                Shape::Polyline { points, closed } => (points, closed),
                Shape::Circle { cx, cy, radius } => (circle_points(cx, cy, radius), true),
            };
            if points.len() < 2 {
                continue;
            }
            let points = points.iter().map(|&(x, y)| self.point(x, y)).collect();
            self.layer.add_shape(Line {
                points,
                is_closed: closed || fill,
                has_fill: fill,
                has_stroke: !fill,
                is_clipping_path: false,
            });
        }
    }
}

fn circle_points(cx: f64, cy: f64, radius: f64) -> Vec<(f64, f64)> {
    (0..CIRCLE_VERTICES)
        .map(|i| {
            let t = i as f64 / CIRCLE_VERTICES as f64 * std::f64::consts::TAU;
            (cx + radius * t.cos(), cy + radius * t.sin())
        })
        .collect()
}

fn pdf_color(color: Rgba) -> Color {
    // PDF colour operators carry no alpha; translucency is dropped.
    let c = color.clamped();
    Color::Rgb(Rgb::new(c.r, c.g, c.b, None))
}

impl PathSink for PdfCanvas {
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

impl Canvas for PdfCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_color(&mut self, color: Rgba) {
        self.layer.set_outline_color(pdf_color(color));
        self.layer.set_fill_color(pdf_color(color));
    }

    fn set_line_width(&mut self, width: f64) {
        self.layer.set_outline_thickness(width);
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
        self.emit(false);
    }

    fn fill(&mut self) {
        self.emit(true);
    }

    fn paint(&mut self) {
        self.path.take();
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        self.path.move_to(0.0, 0.0);
        self.path.line_to(w, 0.0);
        self.path.line_to(w, h);
        self.path.line_to(0.0, h);
        self.path.close();
        self.emit(true);
    }

    fn composite(&mut self, _layer: &Pixmap) -> Result<(), CanvasError> {
        Err(CanvasError::UnsupportedComposite { backend: "pdf" })
    }

    fn status(&self) -> Result<(), CanvasError> {
        self.status.result()
    }
}
