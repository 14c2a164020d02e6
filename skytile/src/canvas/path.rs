//! Backend-neutral current-path recording.

use crate::projection::PathSink;

/// One sub-path of the current path, in pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Connected straight segments.
    Polyline {
        points: Vec<(f64, f64)>,
        closed: bool,
    },
    /// A full circle.
    Circle { cx: f64, cy: f64, radius: f64 },
}

/// Accumulates sub-paths until a backend strokes or fills them.
///
/// Follows the usual current-point rules: `line_to` without a current
/// point behaves like `move_to`, and `close_path` ends the sub-path.
#[derive(Debug, Default, Clone)]
pub struct PathRecorder {
    shapes: Vec<Shape>,
    open: bool,
}

impl PathRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded sub-paths in drawing order.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Mark the current sub-path closed.
    pub fn close(&mut self) {
        if self.open {
            if let Some(Shape::Polyline { closed, .. }) = self.shapes.last_mut() {
                *closed = true;
            }
        }
        self.open = false;
    }

    pub fn circle(&mut self, cx: f64, cy: f64, radius: f64) {
        self.shapes.push(Shape::Circle { cx, cy, radius });
        self.open = false;
    }

    /// Take every recorded sub-path, leaving the recorder empty.
    pub fn take(&mut self) -> Vec<Shape> {
        self.open = false;
        std::mem::take(&mut self.shapes)
    }
}

impl PathSink for PathRecorder {
    fn move_to(&mut self, x: f64, y: f64) {
        self.shapes.push(Shape::Polyline {
            points: vec![(x, y)],
            closed: false,
        });
        self.open = true;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        match self.shapes.last_mut() {
            Some(Shape::Polyline { points, .. }) if self.open => points.push((x, y)),
            _ => self.move_to(x, y),
        }
    }
}
