//! Wraparound-aware line drawing in tile pixel space.
//!
//! Lines are emitted into any [`PathSink`]; the drawing canvases implement it,
//! so the projection code stays independent of the rendering backend.

use super::{dec_to_merc_y, ra_to_merc_x, radec_to_xyz, xyz_to_radec, ViewGeometry};

/// Receiver of path construction commands in pixel coordinates.
pub trait PathSink {
    /// Start a new sub-path at `(x, y)`.
    fn move_to(&mut self, x: f64, y: f64);

    /// Extend the current sub-path with a straight segment to `(x, y)`.
    fn line_to(&mut self, x: f64, y: f64);
}

/// Draw a straight segment between two Mercator points.
///
/// When part of the segment lies beyond the 0/1 seam of the Mercator
/// square, a copy shifted by one full turn is drawn as well so both sides
/// of the seam show the segment.
pub fn draw_merc_segment<S: PathSink + ?Sized>(
    sink: &mut S,
    geom: &ViewGeometry,
    mx1: f64,
    my1: f64,
    mx2: f64,
    my2: f64,
) {
    let mut segment = |offset: f64| {
        let (x1, y1) = geom.merc_to_pixel_f(mx1 + offset, my1);
        let (x2, y2) = geom.merc_to_pixel_f(mx2 + offset, my2);
        sink.move_to(x1, y1);
        sink.line_to(x2, y2);
    };

    segment(0.0);
    if mx1.min(mx2) < 0.0 {
        segment(1.0);
    }
    if mx1.max(mx2) > 1.0 {
        segment(-1.0);
    }
}

/// Draw the great-circle arc between two celestial points.
///
/// The arc is approximated by `n_segments` vertices (both endpoints
/// included) obtained by linear interpolation of the two unit vectors,
/// re-normalized onto the sphere.
///
/// If the endpoints are 180° or more apart in RA, or the tile itself covers
/// the 0h seam, the polyline is drawn twice: once with every vertex moved to
/// the `x >= 0.5` side of the Mercator square and once with every vertex
/// moved to the `x <= 0.5` side. Whichever copy falls on the tile renders
/// the arc without a jump across the seam.
pub fn draw_geodesic<S: PathSink + ?Sized>(
    sink: &mut S,
    geom: &ViewGeometry,
    ra1: f64,
    dec1: f64,
    ra2: f64,
    dec2: f64,
    n_segments: usize,
) {
    let n = n_segments.max(2);
    let xyz1 = radec_to_xyz(ra1, dec1);
    let xyz2 = radec_to_xyz(ra2, dec2);

    let wrap = (ra1 - ra2).abs() >= 180.0 || geom.straddles_zero();
    let passes = if wrap { 2 } else { 1 };

    for pass in 0..passes {
        for s in 0..n {
            let frac = s as f64 / (n - 1) as f64;
            let mut xyz = [0.0; 3];
            for (k, v) in xyz.iter_mut().enumerate() {
                *v = xyz1[k] * (1.0 - frac) + xyz2[k] * frac;
            }
            let (ra, dec) = xyz_to_radec(normalize(xyz));

            let mut mx = ra_to_merc_x(ra);
            if wrap {
                if pass == 0 && mx < 0.5 {
                    mx += 1.0;
                }
                if pass == 1 && mx > 0.5 {
                    mx -= 1.0;
                }
            }
            let (px, py) = geom.merc_to_pixel_f(mx, dec_to_merc_y(dec));

            if s == 0 {
                sink.move_to(px, py);
            } else {
                sink.line_to(px, py);
            }
        }
    }
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len == 0.0 {
        // Antipodal endpoints: any point on the arc is as good as another
        return v;
    }
    [v[0] / len, v[1] / len, v[2] / len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Cmd {
        Move(f64, f64),
        Line(f64, f64),
    }

    /// Sink that records every command for inspection.
    #[derive(Default)]
    struct RecordingSink {
        cmds: Vec<Cmd>,
    }

    impl PathSink for RecordingSink {
        fn move_to(&mut self, x: f64, y: f64) {
            self.cmds.push(Cmd::Move(x, y));
        }

        fn line_to(&mut self, x: f64, y: f64) {
            self.cmds.push(Cmd::Line(x, y));
        }
    }

    impl RecordingSink {
        /// Split recorded commands into polylines, one per move_to.
        fn polylines(&self) -> Vec<Vec<(f64, f64)>> {
            let mut out: Vec<Vec<(f64, f64)>> = Vec::new();
            for cmd in &self.cmds {
                match *cmd {
                    Cmd::Move(x, y) => out.push(vec![(x, y)]),
                    Cmd::Line(x, y) => out.last_mut().unwrap().push((x, y)),
                }
            }
            out
        }
    }

    #[test]
    fn test_merc_segment_inside_square_drawn_once() {
        let geom = ViewGeometry::new(10.0, 20.0, 0.0, 10.0, 256, 256).unwrap();
        let mut sink = RecordingSink::default();
        draw_merc_segment(&mut sink, &geom, 0.96, 0.5, 0.97, 0.51);
        assert_eq!(sink.polylines().len(), 1);
    }

    #[test]
    fn test_merc_segment_below_zero_adds_shifted_copy() {
        let geom = ViewGeometry::new(10.0, 20.0, 0.0, 10.0, 256, 256).unwrap();
        let mut sink = RecordingSink::default();
        draw_merc_segment(&mut sink, &geom, -0.01, 0.5, 0.01, 0.5);

        let lines = sink.polylines();
        assert_eq!(lines.len(), 2);
        let shift = geom.x_pixel_per_merc();
        assert!((lines[1][0].0 - lines[0][0].0 - shift).abs() < 1e-6);
    }

    #[test]
    fn test_merc_segment_above_one_adds_shifted_copy() {
        let geom = ViewGeometry::new(10.0, 20.0, 0.0, 10.0, 256, 256).unwrap();
        let mut sink = RecordingSink::default();
        draw_merc_segment(&mut sink, &geom, 0.99, 0.5, 1.01, 0.5);

        let lines = sink.polylines();
        assert_eq!(lines.len(), 2);
        let shift = geom.x_pixel_per_merc();
        assert!((lines[0][1].0 - lines[1][1].0 - shift).abs() < 1e-6);
    }

    #[test]
    fn test_geodesic_simple_polyline() {
        let geom = ViewGeometry::new(10.0, 20.0, 0.0, 10.0, 256, 256).unwrap();
        let mut sink = RecordingSink::default();
        draw_geodesic(&mut sink, &geom, 12.0, 2.0, 18.0, 8.0, 10);

        let lines = sink.polylines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 10);

        // Endpoints project exactly to the endpoint pixels
        let start = geom.celestial_to_pixel_f(12.0, 2.0);
        let end = geom.celestial_to_pixel_f(18.0, 8.0);
        assert!((lines[0][0].0 - start.0).abs() < 1e-6);
        assert!((lines[0][0].1 - start.1).abs() < 1e-6);
        assert!((lines[0][9].0 - end.0).abs() < 1e-6);
        assert!((lines[0][9].1 - end.1).abs() < 1e-6);
    }

    #[test]
    fn test_geodesic_along_equator_stays_on_equator() {
        let geom = ViewGeometry::new(10.0, 20.0, -5.0, 5.0, 256, 256).unwrap();
        let mut sink = RecordingSink::default();
        draw_geodesic(&mut sink, &geom, 11.0, 0.0, 19.0, 0.0, 8);

        let (_, equator_y) = geom.celestial_to_pixel_f(15.0, 0.0);
        for (_, y) in &sink.polylines()[0] {
            assert!((y - equator_y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_geodesic_vertex_count_has_floor_of_two() {
        let geom = ViewGeometry::new(10.0, 20.0, 0.0, 10.0, 256, 256).unwrap();
        let mut sink = RecordingSink::default();
        draw_geodesic(&mut sink, &geom, 12.0, 2.0, 18.0, 8.0, 0);
        assert_eq!(sink.polylines()[0].len(), 2);
    }

    #[test]
    fn test_geodesic_across_seam_draws_two_passes() {
        // Tile covering RA 358°..2° around the 0h seam
        let geom = ViewGeometry::new(-2.0, 2.0, -1.0, 1.0, 256, 256).unwrap();
        let mut sink = RecordingSink::default();
        draw_geodesic(&mut sink, &geom, 358.0, 0.0, 2.0, 0.0, 9);

        let lines = sink.polylines();
        assert_eq!(lines.len(), 2, "wrapping arc must be drawn twice");

        // First pass lies on the x >= 0.5 branch, which is where this tile is
        let width = f64::from(geom.width());
        let height = f64::from(geom.height());
        for &(x, y) in &lines[0] {
            assert!(x > -1e-6 && x < width + 1e-6, "x {} outside tile", x);
            assert!(y > -1e-6 && y < height + 1e-6, "y {} outside tile", y);
        }
        // Pass one is continuous: no jump larger than a few pixels
        for pair in lines[0].windows(2) {
            assert!((pair[1].0 - pair[0].0).abs() < width / 4.0);
        }

        // Second pass is the same arc one full turn to the left
        let shift = geom.x_pixel_per_merc();
        for (a, b) in lines[0].iter().zip(&lines[1]) {
            assert!((a.0 - b.0 - shift).abs() < 1e-6);
            assert!((a.1 - b.1).abs() < 1e-6);
        }
    }

    #[test]
    fn test_geodesic_large_ra_separation_wraps() {
        let geom = ViewGeometry::new(0.0, 360.0, -60.0, 60.0, 512, 512).unwrap();
        let mut sink = RecordingSink::default();
        draw_geodesic(&mut sink, &geom, 10.0, 0.0, 300.0, 0.0, 16);
        assert_eq!(sink.polylines().len(), 2);
    }
}
