//! Celestial projection module
//!
//! Provides conversions between celestial coordinates (right ascension and
//! declination, in degrees), the unit-square Mercator projection used by the
//! tile pyramid, and pixel coordinates of a single tile.
//!
//! # Axis convention
//!
//! The sky is seen from the inside, so right ascension grows to the *left*
//! on a map. The flip is applied exactly once, in [`ra_to_merc_x`]: RA 0°
//! maps to Mercator x = 1 and RA 360° maps to x = 0. Everything downstream
//! (Mercator → pixel) is a plain affine map with increasing x to the right.
//!
//! RA values outside [0, 360) are not folded, so a tile may be described as
//! `ra_min = -1, ra_max = 1` to cover the 0h seam; its Mercator x range then
//! extends slightly past 1.

mod draw;
mod geometry;

pub use draw::{draw_geodesic, draw_merc_segment, PathSink};
pub use geometry::{GeometryError, ViewGeometry, MAX_TILE_DIMENSION};

use std::f64::consts::PI;

/// Pixel width of one zoom level 0 tile covering the whole Mercator square.
pub const BASE_TILE_SIZE: f64 = 256.0;

/// Converts right ascension (degrees) to Mercator x.
#[inline]
pub fn ra_to_merc_x(ra_deg: f64) -> f64 {
    1.0 - ra_deg / 360.0
}

/// Converts declination (degrees) to Mercator y.
///
/// The poles map to ±infinity in theory; in practice `tan(±90°)` is a large
/// finite number, so callers clamp the result to [0, 1] where needed.
#[inline]
pub fn dec_to_merc_y(dec_deg: f64) -> f64 {
    0.5 + dec_deg.to_radians().tan().asinh() / (2.0 * PI)
}

/// Converts Mercator x back to right ascension (degrees).
#[inline]
pub fn merc_x_to_ra(mx: f64) -> f64 {
    (1.0 - mx) * 360.0
}

/// Converts Mercator y back to declination (degrees).
#[inline]
pub fn merc_y_to_dec(my: f64) -> f64 {
    ((my - 0.5) * 2.0 * PI).sinh().atan().to_degrees()
}

/// Converts celestial coordinates to unit-square Mercator coordinates.
///
/// # Arguments
///
/// * `ra_deg` - Right ascension in degrees
/// * `dec_deg` - Declination in degrees (-90 to 90)
///
/// # Returns
///
/// `(mx, my)` where increasing `mx` means decreasing RA and increasing `my`
/// means increasing declination.
#[inline]
pub fn celestial_to_merc(ra_deg: f64, dec_deg: f64) -> (f64, f64) {
    (ra_to_merc_x(ra_deg), dec_to_merc_y(dec_deg))
}

/// Converts unit-square Mercator coordinates to celestial coordinates.
///
/// Exact inverse of [`celestial_to_merc`].
#[inline]
pub fn merc_to_celestial(mx: f64, my: f64) -> (f64, f64) {
    (merc_x_to_ra(mx), merc_y_to_dec(my))
}

/// Converts celestial coordinates to a unit vector on the sphere.
#[inline]
pub fn radec_to_xyz(ra_deg: f64, dec_deg: f64) -> [f64; 3] {
    let ra = ra_deg.to_radians();
    let dec = dec_deg.to_radians();
    [dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin()]
}

/// Converts a (not necessarily normalized) vector to celestial coordinates.
///
/// The returned right ascension lies in [0, 360).
#[inline]
pub fn xyz_to_radec(xyz: [f64; 3]) -> (f64, f64) {
    let [x, y, z] = xyz;
    let mut ra = y.atan2(x).to_degrees();
    if ra < 0.0 {
        ra += 360.0;
    }
    let dec = z.atan2((x * x + y * y).sqrt()).to_degrees();
    (ra, dec)
}
