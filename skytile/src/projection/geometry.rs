//! Per-request tile geometry.

use thiserror::Error;

use super::{celestial_to_merc, merc_to_celestial, merc_x_to_ra, merc_y_to_dec, BASE_TILE_SIZE};

/// Hard upper bound on tile width and height in pixels.
pub const MAX_TILE_DIMENSION: u32 = 4096;

/// Errors raised while constructing a [`ViewGeometry`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A bound was NaN or infinite.
    #[error("Non-finite {name} bound: {value}")]
    NonFinite { name: &'static str, value: f64 },

    /// Right ascension range is empty or inverted.
    #[error("Invalid RA range [{min}, {max}]: lower bound must be below upper bound")]
    InvalidRaRange { min: f64, max: f64 },

    /// Declination range is empty, inverted, or outside [-90, 90].
    #[error("Invalid Dec range [{min}, {max}]")]
    InvalidDecRange { min: f64, max: f64 },

    /// The declination range collapses after clamping to the Mercator square.
    #[error("Dec range [{min}, {max}] does not intersect the Mercator square")]
    EmptyMercatorRange { min: f64, max: f64 },

    /// Width or height is zero or above the cap.
    #[error("Invalid tile size {width}×{height} (limit {limit})")]
    InvalidDimensions { width: u32, height: u32, limit: u32 },
}

/// Immutable mapping between the sky and the pixels of one tile.
///
/// All derived quantities are computed once in the constructor and never
/// change for the lifetime of the request.
///
/// # Example
///
/// ```
/// use skytile::projection::ViewGeometry;
///
/// let geom = ViewGeometry::new(10.0, 11.0, 0.0, 1.0, 256, 256).unwrap();
/// let (px, py) = geom.celestial_to_pixel(10.5, 0.5);
/// assert!(geom.in_tile(px, py));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ViewGeometry {
    ra_min: f64,
    ra_max: f64,
    dec_min: f64,
    dec_max: f64,
    merc_x_min: f64,
    merc_x_max: f64,
    merc_y_min: f64,
    merc_y_max: f64,
    width_px: u32,
    height_px: u32,
    x_pixel_per_merc: f64,
    y_pixel_per_merc: f64,
    x_merc_per_pixel: f64,
    y_merc_per_pixel: f64,
    zoom_level: i32,
}

impl ViewGeometry {
    /// Create the geometry for a tile given in celestial coordinates.
    ///
    /// # Arguments
    ///
    /// * `ra_min`, `ra_max` - Right ascension range in degrees. Tiles that
    ///   cover the 0h seam use `ra_min < 0` or `ra_max > 360`.
    /// * `dec_min`, `dec_max` - Declination range in degrees
    /// * `width`, `height` - Tile size in pixels (1 to [`MAX_TILE_DIMENSION`])
    pub fn new(
        ra_min: f64,
        ra_max: f64,
        dec_min: f64,
        dec_max: f64,
        width: u32,
        height: u32,
    ) -> Result<Self, GeometryError> {
        for (name, value) in [
            ("ra_min", ra_min),
            ("ra_max", ra_max),
            ("dec_min", dec_min),
            ("dec_max", dec_max),
        ] {
            if !value.is_finite() {
                return Err(GeometryError::NonFinite { name, value });
            }
        }
        if width == 0 || height == 0 || width > MAX_TILE_DIMENSION || height > MAX_TILE_DIMENSION {
            return Err(GeometryError::InvalidDimensions {
                width,
                height,
                limit: MAX_TILE_DIMENSION,
            });
        }
        if ra_min >= ra_max {
            return Err(GeometryError::InvalidRaRange {
                min: ra_min,
                max: ra_max,
            });
        }
        if dec_min >= dec_max || dec_min < -90.0 || dec_max > 90.0 {
            return Err(GeometryError::InvalidDecRange {
                min: dec_min,
                max: dec_max,
            });
        }

        // Smallest RA is the largest Mercator x.
        let (merc_x_max, raw_y_min) = celestial_to_merc(ra_min, dec_min);
        let (merc_x_min, raw_y_max) = celestial_to_merc(ra_max, dec_max);

        // The poles land near, but not exactly on, the edges of the square.
        let merc_y_min = raw_y_min.max(0.0);
        let merc_y_max = raw_y_max.min(1.0);
        if merc_y_min >= merc_y_max {
            return Err(GeometryError::EmptyMercatorRange {
                min: dec_min,
                max: dec_max,
            });
        }

        let x_pixel_per_merc = f64::from(width) / (merc_x_max - merc_x_min);
        let y_pixel_per_merc = f64::from(height) / (merc_y_max - merc_y_min);
        let zoom_level = (x_pixel_per_merc / BASE_TILE_SIZE).abs().log2().round() as i32;

        let geom = Self {
            ra_min,
            ra_max,
            dec_min,
            dec_max,
            merc_x_min,
            merc_x_max,
            merc_y_min,
            merc_y_max,
            width_px: width,
            height_px: height,
            x_pixel_per_merc,
            y_pixel_per_merc,
            x_merc_per_pixel: 1.0 / x_pixel_per_merc,
            y_merc_per_pixel: 1.0 / y_pixel_per_merc,
            zoom_level,
        };

        tracing::debug!(
            ra = ?(ra_min, ra_max),
            dec = ?(dec_min, dec_max),
            merc_x = ?(merc_x_min, merc_x_max),
            merc_y = ?(merc_y_min, merc_y_max),
            zoom = zoom_level,
            "Tile geometry"
        );

        Ok(geom)
    }

    /// Create the geometry for a tile given in unit-square Mercator coordinates.
    ///
    /// The bounds are converted to degrees and then handled exactly like
    /// [`ViewGeometry::new`], so the derived Mercator range equals the input.
    pub fn from_mercator(
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
        width: u32,
        height: u32,
    ) -> Result<Self, GeometryError> {
        // x grows as RA shrinks
        let ra_min = merc_x_to_ra(x_max);
        let ra_max = merc_x_to_ra(x_min);
        Self::new(
            ra_min,
            ra_max,
            merc_y_to_dec(y_min),
            merc_y_to_dec(y_max),
            width,
            height,
        )
    }

    /// Lower RA bound in degrees.
    pub fn ra_min(&self) -> f64 {
        self.ra_min
    }

    /// Upper RA bound in degrees.
    pub fn ra_max(&self) -> f64 {
        self.ra_max
    }

    /// Lower Dec bound in degrees.
    pub fn dec_min(&self) -> f64 {
        self.dec_min
    }

    /// Upper Dec bound in degrees.
    pub fn dec_max(&self) -> f64 {
        self.dec_max
    }

    /// Mercator x range `(min, max)`.
    pub fn merc_x_range(&self) -> (f64, f64) {
        (self.merc_x_min, self.merc_x_max)
    }

    /// Mercator y range `(min, max)`, clamped to [0, 1].
    pub fn merc_y_range(&self) -> (f64, f64) {
        (self.merc_y_min, self.merc_y_max)
    }

    /// Tile width in pixels.
    pub fn width(&self) -> u32 {
        self.width_px
    }

    /// Tile height in pixels.
    pub fn height(&self) -> u32 {
        self.height_px
    }

    /// Mercator units covered by one pixel along x.
    pub fn x_merc_per_pixel(&self) -> f64 {
        self.x_merc_per_pixel
    }

    /// Mercator units covered by one pixel along y.
    pub fn y_merc_per_pixel(&self) -> f64 {
        self.y_merc_per_pixel
    }

    /// Pixels per Mercator unit along x.
    pub fn x_pixel_per_merc(&self) -> f64 {
        self.x_pixel_per_merc
    }

    /// Pixels per Mercator unit along y.
    pub fn y_pixel_per_merc(&self) -> f64 {
        self.y_pixel_per_merc
    }

    /// Zoom level of the tile pyramid this tile belongs to.
    pub fn zoom_level(&self) -> i32 {
        self.zoom_level
    }

    /// Whether the RA range covers the 0h/24h seam.
    pub fn straddles_zero(&self) -> bool {
        self.ra_min < 0.0 || self.ra_max > 360.0
    }

    /// Mercator → pixel, keeping sub-pixel precision.
    #[inline]
    pub fn merc_to_pixel_f(&self, mx: f64, my: f64) -> (f64, f64) {
        (
            (mx - self.merc_x_min) * self.x_pixel_per_merc,
            (self.merc_y_max - my) * self.y_pixel_per_merc,
        )
    }

    /// Mercator → integer pixel (floor).
    #[inline]
    pub fn merc_to_pixel(&self, mx: f64, my: f64) -> (i32, i32) {
        let (px, py) = self.merc_to_pixel_f(mx, my);
        (px.floor() as i32, py.floor() as i32)
    }

    /// Pixel → Mercator. Inverse of [`ViewGeometry::merc_to_pixel_f`].
    #[inline]
    pub fn pixel_to_merc(&self, px: f64, py: f64) -> (f64, f64) {
        (
            self.merc_x_min + px * self.x_merc_per_pixel,
            self.merc_y_max - py * self.y_merc_per_pixel,
        )
    }

    /// Celestial → pixel, keeping sub-pixel precision.
    #[inline]
    pub fn celestial_to_pixel_f(&self, ra_deg: f64, dec_deg: f64) -> (f64, f64) {
        let (mx, my) = celestial_to_merc(ra_deg, dec_deg);
        self.merc_to_pixel_f(mx, my)
    }

    /// Celestial → integer pixel (floor).
    #[inline]
    pub fn celestial_to_pixel(&self, ra_deg: f64, dec_deg: f64) -> (i32, i32) {
        let (mx, my) = celestial_to_merc(ra_deg, dec_deg);
        self.merc_to_pixel(mx, my)
    }

    /// Pixel → celestial.
    #[inline]
    pub fn pixel_to_celestial(&self, px: f64, py: f64) -> (f64, f64) {
        let (mx, my) = self.pixel_to_merc(px, py);
        merc_to_celestial(mx, my)
    }

    /// Whether an integer pixel lies inside the tile.
    #[inline]
    pub fn in_tile(&self, px: i32, py: i32) -> bool {
        self.in_tile_with_margin(px, py, 0)
    }

    /// Whether an integer pixel lies inside the tile grown by `margin` on every side.
    #[inline]
    pub fn in_tile_with_margin(&self, px: i32, py: i32, margin: i32) -> bool {
        let w = self.width_px as i32;
        let h = self.height_px as i32;
        px >= -margin && px < w + margin && py >= -margin && py < h + margin
    }
}
