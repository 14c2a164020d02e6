//! Floating-point RGB image used for raw output.

use std::io::{self, BufWriter, Write};

/// Row-major `width × height × 3` float image, zero-initialised.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatImage {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl FloatImage {
    /// Allocate a zeroed image, or `None` if the buffer cannot be reserved.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(3)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).ok()?;
        data.resize(len, 0.0);
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// All samples, row by row, three per pixel.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 3)
    }

    /// RGB value at `(x, y)`, or `None` outside the image.
    pub fn get(&self, x: i64, y: i64) -> Option<[f32; 3]> {
        let i = self.index(x, y)?;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Add `rgb` to the pixel at `(x, y)`; positions outside the image are ignored.
    pub fn accumulate(&mut self, x: i64, y: i64, rgb: [f32; 3]) {
        if let Some(i) = self.index(x, y) {
            for (sample, v) in self.data[i..i + 3].iter_mut().zip(rgb) {
                *sample += v;
            }
        }
    }

    /// Write every sample as a native-endian `f32`.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        let mut writer = BufWriter::new(sink);
        for v in &self.data {
            writer.write_all(&v.to_ne_bytes())?;
        }
        writer.flush()
    }
}
