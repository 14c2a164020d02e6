//! Output encoding.
//!
//! A finished render is serialized in exactly one form:
//!
//! | Mode       | Source              | Bytes                                   |
//! |------------|---------------------|-----------------------------------------|
//! | `Png`      | raster canvas       | 8-bit RGBA PNG (straight alpha)         |
//! | `Jpeg`     | raster canvas       | 8-bit RGB JPEG, composited over black   |
//! | `Pdf`      | PDF canvas          | single-page PDF document                |
//! | `RawFloat` | float image         | `width × height × 3` native-endian f32  |

mod raw;

use std::io::{self, Write};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::canvas::{CanvasError, PdfCanvas, Pixmap};
use crate::request::RequestError;

pub use raw::FloatImage;

/// JPEG quality used for raster tiles.
pub const JPEG_QUALITY: u8 = 90;

/// How the finished tile is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Png,
    Jpeg,
    Pdf,
    RawFloat,
}

impl OutputMode {
    /// Whether this mode draws onto the PDF canvas.
    pub fn is_vector(self) -> bool {
        matches!(self, OutputMode::Pdf)
    }

    /// MIME type of the encoded bytes.
    pub fn content_type(self) -> &'static str {
        match self {
            OutputMode::Png => "image/png",
            OutputMode::Jpeg => "image/jpeg",
            OutputMode::Pdf => "application/pdf",
            OutputMode::RawFloat => "application/octet-stream",
        }
    }
}

/// Output flags as given by the caller, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputSelection {
    pub jpeg: bool,
    pub pdf: bool,
    pub raw: bool,
}

impl OutputSelection {
    /// Turn the flags into a single mode. No flag means PNG.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::ConflictingOutputs` if more than one flag is set.
    pub fn resolve(self) -> Result<OutputMode, RequestError> {
        let mut chosen = Vec::new();
        if self.jpeg {
            chosen.push("jpeg");
        }
        if self.pdf {
            chosen.push("pdf");
        }
        if self.raw {
            chosen.push("raw");
        }
        match chosen.as_slice() {
            [] => Ok(OutputMode::Png),
            ["jpeg"] => Ok(OutputMode::Jpeg),
            ["pdf"] => Ok(OutputMode::Pdf),
            ["raw"] => Ok(OutputMode::RawFloat),
            _ => Err(RequestError::ConflictingOutputs(chosen.join(" + "))),
        }
    }
}

/// A finished tile, ready to encode.
pub enum Rendered {
    Png(Pixmap),
    Jpeg(Pixmap),
    Pdf(PdfCanvas),
    Raw(FloatImage),
}

impl Rendered {
    pub fn mode(&self) -> OutputMode {
        match self {
            Rendered::Png(_) => OutputMode::Png,
            Rendered::Jpeg(_) => OutputMode::Jpeg,
            Rendered::Pdf(_) => OutputMode::Pdf,
            Rendered::Raw(_) => OutputMode::RawFloat,
        }
    }
}

/// Errors that can occur while writing the encoded tile.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Serialize `rendered` to `sink`.
pub fn encode<W: Write>(rendered: Rendered, sink: &mut W) -> Result<(), OutputError> {
    match rendered {
        Rendered::Png(pixmap) => {
            let rgba = straight_rgba(&pixmap);
            PngEncoder::new(&mut *sink).write_image(
                &rgba,
                pixmap.width(),
                pixmap.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        Rendered::Jpeg(pixmap) => {
            let rgb = rgb_over_black(&pixmap);
            JpegEncoder::new_with_quality(&mut *sink, JPEG_QUALITY).write_image(
                &rgb,
                pixmap.width(),
                pixmap.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
        Rendered::Pdf(canvas) => canvas.finish(sink)?,
        Rendered::Raw(image) => image.write_to(sink)?,
    }
    sink.flush()?;
    Ok(())
}

/// Un-premultiply the pixmap into straight-alpha RGBA bytes.
fn straight_rgba(pixmap: &Pixmap) -> Vec<u8> {
    pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect()
}

/// Drop alpha from premultiplied pixels, which composites them over black.
fn rgb_over_black(pixmap: &Pixmap) -> Vec<u8> {
    pixmap
        .pixels()
        .iter()
        .flat_map(|p| [p.red(), p.green(), p.blue()])
        .collect()
}
