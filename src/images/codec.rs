//! Image codec boundary.
//!
//! The drawing layer only needs two capabilities from a codec: decode bytes
//! into a pixel buffer, and encode a pixel buffer into one of the raster
//! formats a package can store. [`ImageCodec`] is that seam;
//! [`RasterCodec`] implements it with the `image` crate.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat};
use thiserror::Error;

use crate::ooxml::opc::constants::content_type as ct;

/// Error types for codec operations.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Input bytes are not an image the codec understands
    #[error("cannot decode image: {0}")]
    Decode(String),

    /// The codec could not produce the requested format
    #[error("cannot encode image as {format:?}: {reason}")]
    Encode { format: CodecFormat, reason: String },
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Raster formats the codec can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecFormat {
    Bmp,
    Jpeg,
    Gif,
    Png,
}

impl CodecFormat {
    /// MIME content type of encoded output.
    pub fn content_type(self) -> &'static str {
        match self {
            CodecFormat::Bmp => ct::BMP,
            CodecFormat::Jpeg => ct::JPEG,
            CodecFormat::Gif => ct::GIF,
            CodecFormat::Png => ct::PNG,
        }
    }

    /// File extension of encoded output, without the leading period.
    pub fn extension(self) -> &'static str {
        match self {
            CodecFormat::Bmp => "bmp",
            CodecFormat::Jpeg => "jpeg",
            CodecFormat::Gif => "gif",
            CodecFormat::Png => "png",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            CodecFormat::Bmp => ImageFormat::Bmp,
            CodecFormat::Jpeg => ImageFormat::Jpeg,
            CodecFormat::Gif => ImageFormat::Gif,
            CodecFormat::Png => ImageFormat::Png,
        }
    }
}

/// Colour layout reported by the codec for a decoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    Gray8,
    GrayAlpha8,
    Rgb8,
    Rgba8,
    Gray16,
    GrayAlpha16,
    Rgb16,
    Rgba16,
    Rgb32F,
    Rgba32F,
    Other,
}

impl ColorFormat {
    /// Whether the layout carries an alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            ColorFormat::GrayAlpha8
                | ColorFormat::Rgba8
                | ColorFormat::GrayAlpha16
                | ColorFormat::Rgba16
                | ColorFormat::Rgba32F
        )
    }
}

impl From<ColorType> for ColorFormat {
    fn from(color: ColorType) -> Self {
        match color {
            ColorType::L8 => ColorFormat::Gray8,
            ColorType::La8 => ColorFormat::GrayAlpha8,
            ColorType::Rgb8 => ColorFormat::Rgb8,
            ColorType::Rgba8 => ColorFormat::Rgba8,
            ColorType::L16 => ColorFormat::Gray16,
            ColorType::La16 => ColorFormat::GrayAlpha16,
            ColorType::Rgb16 => ColorFormat::Rgb16,
            ColorType::Rgba16 => ColorFormat::Rgba16,
            ColorType::Rgb32F => ColorFormat::Rgb32F,
            ColorType::Rgba32F => ColorFormat::Rgba32F,
            _ => ColorFormat::Other,
        }
    }
}

/// A decoded pixel buffer.
#[derive(Debug, Clone)]
pub struct RawImage {
    pixels: DynamicImage,
    color: ColorFormat,
}

impl RawImage {
    pub fn new(pixels: DynamicImage) -> Self {
        let color = pixels.color().into();
        Self { pixels, color }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[inline]
    pub fn color_format(&self) -> ColorFormat {
        self.color
    }

    /// A buffer with no pixels in either dimension cannot be stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}

impl From<DynamicImage> for RawImage {
    fn from(pixels: DynamicImage) -> Self {
        Self::new(pixels)
    }
}

/// Decode/encode capability used by picture resources.
pub trait ImageCodec {
    /// Decode encoded bytes into a pixel buffer.
    fn decode(&self, bytes: &[u8]) -> Result<RawImage>;

    /// Encode a pixel buffer. `quality` only affects lossy formats (1..=100).
    fn encode(&self, image: &RawImage, format: CodecFormat, quality: u8) -> Result<Vec<u8>>;

    /// Format used when re-encoding a buffer without an explicit target.
    ///
    /// Buffers with alpha keep it through PNG, single-channel buffers go to
    /// BMP and everything else is stored as JPEG.
    fn default_format(&self, image: &RawImage) -> CodecFormat {
        match image.color_format() {
            color if color.has_alpha() => CodecFormat::Png,
            ColorFormat::Gray8 => CodecFormat::Bmp,
            _ => CodecFormat::Jpeg,
        }
    }
}

/// [`ImageCodec`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl ImageCodec for RasterCodec {
    fn decode(&self, bytes: &[u8]) -> Result<RawImage> {
        image::load_from_memory(bytes)
            .map(RawImage::new)
            .map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode(&self, image: &RawImage, format: CodecFormat, quality: u8) -> Result<Vec<u8>> {
        if image.is_empty() {
            return Err(CodecError::Encode {
                format,
                reason: "image has no pixels".to_string(),
            });
        }

        let mut buffer = Cursor::new(Vec::new());
        let result = match format {
            // JPEG has no alpha channel and the encoder only accepts 8-bit samples
            CodecFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
                image.pixels.to_rgb8().write_with_encoder(encoder)
            },
            CodecFormat::Png => image.pixels.write_to(&mut buffer, format.image_format()),
            CodecFormat::Bmp | CodecFormat::Gif => {
                DynamicImage::ImageRgba8(image.pixels.to_rgba8())
                    .write_to(&mut buffer, format.image_format())
            },
        };

        result.map_err(|e| CodecError::Encode {
            format,
            reason: e.to_string(),
        })?;
        Ok(buffer.into_inner())
    }
}
