//! Decoded pixel buffers and the image decoding front end.
//!
//! The rest of the pipeline only ever sees a [`DecodedImage`]: width, height,
//! channel count and the raw interleaved bytes. Parsing the file formats is
//! delegated to the `image` crate.

use log::{debug, info};
use std::path::Path;

use image::DynamicImage;

use crate::error::Error;

/// Raw interleaved 8-bit pixels as produced by the decoder.
///
/// `channels` is 1 (gray), 2 (gray + alpha), 3 (RGB) or 4 (RGBA).
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

impl DecodedImage {
    /// Wrap an already decoded pixel buffer.
    ///
    /// Fails with [`Error::Decode`] when a dimension is zero, the channel
    /// count is outside `1..=4`, or the buffer length is not
    /// `width * height * channels`.
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::Decode(format!(
                "image has an empty dimension ({}x{})",
                width, height
            )));
        }
        if !(1..=4).contains(&channels) {
            return Err(Error::Decode(format!(
                "unsupported channel count {}",
                channels
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if pixels.len() != expected {
            return Err(Error::Decode(format!(
                "pixel buffer holds {} bytes, expected {}",
                pixels.len(),
                expected
            )));
        }

        Ok(DecodedImage {
            width,
            height,
            channels,
            pixels,
        })
    }

    /// Decode an image file (JPEG, PNG, BMP, GIF, TGA).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        debug!("decoding {}", path.display());
        let image = image::open(path)?;
        Self::from_dynamic(image)
    }

    /// Decode an in-memory encoded image.
    pub fn from_memory(bytes: &[u8]) -> Result<Self, Error> {
        let image = image::load_from_memory(bytes)?;
        Self::from_dynamic(image)
    }

    /// Keep the native channel layout for 8-bit images, everything else is
    /// narrowed to 8-bit RGBA.
    fn from_dynamic(image: DynamicImage) -> Result<Self, Error> {
        let (width, height) = (image.width(), image.height());
        let (channels, pixels) = match image {
            DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => (2, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
            other => (4, other.to_rgba8().into_raw()),
        };
        info!(
            "Loaded image: {}x{} ({} channels)",
            width, height, channels
        );
        Self::new(width, height, channels, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Channel-normalized RGB at `(x, y)`.
    ///
    /// Gray is replicated to all three channels and alpha is ignored.
    pub fn rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let channels = self.channels as usize;
        let index = (y as usize * self.width as usize + x as usize) * channels;
        let px = &self.pixels[index..index + channels];

        match channels {
            1 | 2 => (px[0], px[0], px[0]),
            _ => (px[0], px[1], px[2]),
        }
    }
}
