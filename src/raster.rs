//! Grayscale conversion and resampling.
//!
//! [`resample`] maps a [`DecodedImage`] onto a raster no wider than the print
//! head, with a width that is always a multiple of 8. Each destination pixel
//! picks its source pixel by nearest neighbour and goes through
//! [`luminance`].

use log::debug;

use crate::{decode::DecodedImage, error::Error};

/// Display gamma undone by [`luminance`].
const GAMMA: f32 = 2.2;

/// Gamma-corrected luminance of an RGB pixel, in `[0, 1]`.
///
/// `0.0` is black and `1.0` is white. Luma weights are the Rec. 601
/// `0.299 / 0.587 / 0.114`, applied in integer thousandths so that pure white
/// maps to exactly `1.0`.
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    let luma = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    (luma as f32 / 255_000.0).powf(1.0 / GAMMA)
}

/// Row-major grayscale samples, top-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayscaleRaster {
    width: u32,
    height: u32,
    samples: Vec<f32>,
}

impl GrayscaleRaster {
    /// Build a raster from raw samples.
    ///
    /// Fails with [`Error::RasterSize`] unless `samples.len() == width * height`.
    pub fn from_samples(width: u32, height: u32, samples: Vec<f32>) -> Result<Self, Error> {
        let expected = width as usize * height as usize;
        if samples.len() != expected {
            return Err(Error::RasterSize {
                expected,
                actual: samples.len(),
            });
        }
        Ok(GrayscaleRaster {
            width,
            height,
            samples,
        })
    }

    /// A raster filled with a single intensity.
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        GrayscaleRaster {
            width,
            height,
            samples: vec![value; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.samples[y as usize * self.width as usize + x as usize]
    }

    pub(crate) fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// Shrink `image` to fit `max_width` and convert it to grayscale.
///
/// The image is never enlarged. The output width is rounded down to a
/// multiple of 8 (at least 8), which drops up to 7 columns on the right
/// when no scaling happens. The scale factor `max_width / width` is kept as
/// an integer ratio so that the output width lands exactly on `max_width`.
pub fn resample(image: &DecodedImage, max_width: u32) -> GrayscaleRaster {
    let (width, height) = (image.width(), image.height());

    // scale = num / den, never above 1
    let (num, den) = if width > max_width {
        (max_width as u64, width as u64)
    } else {
        (1, 1)
    };
    if num != den {
        debug!(
            "Scaling image by {:.4} to fit printer width",
            num as f64 / den as f64
        );
    }

    let scaled_width = match (width as u64 * num / den) as u32 / 8 * 8 {
        0 => 8,
        w => w,
    };
    let scaled_height = (height as u64 * num / den) as u32;
    debug!("Scaled size: {}x{}", scaled_width, scaled_height);

    let mut samples = Vec::with_capacity(scaled_width as usize * scaled_height as usize);
    for y in 0..scaled_height {
        let src_y = ((y as u64 * den / num) as u32).min(height - 1);
        for x in 0..scaled_width {
            let src_x = ((x as u64 * den / num) as u32).min(width - 1);
            let (r, g, b) = image.rgb(src_x, src_y);
            samples.push(luminance(r, g, b));
        }
    }

    GrayscaleRaster {
        width: scaled_width,
        height: scaled_height,
        samples,
    }
}
