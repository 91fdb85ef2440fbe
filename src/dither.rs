//! Floyd-Steinberg error diffusion.
//!
//! Turns a [`GrayscaleRaster`] into a [`MonoRaster`] in a single row-major
//! pass. Each pixel is snapped to black or white and the rounding error is
//! pushed onto the neighbours that have not been visited yet:
//!
//! ```text
//!             .     X    7/16
//!           3/16  5/16   1/16
//! ```
//!
//! Error that would land outside the raster is dropped. The scan is
//! sequential by nature, rows cannot be processed in parallel.

use crate::{error::Error, raster::GrayscaleRaster};

/// One bit per pixel, `true` = ink (black dot).
#[derive(Debug, Clone, PartialEq)]
pub struct MonoRaster {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl MonoRaster {
    /// Fails with [`Error::RasterSize`] unless `bits.len() == width * height`.
    pub fn from_bits(width: u32, height: u32, bits: Vec<bool>) -> Result<Self, Error> {
        let expected = width as usize * height as usize;
        if bits.len() != expected {
            return Err(Error::RasterSize {
                expected,
                actual: bits.len(),
            });
        }
        Ok(MonoRaster {
            width,
            height,
            bits,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.bits[y as usize * self.width as usize + x as usize]
    }

    /// Number of inked pixels.
    pub fn ink_count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}

/// Dither `raster` to black and white.
///
/// A sample quantizes to white (`1.0`) only when it is strictly above `0.5`,
/// so an exact `0.5` prints as a black dot.
pub fn dither(raster: GrayscaleRaster) -> MonoRaster {
    let width = raster.width() as usize;
    let height = raster.height() as usize;
    let mut work = raster.into_samples();
    let mut bits = vec![false; work.len()];

    for y in 0..height {
        let row = y * width;
        let below = row + width;
        let has_below = y + 1 < height;

        for x in 0..width {
            let idx = row + x;
            let value = work[idx];
            let out = if value > 0.5 { 1.0 } else { 0.0 };
            let error = value - out;

            bits[idx] = out == 0.0;

            if x + 1 < width {
                work[idx + 1] += error * 7.0 / 16.0;
            }
            if has_below {
                if x > 0 {
                    work[below + x - 1] += error * 3.0 / 16.0;
                }
                work[below + x] += error * 5.0 / 16.0;
                if x + 1 < width {
                    work[below + x + 1] += error * 1.0 / 16.0;
                }
            }
        }
    }

    MonoRaster {
        width: width as u32,
        height: height as u32,
        bits,
    }
}
