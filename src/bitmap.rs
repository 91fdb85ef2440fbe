//! 1-bit bitmap packing.
//!
//! Each row of a [`MonoRaster`] is packed into `width / 8` bytes. Bit 7 (MSB)
//! holds the leftmost pixel of its group of 8 and a set bit is a black dot:
//!
//! ```text
//! 0xF0 = 11110000 = ████░░░░
//! 0xAA = 10101010 = █░█░█░█░
//! ```

use crate::{dither::MonoRaster, error::Error};

/// Packed rows ready to be framed into a bitmap block.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedBitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PackedBitmap {
    /// Width in pixels, always a multiple of 8.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_row(&self) -> usize {
        self.width as usize / 8
    }

    /// All rows back to back, `bytes_per_row * height` bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(self.bytes_per_row())
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.bytes_per_row();
        &self.data[start..start + self.bytes_per_row()]
    }
}

/// Pack `raster` into MSB-first bytes.
///
/// Fails with [`Error::InvalidDimension`] unless the width is a non-zero
/// multiple of 8.
pub fn pack(raster: &MonoRaster) -> Result<PackedBitmap, Error> {
    let width = raster.width();
    if width == 0 || width % 8 != 0 {
        return Err(Error::InvalidDimension { width });
    }

    let data = raster
        .bits()
        .chunks_exact(8)
        .map(|group| {
            group
                .iter()
                .fold(0u8, |byte, &ink| (byte << 1) | ink as u8)
        })
        .collect();

    Ok(PackedBitmap {
        width,
        height: raster.height(),
        data,
    })
}

#[cfg(test)]
pub(crate) fn unpack(bitmap: &PackedBitmap) -> MonoRaster {
    let bits = bitmap
        .data()
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1))
        .collect();
    MonoRaster::from_bits(bitmap.width(), bitmap.height(), bits).unwrap()
}
