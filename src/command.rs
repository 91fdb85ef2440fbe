//! ESC/POS command frames.
//!
//! Every function returns the complete byte sequence for one device
//! operation. Nothing here does I/O or keeps state; frames are handed to a
//! [`Transport`](crate::Transport) in order by the [`Printer`](crate::Printer).
//!
//! | Operation | Bytes |
//! |-----------|-------|
//! | reset | `1B 40` |
//! | alignment | `1B 61 n` |
//! | text style | `1B 21 n` |
//! | underline | `1B 2D n` |
//! | print position | `1B 24 nL nH` |
//! | text scale | `1D 21 n` |
//! | feed lines | `1B 64 n` |
//! | feed dots | `1B 4A n` |
//! | raster bitmap | `1D 76 30 m xL xH yL yH d1...dk` |

use bitflags::bitflags;
use std::convert::TryFrom;

use crate::{bitmap::PackedBitmap, error::Error};

pub const ESC: u8 = 0x1B;
pub const GS: u8 = 0x1D;

/// Horizontal justification, `ESC a n`.
///
/// The discriminant is the wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Alignment {
    Left = 0,
    Center = 1,
    Right = 2,
}

/// Raster scaling mode, the `m` byte of `GS v 0`.
///
/// The discriminant is the wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BitmapMode {
    Normal = 0,
    /// Double width.
    Wide = 1,
    /// Double height.
    Tall = 2,
    /// Double width and height.
    Huge = 3,
}

bitflags! {
    /// Print mode flags for `ESC ! n`.
    pub struct TextStyle: u8 {
        /// 9x17 font instead of the default 12x24.
        const SMALL_FONT = 0x01;
        const BOLD = 0x08;
        const DOUBLE_HEIGHT = 0x10;
        const DOUBLE_WIDTH = 0x20;
        const UNDERLINE = 0x80;
    }
}

impl TextStyle {
    pub fn new(bold: bool, underline: bool, double_width: bool, double_height: bool) -> Self {
        let mut style = TextStyle::empty();
        style.set(TextStyle::BOLD, bold);
        style.set(TextStyle::UNDERLINE, underline);
        style.set(TextStyle::DOUBLE_WIDTH, double_width);
        style.set(TextStyle::DOUBLE_HEIGHT, double_height);
        style
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle::empty()
    }
}

/// `ESC @`, clear the print buffer and restore default modes.
pub fn reset() -> Vec<u8> {
    vec![ESC, 0x40]
}

pub fn set_alignment(alignment: Alignment) -> Vec<u8> {
    vec![ESC, 0x61, alignment as u8]
}

/// `ESC ! n`, or `None` for the default style.
///
/// A reset already leaves the device in the default style, so there is
/// nothing to send.
pub fn set_text_style(style: TextStyle) -> Option<Vec<u8>> {
    if style.is_empty() {
        None
    } else {
        Some(vec![ESC, 0x21, style.bits()])
    }
}

/// `GS ! n`, character magnification. Each factor uses its low nibble.
pub fn set_text_scale(horizontal: u8, vertical: u8) -> Vec<u8> {
    vec![GS, 0x21, ((horizontal & 0x0F) << 4) | (vertical & 0x0F)]
}

/// `ESC - n`, underline thickness in dots, capped at 2.
pub fn set_underline(thickness: u8) -> Vec<u8> {
    vec![ESC, 0x2D, thickness.min(2)]
}

/// `ESC $ nL nH`, absolute horizontal print position in dots.
pub fn set_print_position(position: u16) -> Vec<u8> {
    let [lo, hi] = position.to_le_bytes();
    vec![ESC, 0x24, lo, hi]
}

pub fn feed_lines(lines: u8) -> Vec<u8> {
    vec![ESC, 0x64, lines]
}

pub fn feed_dots(dots: u8) -> Vec<u8> {
    vec![ESC, 0x4A, dots]
}

/// Raw text for the built-in font.
///
/// Bytes are passed through untouched. Control bytes such as `ESC`, `GS` or
/// `LF` are interpreted by the device.
pub fn write_text(text: &[u8]) -> Vec<u8> {
    text.to_vec()
}

/// `GS v 0`, the whole bitmap as a single raster block.
///
/// Fails with [`Error::InvalidDimension`] when the row width in bytes or the
/// row count does not fit the 16-bit header fields; use [`bitmap_bands`] for
/// tall bitmaps.
pub fn bitmap_block(mode: BitmapMode, bitmap: &PackedBitmap) -> Result<Vec<u8>, Error> {
    let bytes_per_row = header_width(bitmap)?;
    let rows = u16::try_from(bitmap.height()).map_err(|_| Error::InvalidDimension {
        width: bitmap.width(),
    })?;
    Ok(raster_block(mode, bytes_per_row, rows, bitmap.data()))
}

/// Split `bitmap` into `GS v 0` blocks of at most `lines_per_batch` rows.
///
/// Fails with [`Error::InvalidConfig`] for a zero batch and with
/// [`Error::InvalidDimension`] when a row is wider than 65535 bytes.
pub fn bitmap_bands(
    mode: BitmapMode,
    bitmap: &PackedBitmap,
    lines_per_batch: u16,
) -> Result<impl Iterator<Item = Vec<u8>> + '_, Error> {
    if lines_per_batch == 0 {
        return Err(Error::InvalidConfig(
            "lines_per_batch must be positive".to_string(),
        ));
    }
    let bytes_per_row = header_width(bitmap)?;
    let band_len = bytes_per_row as usize * lines_per_batch as usize;

    Ok(bitmap.data().chunks(band_len).map(move |band| {
        let rows = band.len() / bytes_per_row as usize;
        raster_block(mode, bytes_per_row, rows as u16, band)
    }))
}

fn header_width(bitmap: &PackedBitmap) -> Result<u16, Error> {
    u16::try_from(bitmap.bytes_per_row()).map_err(|_| Error::InvalidDimension {
        width: bitmap.width(),
    })
}

fn raster_block(mode: BitmapMode, bytes_per_row: u16, rows: u16, payload: &[u8]) -> Vec<u8> {
    let [x_lo, x_hi] = bytes_per_row.to_le_bytes();
    let [y_lo, y_hi] = rows.to_le_bytes();

    let mut buf = Vec::with_capacity(8 + payload.len());
    buf.extend_from_slice(&[GS, 0x76, 0x30, mode as u8, x_lo, x_hi, y_lo, y_hi]);
    buf.extend_from_slice(payload);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bitmap::pack, dither::MonoRaster};
    use pretty_assertions::assert_eq;

    fn bitmap(width: u32, height: u32) -> PackedBitmap {
        let bits = (0..width * height).map(|i| i % 3 == 0).collect();
        pack(&MonoRaster::from_bits(width, height, bits).unwrap()).unwrap()
    }

    #[test]
    fn fixed_frames() {
        assert_eq!(reset(), vec![0x1B, 0x40]);
        assert_eq!(feed_lines(5), vec![0x1B, 0x64, 5]);
        assert_eq!(feed_dots(24), vec![0x1B, 0x4A, 24]);
        assert_eq!(set_underline(7), vec![0x1B, 0x2D, 2]);
        assert_eq!(set_print_position(0x0123), vec![0x1B, 0x24, 0x23, 0x01]);
        assert_eq!(set_text_scale(1, 0x12), vec![0x1D, 0x21, 0x12]);
        assert_eq!(write_text(b"hi\n"), b"hi\n".to_vec());
    }

    #[test]
    fn alignment_ordinals() {
        assert_eq!(set_alignment(Alignment::Left), vec![0x1B, 0x61, 0]);
        assert_eq!(set_alignment(Alignment::Center), vec![0x1B, 0x61, 1]);
        assert_eq!(set_alignment(Alignment::Right), vec![0x1B, 0x61, 2]);
    }

    #[test]
    fn text_style_flags() {
        assert_eq!(set_text_style(TextStyle::default()), None);
        assert_eq!(set_text_style(TextStyle::new(false, false, false, false)), None);
        assert_eq!(
            set_text_style(TextStyle::new(true, false, false, false)),
            Some(vec![0x1B, 0x21, 0x08])
        );
        assert_eq!(
            set_text_style(TextStyle::new(true, true, true, true)),
            Some(vec![0x1B, 0x21, 0xB8])
        );
        assert_eq!(
            set_text_style(TextStyle::DOUBLE_WIDTH | TextStyle::DOUBLE_HEIGHT),
            Some(vec![0x1B, 0x21, 0x30])
        );
        assert_eq!(
            set_text_style(TextStyle::SMALL_FONT),
            Some(vec![0x1B, 0x21, 0x01])
        );
    }

    #[test]
    fn bitmap_block_header() {
        let bitmap = bitmap(16, 2);
        let frame = bitmap_block(BitmapMode::Normal, &bitmap).unwrap();

        assert_eq!(
            &frame[..8],
            &[0x1D, 0x76, 0x30, 0x00, 0x02, 0x00, 0x02, 0x00]
        );
        assert_eq!(frame.len(), 8 + 4);
        assert_eq!(&frame[8..], bitmap.data());
    }

    #[test]
    fn bitmap_block_encodes_little_endian() {
        let bitmap = bitmap(384, 300);
        let frame = bitmap_block(BitmapMode::Huge, &bitmap).unwrap();
        assert_eq!(&frame[..8], &[0x1D, 0x76, 0x30, 0x03, 48, 0, 0x2C, 0x01]);
    }

    #[test]
    fn bands_split_rows() {
        let bitmap = bitmap(16, 5);
        let bands: Vec<Vec<u8>> = bitmap_bands(BitmapMode::Normal, &bitmap, 2)
            .unwrap()
            .collect();

        assert_eq!(bands.len(), 3);
        assert_eq!(&bands[0][..8], &[0x1D, 0x76, 0x30, 0, 2, 0, 2, 0]);
        assert_eq!(&bands[2][..8], &[0x1D, 0x76, 0x30, 0, 2, 0, 1, 0]);

        let payload: Vec<u8> = bands.iter().flat_map(|b| b[8..].to_vec()).collect();
        assert_eq!(payload, bitmap.data().to_vec());
    }

    #[test]
    fn single_band_matches_block() {
        let bitmap = bitmap(32, 10);
        let bands: Vec<Vec<u8>> = bitmap_bands(BitmapMode::Wide, &bitmap, 50)
            .unwrap()
            .collect();
        assert_eq!(bands, vec![bitmap_block(BitmapMode::Wide, &bitmap).unwrap()]);
    }

    #[test]
    fn bitmap_block_rejects_rows_beyond_header_range() {
        let tall = bitmap(8, u16::MAX as u32 + 2);
        assert!(matches!(
            bitmap_block(BitmapMode::Normal, &tall),
            Err(Error::InvalidDimension { width: 8 })
        ));

        let at_limit = bitmap(8, u16::MAX as u32);
        let frame = bitmap_block(BitmapMode::Normal, &at_limit).unwrap();
        assert_eq!(&frame[4..8], &[1, 0, 0xFF, 0xFF]);
    }

    #[test]
    fn tall_bitmaps_still_band() {
        let tall = bitmap(8, u16::MAX as u32 + 2);
        let bands: Vec<Vec<u8>> = bitmap_bands(BitmapMode::Normal, &tall, 50)
            .unwrap()
            .collect();
        let rows: usize = bands
            .iter()
            .map(|b| u16::from_le_bytes([b[6], b[7]]) as usize)
            .sum();
        assert_eq!(rows, u16::MAX as usize + 2);
        assert!(bands.iter().all(|b| b.len() == 8 + u16::from_le_bytes([b[6], b[7]]) as usize));
    }

    #[test]
    fn zero_batch_is_rejected() {
        assert!(matches!(
            bitmap_bands(BitmapMode::Normal, &bitmap(8, 1), 0).err(),
            Some(Error::InvalidConfig(_))
        ));
    }
}
