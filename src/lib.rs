//! EM5820 Thermal Printer Driver
//!
//! This crate turns raster images and text into the ESC/POS command stream
//! understood by EM5820-class receipt printers and sends it over USB.
//!
//! The image path is `decode -> resample -> luminance -> dither -> pack ->
//! GS v 0`, every stage owning its output.
//!
//! # Example
//!
//! ```rust,no_run
//! use em5820::{Alignment, Config, DecodedImage, Printer, UsbConfig};
//!
//! let image = DecodedImage::open("logo.png").unwrap();
//! let mut printer = Printer::open(UsbConfig::default(), Config::new()).unwrap();
//! printer.reset().unwrap();
//! printer.set_alignment(Alignment::Center).unwrap();
//! printer.print_image(&image).unwrap();
//! printer.feed_lines(5).unwrap();
//! printer.reset().unwrap();
//! ```

mod bitmap;
pub mod command;
mod decode;
mod dither;
mod error;
mod printer;
mod raster;
mod transport;

pub use crate::{
    bitmap::{pack, PackedBitmap},
    command::{Alignment, BitmapMode, TextStyle},
    decode::DecodedImage,
    dither::{dither, MonoRaster},
    error::Error,
    printer::{rasterize, Config, Printer},
    raster::{luminance, resample, GrayscaleRaster},
    transport::{Transport, UsbConfig, UsbTransport},
};

/// Print head width in dots of a 58 mm EM5820 module.
///
/// Images wider than this are scaled down; 384 / 8 = 48 bytes per raster row.
pub const DEFAULT_MAX_WIDTH: u32 = 384;
