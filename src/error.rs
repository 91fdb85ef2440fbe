//! Error types for EM5820 printer operations.
//!
//! This module defines all possible errors that can occur while decoding an
//! image, rasterizing it, or sending the command stream to the device.

use rusb;
use thiserror::Error;

/// Main error type for EM5820 printer operations.
///
/// Nothing is retried inside the crate. Every failure surfaces here so the
/// caller can decide what to do with it.
#[derive(Error, Debug)]
pub enum Error {
    /// The input could not be parsed as an image.
    ///
    /// Raised before rasterization starts.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// A raster violates the byte-alignment invariant.
    ///
    /// The resampler always produces widths that are a non-zero multiple of 8,
    /// so seeing this from the image pipeline means a bug upstream.
    #[error("Invalid raster width {width}, must be a non-zero multiple of 8")]
    InvalidDimension { width: u32 },

    /// A raster buffer does not hold `width * height` pixels.
    #[error("Raster holds {actual} pixels, expected {expected}")]
    RasterSize { expected: usize, actual: usize },

    /// Invalid configuration parameter provided.
    #[error("Invalid configuration parameter: {0}")]
    InvalidConfig(String),

    /// USB communication error.
    ///
    /// Wraps underlying rusb errors for device communication issues,
    /// timeouts, or permission problems.
    #[error(transparent)]
    UsbError(#[from] rusb::Error),

    #[error("Device {vendor_id:04x}:{product_id:04x} not found")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    #[error("Can't read device list, permission issue ?")]
    DeviceListNotReadable,

    /// The device accepted fewer bytes than were supplied.
    #[error("Short write: {written} of {expected} bytes accepted")]
    ShortWrite { written: usize, expected: usize },

    /// Failure reported by a non-USB transport.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for failures that happened while talking to the device.
    ///
    /// These abort the remaining command sequence.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::UsbError(_)
                | Self::DeviceNotFound { .. }
                | Self::DeviceListNotReadable
                | Self::ShortWrite { .. }
                | Self::Transport(_)
        )
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_transport_errors() {
        assert!(Error::ShortWrite {
            written: 1,
            expected: 2
        }
        .is_transport());
        assert!(Error::UsbError(rusb::Error::Timeout).is_transport());
        assert!(Error::Transport("gone".to_string()).is_transport());
        assert!(!Error::Decode("bad header".to_string()).is_transport());
        assert!(!Error::InvalidDimension { width: 7 }.is_transport());
    }

    #[test]
    fn formats_device_ids_as_hex() {
        let err = Error::DeviceNotFound {
            vendor_id: 0x28e9,
            product_id: 0x0289,
        };
        assert_eq!(err.to_string(), "Device 28e9:0289 not found");
    }
}
