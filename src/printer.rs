use log::{debug, info};

use crate::{
    bitmap::{pack, PackedBitmap},
    command::{self, Alignment, BitmapMode, TextStyle},
    decode::DecodedImage,
    dither::dither,
    error::Error,
    raster::resample,
    transport::{Transport, UsbConfig, UsbTransport},
    DEFAULT_MAX_WIDTH,
};

/// Run the image pipeline: resample, dither and pack.
///
/// The returned bitmap is at most `max_width` pixels wide (but never
/// narrower than 8) and its width is a multiple of 8.
pub fn rasterize(image: &DecodedImage, max_width: u32) -> Result<PackedBitmap, Error> {
    let gray = resample(image, max_width);
    debug!("Applying Floyd-Steinberg dithering");
    let mono = dither(gray);
    let bitmap = pack(&mono)?;
    info!(
        "Final bitmap: {}x{} ({} bytes)",
        bitmap.width(),
        bitmap.height(),
        bitmap.data().len()
    );
    Ok(bitmap)
}

/// Config
///
#[derive(Debug, Clone)]
pub struct Config {
    max_width: u32,
    bitmap_mode: BitmapMode,
    lines_per_batch: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_width: DEFAULT_MAX_WIDTH,
            bitmap_mode: BitmapMode::Normal,
            lines_per_batch: 50,
        }
    }
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    /// Widest raster sent to the print head, in dots.
    pub fn max_width(self, max_width: u32) -> Self {
        Config { max_width, ..self }
    }

    pub fn bitmap_mode(self, bitmap_mode: BitmapMode) -> Self {
        Config {
            bitmap_mode,
            ..self
        }
    }

    /// Rows per `GS v 0` block. Large images are sent as several blocks.
    pub fn lines_per_batch(self, lines_per_batch: u16) -> Self {
        Config {
            lines_per_batch,
            ..self
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if self.lines_per_batch == 0 {
            return Err(Error::InvalidConfig(
                "lines_per_batch must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sends command frames to a [`Transport`] in program order.
///
/// Each method writes its frames immediately and returns the number of bytes
/// accepted. The first transport error aborts the operation and is returned
/// as is; nothing is retried.
pub struct Printer<T: Transport> {
    transport: T,
    config: Config,
}

impl Printer<UsbTransport> {
    /// Open the USB printer described by `usb`.
    pub fn open(usb: UsbConfig, config: Config) -> Result<Self, Error> {
        config.validate()?;
        let transport = UsbTransport::open(usb)?;
        Ok(Printer { transport, config })
    }
}

impl<T: Transport> Printer<T> {
    pub fn new(transport: T, config: Config) -> Result<Self, Error> {
        config.validate()?;
        Ok(Printer { transport, config })
    }

    /// Give the transport back, e.g. to inspect what was recorded.
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn send(&mut self, frame: &[u8]) -> Result<usize, Error> {
        debug!("frame {} bytes: {:02X?}", frame.len(), &frame[..frame.len().min(8)]);
        self.transport.write(frame)
    }

    pub fn reset(&mut self) -> Result<usize, Error> {
        self.send(&command::reset())
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> Result<usize, Error> {
        self.send(&command::set_alignment(alignment))
    }

    /// Sends nothing for the default style.
    pub fn set_text_style(&mut self, style: TextStyle) -> Result<usize, Error> {
        match command::set_text_style(style) {
            Some(frame) => self.send(&frame),
            None => Ok(0),
        }
    }

    pub fn set_text_scale(&mut self, horizontal: u8, vertical: u8) -> Result<usize, Error> {
        self.send(&command::set_text_scale(horizontal, vertical))
    }

    pub fn set_underline(&mut self, thickness: u8) -> Result<usize, Error> {
        self.send(&command::set_underline(thickness))
    }

    pub fn set_print_position(&mut self, position: u16) -> Result<usize, Error> {
        self.send(&command::set_print_position(position))
    }

    pub fn feed_lines(&mut self, lines: u8) -> Result<usize, Error> {
        self.send(&command::feed_lines(lines))
    }

    pub fn feed_dots(&mut self, dots: u8) -> Result<usize, Error> {
        self.send(&command::feed_dots(dots))
    }

    pub fn write_text(&mut self, text: &[u8]) -> Result<usize, Error> {
        self.send(&command::write_text(text))
    }

    /// Write `lines` separated by line feeds, followed by two blank lines.
    pub fn write_lines<I, S>(&mut self, lines: I) -> Result<usize, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut total = 0;
        for (n, line) in lines.into_iter().enumerate() {
            if n > 0 {
                total += self.write_text(b"\n")?;
            }
            total += self.write_text(line.as_ref())?;
        }
        total += self.write_text(b"\n\n")?;
        Ok(total)
    }

    /// Print `bitmap` in blocks of `lines_per_batch` rows.
    pub fn print_bitmap(&mut self, mode: BitmapMode, bitmap: &PackedBitmap) -> Result<usize, Error> {
        let mut total = 0;
        for band in command::bitmap_bands(mode, bitmap, self.config.lines_per_batch)? {
            total += self.send(&band)?;
        }
        Ok(total)
    }

    /// Rasterize `image` to the configured width and print it.
    pub fn print_image(&mut self, image: &DecodedImage) -> Result<usize, Error> {
        let bitmap = rasterize(image, self.config.max_width)?;
        self.print_bitmap(self.config.bitmap_mode, &bitmap)
    }
}
