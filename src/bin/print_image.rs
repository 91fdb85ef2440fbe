//! Print an image file on the receipt printer.
//!
//! ```bash
//! print_image photo.jpg
//! print_image --max-width 256 --align left --feed 3 logo.png
//! ```

use clap::{Parser, ValueEnum};
use log::info;
use std::{path::PathBuf, process};

use em5820::{Alignment, BitmapMode, Config, DecodedImage, Error, Printer, UsbConfig};

/// Print an image (JPG, PNG, BMP, TGA, GIF) on an EM5820 thermal printer
#[derive(Parser, Debug)]
#[command(name = "print_image", version, about, long_about = None)]
struct Cli {
    /// Image file to print
    file: PathBuf,

    /// Print width in dots; wider images are scaled down
    #[arg(long, default_value_t = em5820::DEFAULT_MAX_WIDTH)]
    max_width: u32,

    #[arg(long, value_enum, default_value_t = Align::Center)]
    align: Align,

    /// Raster scaling mode
    #[arg(long, value_enum, default_value_t = Mode::Normal)]
    mode: Mode,

    /// Lines to feed after the image
    #[arg(short, long, default_value_t = 5)]
    feed: u8,

    /// Raster rows per bitmap block
    #[arg(long, default_value_t = 50)]
    lines_per_batch: u16,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Align {
    Left,
    Center,
    Right,
}

impl From<Align> for Alignment {
    fn from(align: Align) -> Self {
        match align {
            Align::Left => Alignment::Left,
            Align::Center => Alignment::Center,
            Align::Right => Alignment::Right,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Normal,
    Wide,
    Tall,
    Huge,
}

impl From<Mode> for BitmapMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Normal => BitmapMode::Normal,
            Mode::Wide => BitmapMode::Wide,
            Mode::Tall => BitmapMode::Tall,
            Mode::Huge => BitmapMode::Huge,
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    // decode before touching the device
    let image = DecodedImage::open(&cli.file)?;

    let config = Config::new()
        .max_width(cli.max_width)
        .bitmap_mode(cli.mode.into())
        .lines_per_batch(cli.lines_per_batch);

    info!("Connecting to printer");
    let mut printer = Printer::open(UsbConfig::from_env()?, config)?;
    printer.reset()?;
    printer.set_alignment(cli.align.into())?;

    info!("Printing image");
    printer.print_image(&image)?;

    printer.feed_lines(cli.feed)?;
    printer.reset()?;
    info!("Done");
    Ok(())
}
