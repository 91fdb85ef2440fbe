use std::io::Cursor;

use em5820::{
    dither, luminance, pack, rasterize, resample, Alignment, BitmapMode, Config, DecodedImage,
    Error, GrayscaleRaster, Printer, TextStyle, Transport,
};
use pretty_assertions::assert_eq;

fn checkerboard(width: u32, height: u32) -> DecodedImage {
    let pixels = (0..height)
        .flat_map(|y| (0..width).map(move |x| if (x + y) % 2 == 0 { 0 } else { 255 }))
        .collect();
    DecodedImage::new(width, height, 1, pixels).unwrap()
}

fn encode_png(image: image::DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

#[test]
fn image_job_byte_stream() {
    let mut printer = Printer::new(Vec::<u8>::new(), Config::new().max_width(8)).unwrap();

    printer.reset().unwrap();
    printer.set_alignment(Alignment::Center).unwrap();
    printer.print_image(&checkerboard(8, 2)).unwrap();
    printer.feed_lines(5).unwrap();
    printer.reset().unwrap();

    let expected: Vec<u8> = vec![
        0x1B, 0x40, // reset
        0x1B, 0x61, 0x01, // center
        0x1D, 0x76, 0x30, 0x00, 0x01, 0x00, 0x02, 0x00, // GS v 0, 1 byte x 2 rows
        0xAA, 0x55, // pixels
        0x1B, 0x64, 0x05, // feed
        0x1B, 0x40, // reset
    ];
    assert_eq!(printer.into_inner(), expected);
}

#[test]
fn text_job_byte_stream() {
    let mut printer = Printer::new(Vec::<u8>::new(), Config::default()).unwrap();

    printer.reset().unwrap();
    printer.set_alignment(Alignment::Right).unwrap();
    printer
        .set_text_style(TextStyle::new(true, true, false, false))
        .unwrap();
    printer.write_lines(&["TOTAL", "12.00"]).unwrap();
    printer.feed_lines(2).unwrap();
    printer.reset().unwrap();

    let mut expected = vec![0x1B, 0x40, 0x1B, 0x61, 0x02, 0x1B, 0x21, 0x88];
    expected.extend_from_slice(b"TOTAL\n12.00\n\n");
    expected.extend_from_slice(&[0x1B, 0x64, 0x02, 0x1B, 0x40]);
    assert_eq!(printer.into_inner(), expected);
}

#[test]
fn decoded_png_prints_at_head_width() {
    let mut rgb = image::RgbImage::new(800, 100);
    for (x, _, px) in rgb.enumerate_pixels_mut() {
        *px = if x < 400 {
            image::Rgb([0, 0, 0])
        } else {
            image::Rgb([255, 255, 255])
        };
    }
    let png = encode_png(image::DynamicImage::ImageRgb8(rgb));

    let decoded = DecodedImage::from_memory(&png).unwrap();
    assert_eq!(decoded.channels(), 3);

    let bitmap = rasterize(&decoded, 384).unwrap();
    assert_eq!(bitmap.width(), 384);
    assert_eq!(bitmap.height(), 48);
    for row in bitmap.rows() {
        assert!(row[..24].iter().all(|&b| b == 0xFF));
        assert!(row[24..].iter().all(|&b| b == 0x00));
    }
}

#[test]
fn stages_compose_like_rasterize() {
    let pixels: Vec<u8> = (0..40u32 * 30 * 4).map(|i| (i * 37 % 251) as u8).collect();
    let image = DecodedImage::new(40, 30, 4, pixels).unwrap();

    let by_hand = pack(&dither(resample(&image, 24))).unwrap();
    assert_eq!(rasterize(&image, 24).unwrap(), by_hand);
    assert_eq!(by_hand.width(), 24);
    assert_eq!(by_hand.height(), 18);
}

#[test]
fn gray_ramp_gets_darker_to_the_left() {
    let samples: Vec<f32> = (0..64 * 32).map(|i| (i % 64) as f32 / 63.0).collect();
    let mono = dither(GrayscaleRaster::from_samples(64, 32, samples).unwrap());

    let ink_in = |range: std::ops::Range<u32>| {
        (0..32)
            .flat_map(|y| range.clone().map(move |x| (x, y)))
            .filter(|&(x, y)| mono.get(x, y))
            .count()
    };
    assert!(ink_in(0..16) > ink_in(48..64));
    assert!(luminance(40, 40, 40) < luminance(200, 200, 200));
}

#[test]
fn wide_mode_is_carried_into_the_header() {
    let config = Config::new().bitmap_mode(BitmapMode::Wide);
    let mut printer = Printer::new(Vec::<u8>::new(), config).unwrap();
    printer.print_image(&checkerboard(16, 1)).unwrap();
    assert_eq!(printer.into_inner()[3], 0x01);
}

struct ShortWriter;

impl Transport for ShortWriter {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        Err(Error::ShortWrite {
            written: buf.len() / 2,
            expected: buf.len(),
        })
    }
}

#[test]
fn transport_errors_propagate() {
    let mut printer = Printer::new(ShortWriter, Config::default()).unwrap();
    let err = printer.reset().unwrap_err();
    assert!(matches!(
        err,
        Error::ShortWrite {
            written: 1,
            expected: 2
        }
    ));
}

#[test]
fn borrowed_transport_keeps_recording() {
    let mut sink = Vec::<u8>::new();
    {
        let mut printer = Printer::new(&mut sink, Config::default()).unwrap();
        printer.feed_dots(24).unwrap();
    }
    assert_eq!(sink, vec![0x1B, 0x4A, 24]);
}
