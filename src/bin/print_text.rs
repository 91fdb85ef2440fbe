//! Read text from stdin and print it on the receipt printer.
//!
//! ```bash
//! echo 'Hello World' | print_text
//! date | print_text --bold --center
//! fortune | print_text -L -f 4
//! ```

use clap::Parser;
use std::{
    io::{self, BufRead},
    process,
};

use em5820::{Alignment, Error, Printer, TextStyle, UsbConfig};

/// Print stdin on an EM5820 thermal printer
#[derive(Parser, Debug)]
#[command(name = "print_text", version, about, long_about = None)]
struct Cli {
    /// Print in bold
    #[arg(short, long)]
    bold: bool,

    /// Print with underline
    #[arg(short, long)]
    underline: bool,

    /// Left align (default)
    #[arg(short, long, overrides_with_all = ["center", "right"])]
    left: bool,

    /// Center align
    #[arg(short, long, overrides_with_all = ["left", "right"])]
    center: bool,

    /// Right align
    #[arg(short, long, overrides_with_all = ["left", "center"])]
    right: bool,

    /// Double width text
    #[arg(short, long)]
    wide: bool,

    /// Double height text
    #[arg(short, long)]
    tall: bool,

    /// Double width and height
    #[arg(short = 'L', long)]
    large: bool,

    /// Lines to feed after printing
    #[arg(short, long, default_value_t = 2)]
    feed: u8,
}

impl Cli {
    /// The last of `-l`, `-c` and `-r` wins.
    fn alignment(&self) -> Alignment {
        if self.center {
            Alignment::Center
        } else if self.right {
            Alignment::Right
        } else {
            Alignment::Left
        }
    }

    fn style(&self) -> TextStyle {
        TextStyle::new(
            self.bold,
            self.underline,
            self.wide || self.large,
            self.tall || self.large,
        )
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

/// Split `reader` on line feeds. Bytes are kept as is, so legacy code page
/// text reaches the printer untouched.
fn read_lines<R: BufRead>(reader: R) -> io::Result<Vec<Vec<u8>>> {
    reader.split(b'\n').collect()
}

fn run(cli: Cli) -> Result<(), Error> {
    let stdin = io::stdin();
    let lines = read_lines(stdin.lock())?;

    let mut printer = Printer::open(UsbConfig::from_env()?, Default::default())?;
    printer.reset()?;
    printer.set_alignment(cli.alignment())?;
    printer.set_text_style(cli.style())?;
    printer.write_lines(&lines)?;

    printer.feed_lines(cli.feed)?;
    printer.reset()?;
    Ok(())
}
