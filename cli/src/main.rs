use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser as _, ValueEnum};

#[derive(clap::Parser)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the dimensions and color type of a PNG file.
    Info {
        /// Path to the PNG file.
        file: PathBuf,
    },

    /// Decode a PNG file and encode it again with the given color type.
    Convert {
        /// Path to the PNG file to decode.
        input: PathBuf,

        /// Path to write the encoded PNG file to.
        output: PathBuf,

        /// The color type to encode with.
        #[clap(long, short = 'c', value_enum, default_value_t = Color::Rgba)]
        color: Color,
    },

    /// Compress a file as a zlib stream of stored blocks.
    Compress {
        /// Path to the file to compress.
        input: PathBuf,

        /// Path to write the zlib stream to.
        output: PathBuf,

        /// The compression level hint to write to the zlib header.
        #[clap(long, short = 'l', value_enum, default_value_t = Level::Fastest)]
        level: Level,
    },

    /// Decompress a zlib stream.
    Decompress {
        /// Path to the zlib stream to decompress.
        input: PathBuf,

        /// Path to write the decompressed data to.
        output: PathBuf,

        /// The maximum number of bytes the stream may decompress to.
        #[clap(long)]
        capacity: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Color {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Level {
    Fastest,
    Fast,
    Default,
    Maximum,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()
        .context("Error initializing logging")?;

    let args = Args::try_parse().context("Error parsing command line arguments")?;

    match args.command {
        Command::Info { file } => {
            let input = fs::read(file).context("Error reading file")?;
            let pngz::Info { width, height, color_type } =
                pngz::read_info(&input).map_err(|err| png_error(err, "parsing"))?;
            let alpha = if color_type.has_alpha() { "with alpha" } else { "opaque" };
            println!("{width}x{height} {color_type} ({alpha})");
        }
        Command::Convert { input, output, color } => {
            let image = pngz::load_file(input).map_err(|err| png_error(err, "decoding"))?;
            image.save_file(output, color.into()).context("Error encoding png file")?;
        }
        Command::Compress { input, output, level } => {
            let data = fs::read(input).context("Error reading file")?;
            let config = pngz_zlib::Config::builder().level(level.into()).build();
            let compressed = pngz_zlib::compress_with_config(&data, config).context("Error compressing file")?;
            fs::write(output, compressed).context("Error writing file")?;
        }
        Command::Decompress { input, output, capacity } => {
            let data = fs::read(input).context("Error reading file")?;
            let decompressed = pngz_zlib::decompress(&data, capacity).context("Error decompressing zlib stream")?;
            fs::write(output, decompressed).context("Error writing file")?;
        }
    }

    Ok(())
}

/// Wrap a PNG decoding error, naming its class when the input itself was at fault.
fn png_error(err: pngz::Error, action: &str) -> anyhow::Error {
    let context = match err.parse_error() {
        Some(parse_error) => format!("Error {action} png file ({} error)", parse_error.class()),
        None => format!("Error {action} png file"),
    };
    anyhow::Error::new(err).context(context)
}

impl From<Color> for pngz::ColorType {
    fn from(color: Color) -> Self {
        match color {
            Color::Gray => Self::Grayscale,
            Color::GrayAlpha => Self::GrayscaleAlpha,
            Color::Rgb => Self::Rgb,
            Color::Rgba => Self::Rgba,
        }
    }
}

impl From<Level> for pngz_zlib::CompressionLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Fastest => Self::Fastest,
            Level::Fast => Self::Fast,
            Level::Default => Self::Default,
            Level::Maximum => Self::Maximum,
        }
    }
}
