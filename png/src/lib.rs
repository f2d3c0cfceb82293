#![warn(missing_docs)]

//! `pngz` is a PNG decoder and encoder for 8-bit, non-interlaced grayscale, grayscale+alpha, RGB and RGBA images.
//!
//! Decoded images are always 8-bit RGBA. Encoded images always use a single `IDAT` chunk of stored (uncompressed)
//! DEFLATE blocks, produced by [`pngz_zlib`].
//!
//! # Usage
//!
//! The main entry points are [`load`], which decodes a PNG file held in memory, and [`save`], which encodes an
//! [`Image`] with a chosen [`ColorType`].
//!
//! ```
//! let image = pngz::Image::new(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 128])?;
//! let png = pngz::save(&image, pngz::ColorType::Rgba)?;
//! assert_eq!(pngz::load(&png)?, image);
//!
//! let info = pngz::read_info(&png)?;
//! assert_eq!((info.width, info.height), (2, 1));
//! # Ok::<(), pngz::Error>(())
//! ```
//!
//! The [`parse`] module also contains a less stable and undocumented API which can be used to parse individual PNG
//! chunk types.

pub mod parse;
mod reader;
mod util;
mod writer;

use std::fmt;
use std::fs;
use std::path::Path;

use derive_builder::Builder;
use derive_more::Display;
use pngz_common::error::ExtraUnparsedInput;
use pngz_common::{bail_attach, ensure_attach, ensure_eq_attach, InputSpan, ResultExt};

use crate::parse::chunk_type::{IDAT, IEND, IHDR};
use crate::parse::error::{MultipleChunks, ParseResultExt, WhileParsingChunk, WhileParsingChunkAt};
use crate::parse::{IhdrChunk, ParseChunk};
use crate::reader::ChunkReader;
use crate::writer::ChunkWriter;

//
// public types
//

/// Error type returned by `pngz`.
pub type Error = pngz_common::Error<ParseError>;

#[derive(Builder, Clone, Copy, Debug)]
#[builder(build_fn(name = "try_build"))]
/// Configuration for the PNG decoder and encoder.
pub struct Config {
    /// Whether to accept a file which ends without an `IEND` chunk.
    ///
    /// The default is `false`.
    #[builder(default)]
    pub allow_missing_iend: bool,

    /// The compression level hint written to the zlib header of encoded image data.
    ///
    /// The data itself is always stored uncompressed. The default is [`CompressionLevel::Fastest`].
    #[builder(default)]
    pub compression_level: CompressionLevel,
}

/// An 8-bit RGBA image.
///
/// The pixel buffer is owned by the image and always holds exactly `width * height * 4` bytes, row by row.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// The header of a PNG file, as read by [`read_info`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Info {
    /// The image width in pixels.
    pub width: u32,
    /// The image height in pixels.
    pub height: u32,
    /// The color type the image data is stored with.
    pub color_type: ColorType,
}

pub use parse::{ColorType, ParseError, MAX_DIMENSION};
pub use pngz_common::{ErrorClass, Report};
pub use pngz_zlib::CompressionLevel;

//
// private types
//

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "pixel buffer of `{_0}` bytes does not hold `{_1}`x`{_2}` RGBA pixels")]
struct PixelBufferLenMismatch(usize, u32, u32);

//
// public functions
//

/// Decode a PNG file held in memory.
///
/// See the [module-level documentation](self) for usage examples.
///
/// # Errors
///
/// If the input cannot be decoded, an [`Error`] is returned and no image is produced.
pub fn load(input: &[u8]) -> Result<Image, Error> {
    load_with_config(input, Config::default())
}

/// Decode a PNG file held in memory, with the given [`Config`].
///
/// # Errors
///
/// If the input cannot be decoded, an [`Error`] is returned and no image is produced.
pub fn load_with_config(input: &[u8], config: Config) -> Result<Image, Error> {
    let mut reader = ChunkReader::new(input)?;
    let ihdr = read_ihdr(&mut reader)?;
    let image_data_len = scan_chunks(reader.clone(), &config)?;
    let image_data = read_image_data(reader, image_data_len)?;

    let mut filtered = vec![0; ihdr.filtered_len()];
    let written = pngz_zlib::decompress_into(&image_data, &mut filtered)
        .map_err(|err| err.map(ParseError::Compression))
        .while_parsing_chunk(IDAT)?;
    ensure_eq_attach!(written, filtered.len(), ParseError::InvalidInput, "decompressed image data length");

    let pixels = parse::decode_scanlines(&mut filtered, &ihdr)?;
    let IhdrChunk { width, height, color_type, .. } = ihdr;
    log::debug!("decoded {width}x{height} {color_type} image");
    Ok(Image { width, height, pixels })
}

/// Read and decode the PNG file at `path`.
///
/// # Errors
///
/// If the file cannot be read or decoded, an [`Error`] is returned.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Image, Error> {
    load_file_with_config(path, Config::default())
}

/// Read and decode the PNG file at `path`, with the given [`Config`].
///
/// # Errors
///
/// If the file cannot be read or decoded, an [`Error`] is returned.
pub fn load_file_with_config<P: AsRef<Path>>(path: P, config: Config) -> Result<Image, Error> {
    let input = fs::read(path)?;
    load_with_config(&input, config)
}

/// Read the dimensions and color type of a PNG file from its `IHDR` chunk, without decoding the image data.
///
/// # Errors
///
/// If the signature or `IHDR` chunk is invalid or unsupported, an [`Error`] is returned.
pub fn read_info(input: &[u8]) -> Result<Info, Error> {
    let mut reader = ChunkReader::new(input)?;
    let IhdrChunk { width, height, color_type, .. } = read_ihdr(&mut reader)?;
    Ok(Info { width, height, color_type })
}

/// Encode `image` as a PNG file with the given [`ColorType`].
///
/// Encoding to a color type without alpha drops the alpha channel. Encoding to a grayscale color type stores the
/// truncated average of the red, green and blue samples.
///
/// # Errors
///
/// If the image data cannot be compressed, an [`Error`] is returned.
pub fn save(image: &Image, color_type: ColorType) -> Result<Vec<u8>, Error> {
    save_with_config(image, color_type, Config::default())
}

/// Encode `image` as a PNG file with the given [`ColorType`] and [`Config`].
///
/// # Errors
///
/// If the image data cannot be compressed, an [`Error`] is returned.
pub fn save_with_config(image: &Image, color_type: ColorType, config: Config) -> Result<Vec<u8>, Error> {
    let ihdr = IhdrChunk::new(image.width, image.height, color_type)?;
    let filtered = parse::encode_scanlines(&image.pixels, &ihdr);
    let zlib_config = pngz_zlib::Config::builder().level(config.compression_level).build();
    let compressed = pngz_zlib::compress_with_config(&filtered, zlib_config)
        .map_err(|err| err.map(ParseError::Compression))
        .while_parsing_chunk(IDAT)?;

    let mut writer = ChunkWriter::new(IhdrChunk::ENCODED_LEN as usize + compressed.len() + 3 * 12);
    writer.write_parsed(&ihdr);
    writer.write_chunk(IDAT, &compressed);
    writer.write_chunk(IEND, &[]);
    let output = writer.finish();

    log::info!(
        "encoded {width}x{height} {color_type} image: {len} bytes",
        width = image.width,
        height = image.height,
        len = output.len(),
    );
    Ok(output)
}

//
// private functions
//

fn read_ihdr(reader: &mut ChunkReader<'_>) -> Result<IhdrChunk, Error> {
    let chunk = reader.read_chunk(IHDR).attach_printable("while parsing first chunk")?;
    chunk.verify_crc()?;
    let ihdr @ IhdrChunk { width, height, color_type, .. } = IhdrChunk::parse(chunk.data).while_parsing_chunk(IHDR)?;

    let InputSpan { offset, len } = chunk.span;
    log::info!("{name} @ 0x{offset:08x}: {len} bytes, {width}x{height} {color_type}", name = IHDR);
    Ok(ihdr)
}

/// Walk the chunks following `IHDR` up to `IEND`, checking every CRC and returning the total length of the `IDAT`
/// chunks' data.
fn scan_chunks(mut reader: ChunkReader<'_>, config: &Config) -> Result<usize, Error> {
    let mut image_data_len = 0;
    let mut idat_count = 0;
    loop {
        if !reader.has_remaining() {
            ensure_attach!(config.allow_missing_iend, ParseError::MissingRequiredChunk(IEND));
            break;
        }

        let chunk = reader.read_any_chunk().attach_printable("while scanning chunks")?;
        chunk.verify_crc()?;
        match chunk.name {
            IDAT => {
                image_data_len += chunk.data.len();
                idat_count += 1;
            }
            IEND => {
                ensure_attach!(
                    chunk.data.is_empty(),
                    ParseError::InvalidInput,
                    "non-empty chunk",
                    WhileParsingChunk(IEND),
                );
                ensure_attach!(
                    !reader.has_remaining(),
                    ParseError::InvalidInput,
                    ExtraUnparsedInput,
                    WhileParsingChunkAt(reader.offset()),
                );
                break;
            }
            IHDR => bail_attach!(ParseError::InvalidChunkLayout, MultipleChunks(IHDR)),
            name => {
                let kind = if name.is_ancillary() { "ancillary" } else { "critical" };
                log::debug!("skipping {kind} {name} chunk: {len} bytes", len = chunk.data.len());
            }
        }
    }

    ensure_attach!(idat_count != 0, ParseError::MissingRequiredChunk(IDAT));
    log::debug!("{idat_count} {IDAT} chunks: {image_data_len} bytes");
    Ok(image_data_len)
}

/// Walk the chunks following `IHDR` again, re-checking every CRC and concatenating the `IDAT` chunks' data.
fn read_image_data(mut reader: ChunkReader<'_>, image_data_len: usize) -> Result<Vec<u8>, Error> {
    let mut image_data = Vec::with_capacity(image_data_len);
    while reader.has_remaining() {
        let chunk = reader.read_any_chunk()?;
        chunk.verify_crc()?;

        let InputSpan { offset, len } = chunk.span;
        log::info!("{name} @ 0x{offset:08x}: {len} bytes", name = chunk.name);
        match chunk.name {
            IDAT => image_data.extend_from_slice(chunk.data),
            IEND => break,
            _ => {}
        }
    }
    Ok(image_data)
}

//
// Config impls
//

impl Config {
    /// Construct a builder for `Config`.
    ///
    /// See the documentation for [`ConfigBuilder`].
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

//
// ConfigBuilder impls
//

impl ConfigBuilder {
    /// Build a new [`Config`].
    pub fn build(&self) -> Config {
        self.try_build().unwrap_or_else(|_| unreachable!("every field has a default"))
    }
}

//
// Image impls
//

impl Image {
    /// Construct an image from 8-bit RGBA `pixels`, row by row.
    ///
    /// # Errors
    ///
    /// If `width` or `height` is zero or larger than [`MAX_DIMENSION`], or `pixels` does not hold exactly
    /// `width * height * 4` bytes, an [`Error`] is returned.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, Error> {
        IhdrChunk::new(width, height, ColorType::Rgba)?;
        ensure_attach!(
            pixels.len() as u64 == u64::from(width) * u64::from(height) * 4,
            ParseError::InvalidInput,
            PixelBufferLenMismatch(pixels.len(), width, height),
        );
        Ok(Self { width, height, pixels })
    }

    /// The width of the image in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The height of the image in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The RGBA pixels of the image, row by row.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Unwrap this image, returning its RGBA pixels.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Encode this image with the given [`ColorType`] and write it to the file at `path`.
    ///
    /// # Errors
    ///
    /// If the image cannot be encoded or the file cannot be written, an [`Error`] is returned.
    pub fn save_file<P: AsRef<Path>>(&self, path: P, color_type: ColorType) -> Result<(), Error> {
        let output = save(self, color_type)?;
        fs::write(path, output)?;
        Ok(())
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels_len", &self.pixels.len())
            .finish()
    }
}
