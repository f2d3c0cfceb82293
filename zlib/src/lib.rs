#![warn(missing_docs)]

//! `pngz-zlib` is a zlib (RFC 1950) and DEFLATE (RFC 1951) codec.
//!
//! Decoding handles stored, fixed Huffman and dynamic Huffman blocks. Encoding always emits stored blocks, so the
//! compressed size of any input is known in advance from [`compressed_len`].
//!
//! # Usage
//!
//! ```
//! let compressed = pngz_zlib::compress(b"hello, hello")?;
//! assert_eq!(compressed.len(), pngz_zlib::compressed_len(12));
//!
//! let decompressed = pngz_zlib::decompress(&compressed, 12)?;
//! assert_eq!(decompressed, b"hello, hello");
//! # Ok::<(), pngz_zlib::Error>(())
//! ```
//!
//! The [`deflate`] module exposes the raw DEFLATE codec and its Huffman table builder.

pub mod deflate;
mod error;
mod header;
mod util;

use bytes::{Buf, BufMut};
use derive_builder::Builder;
use pngz_common::error::{ExtraUnparsedInput, TruncatedAt};
use pngz_common::{ensure_attach, ensure_eq_attach, ensure_matches_attach, ResultExt};

use crate::error::OutputFull;

//
// public types
//

pub use error::ParseError;
pub use header::{CompressionLevel, ZlibHeader};

/// Error type returned by `pngz-zlib`.
pub type Error = pngz_common::Report<ParseError>;

#[derive(Builder, Clone, Copy, Debug)]
#[builder(build_fn(name = "try_build"))]
/// Configuration for the zlib encoder.
pub struct Config {
    /// The compression level hint written to the stream header.
    ///
    /// The default is [`CompressionLevel::Fastest`].
    #[builder(default)]
    pub level: CompressionLevel,
}

/// The length of the Adler-32 trailer following the DEFLATE data.
pub const TRAILER_LEN: usize = 4;

//
// public functions
//

/// The exact length of the zlib stream [`compress`] produces for `input_len` bytes of input.
pub fn compressed_len(input_len: usize) -> usize {
    ZlibHeader::ENCODED_LEN + deflate::compressed_len(input_len) + TRAILER_LEN
}

/// Compress `input` into a new zlib stream of exactly [`compressed_len`] bytes.
pub fn compress(input: &[u8]) -> Result<Vec<u8>, Error> {
    compress_with_config(input, Config::default())
}

/// Compress `input` into a new zlib stream, with the given [`Config`].
pub fn compress_with_config(input: &[u8], config: Config) -> Result<Vec<u8>, Error> {
    let mut output = vec![0; compressed_len(input.len())];
    let written = compress_into(input, &mut output, config)?;
    output.truncate(written);
    Ok(output)
}

/// Compress `input` as a zlib stream into `output`, returning the number of bytes written.
///
/// # Errors
///
/// If `output` is shorter than [`compressed_len`], [`ParseError::OutputOverflow`] is returned.
pub fn compress_into(input: &[u8], output: &mut [u8], config: Config) -> Result<usize, Error> {
    let needed = compressed_len(input.len());
    ensure_attach!(
        output.len() >= needed,
        ParseError::OutputOverflow,
        OutputFull { needed, available: output.len() },
    );

    let (mut header, body) = output.split_at_mut(ZlibHeader::ENCODED_LEN);
    ZlibHeader::new(config.level).put_buf(&mut header);
    let deflate_len = deflate::encode(input, body)?;
    let mut trailer = &mut body[deflate_len..];
    trailer.put_u32(adler32(input));

    log::debug!("compressed {} bytes into {needed} bytes, level {}", input.len(), config.level);
    Ok(needed)
}

/// Decompress the zlib stream `input` into a new buffer of at most `capacity` bytes.
///
/// # Errors
///
/// If the stream is malformed, fails its Adler-32 check, is followed by extra data, or decodes to more than
/// `capacity` bytes, an [`Error`] is returned and no partial output is produced.
pub fn decompress(input: &[u8], capacity: usize) -> Result<Vec<u8>, Error> {
    let mut output = vec![0; capacity];
    let written = decompress_into(input, &mut output)?;
    output.truncate(written);
    Ok(output)
}

/// Decompress the zlib stream `input` into `output`, returning the number of bytes written.
///
/// `output` is never grown; on error its contents are unspecified.
pub fn decompress_into(input: &[u8], output: &mut [u8]) -> Result<usize, Error> {
    let header = ZlibHeader::parse(input).while_parsing_type()?;
    log::debug!("zlib header: window {} bits, level {}", header.window_bits, header.level);

    let body = &input[ZlibHeader::ENCODED_LEN..];
    let deflate::Decoded { consumed, written } = deflate::decode(body, output)?;

    let trailer_end = consumed + TRAILER_LEN;
    let available = body.len() - consumed;
    ensure_matches_attach!(
        body.get(consumed..trailer_end),
        Some(mut trailer),
        ParseError::TruncatedInput,
        TruncatedAt { offset: ZlibHeader::ENCODED_LEN + consumed, needed: TRAILER_LEN, available },
    );
    let expected_checksum = trailer.get_u32();
    ensure_eq_attach!(adler32(&output[..written]), expected_checksum, ParseError::ChecksumMismatch);
    ensure_attach!(trailer_end == body.len(), ParseError::InvalidInput, ExtraUnparsedInput);

    Ok(written)
}

//
// private functions
//

fn adler32(data: &[u8]) -> u32 {
    let mut hasher = simd_adler32::Adler32::new();
    hasher.write(data);
    hasher.finish()
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
