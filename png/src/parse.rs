//! Unstable API for parsing PNG files.

pub mod error;
mod filter;
mod header;
mod ihdr;

use bytes::{Buf, BufMut};
use pngz_common::Result;

#[allow(missing_docs)]
pub trait PngPrim: Sized {
    const ENCODED_LEN: u32;
    fn parse<B: Buf>(buf: B) -> Result<Self, ParseError>;
    fn put_buf<B: BufMut>(&self, buf: B);
}

#[allow(missing_docs)]
pub trait ParseChunk: Sized {
    const NAME: FourCC;

    const ENCODED_LEN: u32;

    fn parse(buf: &[u8]) -> Result<Self, ParseError>;
}

#[allow(missing_docs)]
pub trait ParsedChunk {
    fn put_buf(&self, buf: &mut dyn BufMut);
}

pub use error::ParseError;
pub use filter::{decode_scanlines, encode_scanlines, paeth_predictor, FilterType};
pub use header::{chunk_type, ChunkHeader, PngSignature};
pub use ihdr::{ColorType, IhdrChunk, MAX_DIMENSION};

pub use pngz_common::parse::FourCC;
