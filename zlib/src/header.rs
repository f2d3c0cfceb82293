use bytes::{Buf, BufMut};
use derive_more::Display;
use pngz_common::error::WhileParsingType;
use pngz_common::{ensure_attach, Result};

use crate::ParseError;

/// The compression level hint carried in the `FLEVEL` field of a zlib header.
///
/// The hint has no effect on decoding. The encoder only emits stored blocks, so it also has no effect on the size of
/// the compressed data.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum CompressionLevel {
    /// The fastest algorithm was used.
    #[default]
    #[display(fmt = "fastest")]
    Fastest = 0,

    /// A fast algorithm was used.
    #[display(fmt = "fast")]
    Fast = 1,

    /// The default algorithm was used.
    #[display(fmt = "default")]
    Default = 2,

    /// The maximum compression, slowest algorithm was used.
    #[display(fmt = "maximum")]
    Maximum = 3,
}

/// A parsed zlib stream header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZlibHeader {
    /// The base-2 logarithm of the LZ77 window size, between 8 and 15.
    pub window_bits: u8,

    /// The compression level hint.
    pub level: CompressionLevel,
}

const CM_DEFLATE: u16 = 8;
const MAX_CINFO: u16 = 7;
const FDICT: u16 = 1 << 5;

//
// CompressionLevel impls
//

impl CompressionLevel {
    fn from_bits(bits: u16) -> Self {
        match bits & 0b11 {
            0 => Self::Fastest,
            1 => Self::Fast,
            2 => Self::Default,
            _ => Self::Maximum,
        }
    }
}

//
// ZlibHeader impls
//

impl ZlibHeader {
    /// The encoded length of a [`ZlibHeader`], in bytes.
    pub const ENCODED_LEN: usize = 2;

    /// A header for a stream using the largest window size, with the given compression level hint.
    pub const fn new(level: CompressionLevel) -> Self {
        Self { window_bits: 8 + MAX_CINFO as u8, level }
    }

    /// Parse a [`ZlibHeader`] from a [`Buf`].
    pub fn parse<B: Buf>(mut buf: B) -> Result<Self, ParseError> {
        ensure_attach!(
            buf.remaining() >= Self::ENCODED_LEN,
            ParseError::TruncatedInput,
            WhileParsingType::new::<Self>(),
        );
        let header = buf.get_u16();
        let cmf = header >> 8;

        ensure_attach!(header % 31 == 0, ParseError::InvalidHeader, format!("header check failed for `{header:04x}`"));
        ensure_attach!(cmf & 0xf == CM_DEFLATE, ParseError::InvalidHeader, "unsupported compression method");
        ensure_attach!(cmf >> 4 <= MAX_CINFO, ParseError::InvalidHeader, "window size too large");
        ensure_attach!(header & FDICT == 0, ParseError::InvalidHeader, "preset dictionaries are not supported");

        Ok(Self { window_bits: 8 + (cmf >> 4) as u8, level: CompressionLevel::from_bits(header >> 6) })
    }

    /// Writes `self` to the [`BufMut`] `out`.
    pub fn put_buf<B: BufMut>(&self, mut out: B) {
        let cinfo = u16::from(self.window_bits.saturating_sub(8)).min(MAX_CINFO);
        let mut header = (cinfo << 4 | CM_DEFLATE) << 8 | (self.level as u16) << 6;
        header |= (31 - header % 31) % 31;
        out.put_u16(header);
    }
}
