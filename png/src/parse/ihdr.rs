#![allow(missing_docs)]

use bytes::{Buf, BufMut};
use derive_more::Display;
use pngz_common::parse::FourCC;
use pngz_common::{bail_attach, ensure_attach, ensure_eq_attach, Result};

use super::chunk_type::IHDR;
use super::error::ParseResultExt;
use super::{ParseChunk, ParseError, ParsedChunk};

/// The largest width or height of a decodable or encodable image.
pub const MAX_DIMENSION: u32 = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IhdrChunk {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: u8,
}

/// The pixel layouts supported by the codec, all with 8 bits per sample.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColorType {
    #[display(fmt = "grayscale")]
    Grayscale = 0,
    #[display(fmt = "RGB")]
    Rgb = 2,
    #[display(fmt = "grayscale+alpha")]
    GrayscaleAlpha = 4,
    #[display(fmt = "RGBA")]
    Rgba = 6,
}

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "dimensions `{_0}`x`{_1}` outside of `1`..=`{MAX_DIMENSION}`")]
pub(crate) struct DimensionsOutOfRange(pub(crate) u32, pub(crate) u32);

//
// IhdrChunk impls
//

impl IhdrChunk {
    pub const BIT_DEPTH: u8 = 8;

    /// The header of an 8-bit, non-interlaced image, as written by the encoder.
    pub fn new(width: u32, height: u32, color_type: ColorType) -> Result<Self, ParseError> {
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            bit_depth: Self::BIT_DEPTH,
            color_type,
            compression_method: 0,
            filter_method: 0,
            interlace_method: 0,
        })
    }

    /// The length of one filtered scanline, including its leading filter type byte.
    pub fn scanline_len(&self) -> usize {
        1 + self.width as usize * self.color_type.bytes_per_pixel()
    }

    /// The length of the whole decompressed, filtered image data.
    pub fn filtered_len(&self) -> usize {
        self.height as usize * self.scanline_len()
    }
}

impl ParseChunk for IhdrChunk {
    const NAME: FourCC = IHDR;

    const ENCODED_LEN: u32 = 13;

    fn parse(mut buf: &[u8]) -> Result<Self, ParseError> {
        ensure_eq_attach!(buf.len(), Self::ENCODED_LEN as usize, ParseError::InvalidInput, "invalid IHDR length");

        let width = buf.get_u32();
        let height = buf.get_u32();
        check_dimensions(width, height).while_parsing_chunk(Self::NAME)?;

        let bit_depth = buf.get_u8();
        ensure_attach!(bit_depth == Self::BIT_DEPTH, ParseError::UnsupportedBitDepth(bit_depth));

        let color_type = ColorType::from_u8(buf.get_u8()).while_parsing_field(Self::NAME, "color_type")?;

        let compression_method = buf.get_u8();
        ensure_attach!(compression_method == 0, ParseError::UnsupportedCompressionMethod(compression_method));

        let filter_method = buf.get_u8();
        ensure_attach!(filter_method == 0, ParseError::UnsupportedFilterMethod(filter_method));

        let interlace_method = buf.get_u8();
        ensure_attach!(interlace_method == 0, ParseError::UnsupportedInterlace(interlace_method));

        Ok(Self { width, height, bit_depth, color_type, compression_method, filter_method, interlace_method })
    }
}

impl ParsedChunk for IhdrChunk {
    fn put_buf(&self, buf: &mut dyn BufMut) {
        let Self { width, height, bit_depth, color_type, compression_method, filter_method, interlace_method } = *self;
        buf.put_u32(width);
        buf.put_u32(height);
        buf.put_u8(bit_depth);
        buf.put_u8(color_type as u8);
        buf.put_u8(compression_method);
        buf.put_u8(filter_method);
        buf.put_u8(interlace_method);
    }
}

//
// ColorType impls
//

impl ColorType {
    pub fn from_u8(value: u8) -> Result<Self, ParseError> {
        match value {
            0 => Ok(Self::Grayscale),
            2 => Ok(Self::Rgb),
            4 => Ok(Self::GrayscaleAlpha),
            6 => Ok(Self::Rgba),
            _ => bail_attach!(ParseError::UnsupportedColorType(value)),
        }
    }

    /// The number of bytes of one pixel, which is also the filter stride.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Grayscale => 1,
            Self::GrayscaleAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::GrayscaleAlpha | Self::Rgba)
    }
}

//
// private functions
//

fn check_dimensions(width: u32, height: u32) -> Result<(), ParseError> {
    let valid = |dimension: u32| (1..=MAX_DIMENSION).contains(&dimension);
    ensure_attach!(
        valid(width) && valid(height),
        ParseError::InvalidDimensions,
        DimensionsOutOfRange(width, height),
    );
    Ok(())
}
