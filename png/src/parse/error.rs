//! Error types returned by the unstable parsing API.

use std::fmt::{Debug, Display};

use derive_more::Display;
use pngz_common::error::{DefaultStack, ReportableError};
use pngz_common::parse::FourCC;
use pngz_common::{ErrorClass, Result, ResultExt};

/// Error type returned by the PNG codec.
///
/// While the API of this error type is currently considered unstable, it is more stably guaranteed to implement
/// [`Display`] + [`Debug`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The input is invalid because its chunks are in an ordering or configuration disallowed by the PNG
    /// specification.
    #[error("Invalid chunk layout")]
    InvalidChunkLayout,

    /// The input is invalid.
    #[error("Invalid input")]
    InvalidInput,

    /// The input did not start with the PNG signature.
    #[error("Invalid PNG signature")]
    InvalidSignature,

    /// The image width or height was zero or larger than [`MAX_DIMENSION`](crate::MAX_DIMENSION).
    #[error("Invalid image dimensions")]
    InvalidDimensions,

    /// A scanline started with an unknown filter type.
    #[error("Invalid filter type `{0}`")]
    InvalidFilterType(u8),

    /// The compressed image data could not be decoded, or the image data could not be compressed.
    #[error("Invalid compressed image data: {0}")]
    Compression(pngz_zlib::ParseError),

    /// The input is invalid because it is missing a chunk required by the PNG specification.
    #[error("Missing required `{0}` chunk")]
    MissingRequiredChunk(FourCC),

    /// The input is invalid because the input ended before the end of a chunk.
    ///
    /// This can occur either when the entire input is truncated or when a chunk length is incorrect.
    #[error("Truncated chunk")]
    TruncatedChunk,

    /// A chunk's CRC-32 did not match its type and data.
    #[error("CRC-32 checksum mismatch")]
    ChecksumMismatch,

    /// The input is unsupported because its bit depth is not `8`.
    #[error("Unsupported bit depth `{0}`")]
    UnsupportedBitDepth(u8),

    /// The input is unsupported because it uses a palette or an unknown color type.
    #[error("Unsupported color type `{0}`")]
    UnsupportedColorType(u8),

    /// The input is unsupported because it is interlaced.
    #[error("Unsupported interlace method `{0}`")]
    UnsupportedInterlace(u8),

    /// The input is unsupported because it declares an unknown compression method.
    #[error("Unsupported compression method `{0}`")]
    UnsupportedCompressionMethod(u8),

    /// The input is unsupported because it declares an unknown filter method.
    #[error("Unsupported filter method `{0}`")]
    UnsupportedFilterMethod(u8),
}

pub(crate) trait ParseResultExt: ResultExt + Sized {
    fn while_parsing_chunk(self, chunk_type: FourCC) -> Self {
        self.attach_printable(WhileParsingChunk(chunk_type))
    }

    fn while_parsing_field<T>(self, chunk_type: FourCC, field_name: T) -> Self
    where
        T: Display + Debug + Send + Sync + 'static,
    {
        self.attach_printable(WhileParsingField(chunk_type, field_name))
    }
}

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "multiple `{}` chunks", _0)]
pub(crate) struct MultipleChunks(pub(crate) FourCC);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "expected `{}` chunk", _0)]
pub(crate) struct ExpectedChunk(pub(crate) FourCC);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "while parsing `{}` chunk", _0)]
pub(crate) struct WhileParsingChunk(pub(crate) FourCC);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "while parsing `{}` chunk field `{}`", _0, _1)]
pub(crate) struct WhileParsingField<T>(pub(crate) FourCC, pub(crate) T);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "while parsing chunk @ 0x{_0:08x}")]
pub(crate) struct WhileParsingChunkAt(pub(crate) usize);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "while decoding scanline `{_0}`")]
pub(crate) struct WhileDecodingScanline(pub(crate) u32);

//
// ParseError impls
//

impl ParseError {
    /// The broad class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidChunkLayout
            | Self::InvalidDimensions
            | Self::InvalidInput
            | Self::InvalidSignature
            | Self::InvalidFilterType(_)
            | Self::MissingRequiredChunk(_)
            | Self::UnsupportedBitDepth(_)
            | Self::UnsupportedColorType(_)
            | Self::UnsupportedInterlace(_)
            | Self::UnsupportedCompressionMethod(_)
            | Self::UnsupportedFilterMethod(_) => ErrorClass::Structural,
            Self::TruncatedChunk => ErrorClass::Bounds,
            Self::ChecksumMismatch => ErrorClass::Integrity,
            Self::Compression(err) => err.class(),
        }
    }
}

impl ReportableError for ParseError {
    type Stack = DefaultStack;
}

impl<T> ParseResultExt for Result<T, ParseError> {}
