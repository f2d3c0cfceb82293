//! Error types returned by the zlib and DEFLATE codecs.

use derive_more::Display;
use pngz_common::error::{DefaultStack, ReportableError};
use pngz_common::ErrorClass;

use crate::deflate::BlockType;

/// Error type returned by the zlib and DEFLATE codecs.
///
/// While the API of this error type is currently considered unstable, it is more stably guaranteed to implement
/// [`Display`](std::fmt::Display) + [`Debug`](std::fmt::Debug).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The zlib header was malformed or requested an unsupported feature such as a preset dictionary.
    #[error("Invalid zlib header")]
    InvalidHeader,

    /// A DEFLATE block header carried the reserved block type `3`.
    #[error("Invalid block type")]
    InvalidBlockType,

    /// A stored block's length did not match the one's complement of its check field.
    #[error("Invalid stored block length")]
    InvalidStoredLength,

    /// A Huffman code was over-subscribed, incomplete, or decoded a symbol which is not valid in its position.
    #[error("Invalid prefix code")]
    InvalidPrefixCode,

    /// A back-reference pointed before the start of the output.
    #[error("Invalid back-reference")]
    InvalidBackReference,

    /// The decoded or encoded data did not fit in the output buffer.
    #[error("Output buffer overflow")]
    OutputOverflow,

    /// The input ended before the end of the stream.
    #[error("Truncated input")]
    TruncatedInput,

    /// The Adler-32 checksum in the zlib trailer did not match the decoded data.
    #[error("Adler-32 checksum mismatch")]
    ChecksumMismatch,

    /// The input is invalid, e.g. because of trailing data after the zlib trailer.
    #[error("Invalid input")]
    InvalidInput,
}

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "while decoding {_1} block {_0}")]
pub(crate) struct WhileDecodingBlock(pub(crate) u32, pub(crate) BlockType);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "while building {_0} code")]
pub(crate) struct WhileBuildingCode(pub(crate) &'static str);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "invalid back-reference distance `{_0}` with `{_1}` bytes written")]
pub(crate) struct InvalidBackRefDistance(pub(crate) usize, pub(crate) usize);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "invalid code length repetition `{_0}` at `{_1}` with `{_2}` code lengths")]
pub(crate) struct InvalidCodeLengthRepetition(pub(crate) u32, pub(crate) usize, pub(crate) usize);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "invalid symbol count `{_0}` > `{_1}`")]
pub(crate) struct InvalidSymbolCount(pub(crate) usize, pub(crate) usize);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "code length `{len}` of symbol `{symbol}` exceeds `{max_len}`")]
pub(crate) struct InvalidCodeLength {
    pub(crate) symbol: usize,
    pub(crate) len: u8,
    pub(crate) max_len: u32,
}

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "codespace `{_0}` exceeds `{_1}`")]
pub(crate) struct OverflowingCode(pub(crate) u32, pub(crate) u32);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "codespace `{_0}` is less than `{_1}`")]
pub(crate) struct IncompleteCode(pub(crate) u32, pub(crate) u32);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "output buffer of `{available}` bytes cannot hold `{needed}` bytes")]
pub(crate) struct OutputFull {
    pub(crate) needed: usize,
    pub(crate) available: usize,
}

//
// ParseError impls
//

impl ParseError {
    /// The broad class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidHeader | Self::InvalidStoredLength | Self::InvalidInput => ErrorClass::Structural,
            Self::InvalidBlockType | Self::InvalidPrefixCode => ErrorClass::Code,
            Self::InvalidBackReference | Self::OutputOverflow | Self::TruncatedInput => ErrorClass::Bounds,
            Self::ChecksumMismatch => ErrorClass::Integrity,
        }
    }
}

impl ReportableError for ParseError {
    type Stack = DefaultStack;
}
