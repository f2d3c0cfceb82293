#![warn(missing_docs)]

//! `pngz-common` is a common library shared by the `pngz` zlib and PNG codecs.

#[macro_use]
pub mod macros;

pub mod error;
pub mod parse;

use derive_more::Display;

//
// public types
//

pub use error::{Error, Report, Result, ResultExt};

/// A pointer to a span in the given input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct InputSpan {
    /// The offset from the beginning of the input where the span begins.
    pub offset: u64,

    /// The length of the span.
    pub len: u64,
}

/// The broad class of a codec error.
///
/// Every error produced by the codecs is terminal; the class only describes which kind of check rejected the input.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The framing of the input was malformed: bad headers, signatures, chunk layout or image dimensions.
    #[display(fmt = "structural")]
    Structural,

    /// A block type, a Huffman code or the symbols decoded with it were invalid.
    #[display(fmt = "code")]
    Code,

    /// A length or distance fell outside the bounds of the input or the output, or the input ended early.
    #[display(fmt = "bounds")]
    Bounds,

    /// A checksum did not match the data it covers.
    #[display(fmt = "integrity")]
    Integrity,
}

//
// InputSpan impls
//

impl InputSpan {
    /// Construct an [`InputSpan`] from a `usize` offset and length within an in-memory input.
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset: offset as u64, len: len as u64 }
    }

    /// The offset one past the last byte of the span.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.len)
    }
}
