//! Raw DEFLATE streams, as described by RFC 1951.
//!
//! Decoding supports all three block types. Encoding only ever emits stored blocks.

mod bitstream;
mod huffman;
mod inflate;
mod stored;

use derive_more::Display;
use pngz_common::{bail_attach, Result};

use crate::ParseError;

//
// public types
//

pub use bitstream::{BitReader, MAX_NEED_BITS};
pub use huffman::{
    CodeParams, DecodeEntry, HuffmanTable, LITLEN, MAX_CODEWORD_LEN, NUM_LITLEN_SYMBOLS, NUM_OFFSET_SYMBOLS,
    NUM_PRECODE_SYMBOLS, OFFSET, PRECODE,
};
pub use inflate::{decode, Decoded};
pub use stored::{compressed_len, encode, MAX_STORED_BLOCK_LEN};

/// The type of a DEFLATE block, from the two bits following the final-block flag.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum BlockType {
    #[display(fmt = "stored")]
    /// Uncompressed data prefixed with its length.
    Stored = 0,

    #[display(fmt = "fixed Huffman")]
    /// Data compressed with the predefined Huffman codes.
    FixedHuffman = 1,

    #[display(fmt = "dynamic Huffman")]
    /// Data compressed with Huffman codes described at the start of the block.
    DynamicHuffman = 2,
}

//
// BlockType impls
//

impl BlockType {
    /// Parse a block type from the two block type bits.
    pub fn from_bits(bits: u32) -> Result<Self, ParseError> {
        match bits {
            0 => Ok(Self::Stored),
            1 => Ok(Self::FixedHuffman),
            2 => Ok(Self::DynamicHuffman),
            _ => bail_attach!(ParseError::InvalidBlockType, format!("reserved block type `{bits}`")),
        }
    }
}
