use pngz_common::error::TruncatedAt;
use pngz_common::{ensure_attach, ensure_eq_attach, ensure_matches_attach, InputSpan, Result, ResultExt};

use crate::parse::error::{ExpectedChunk, WhileParsingChunk, WhileParsingChunkAt};
use crate::parse::{ChunkHeader, FourCC, ParseError, PngPrim, PngSignature};

/// A cursor over the chunks of an in-memory PNG file.
#[derive(Clone)]
pub struct ChunkReader<'a> {
    input: &'a [u8],
    offset: usize,
}

/// A chunk whose header, data and CRC are all present in the input.
#[derive(Clone, Copy, Debug)]
pub struct Chunk<'a> {
    pub name: FourCC,
    pub data: &'a [u8],
    pub crc: u32,
    /// The span of the whole chunk, from its length field to its CRC.
    pub span: InputSpan,
}

//
// ChunkReader impls
//

impl<'a> ChunkReader<'a> {
    /// Check the PNG signature of `input` and position the reader at the first chunk.
    pub fn new(input: &'a [u8]) -> Result<Self, ParseError> {
        PngSignature::parse(input).while_parsing_type()?;
        Ok(Self { input, offset: PngSignature::ENCODED_LEN as usize })
    }

    pub fn has_remaining(&self) -> bool {
        self.offset < self.input.len()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Read a chunk of a specific type.
    pub fn read_chunk(&mut self, name: FourCC) -> Result<Chunk<'a>, ParseError> {
        ensure_attach!(self.has_remaining(), ParseError::MissingRequiredChunk(name));
        let chunk = self.read_any_chunk()?;
        ensure_attach!(
            chunk.name == name,
            ParseError::InvalidChunkLayout,
            ExpectedChunk(name),
            WhileParsingChunk(chunk.name),
        );
        Ok(chunk)
    }

    /// Read the next chunk, without checking its CRC.
    pub fn read_any_chunk(&mut self) -> Result<Chunk<'a>, ParseError> {
        let offset = self.offset;
        let input = &self.input[offset..];
        let ChunkHeader { name, len } = ChunkHeader::parse(input).attach_printable(WhileParsingChunkAt(offset))?;

        let data_start = ChunkHeader::ENCODED_LEN as usize;
        let crc_start = data_start + len as usize;
        let chunk_len = crc_start + ChunkHeader::CRC_LEN as usize;
        let available = input.len() - data_start;
        ensure_matches_attach!(
            input.get(data_start..chunk_len),
            Some(data_and_crc),
            ParseError::TruncatedChunk,
            TruncatedAt { offset: offset + data_start, needed: chunk_len - data_start, available },
            WhileParsingChunk(name),
        );
        let (data, crc) = data_and_crc.split_at(len as usize);
        let crc = u32::from_be_bytes([crc[0], crc[1], crc[2], crc[3]]);

        self.offset += chunk_len;
        Ok(Chunk { name, data, crc, span: InputSpan::new(offset, chunk_len) })
    }
}

//
// Chunk impls
//

impl Chunk<'_> {
    pub fn verify_crc(&self) -> Result<(), ParseError> {
        ensure_eq_attach!(
            ChunkHeader::crc(self.name, self.data),
            self.crc,
            ParseError::ChecksumMismatch,
            WhileParsingChunk(self.name),
        );
        Ok(())
    }
}
