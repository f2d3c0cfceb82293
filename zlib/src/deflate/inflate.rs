use std::sync::OnceLock;

use bytes::Buf;
use pngz_common::error::TruncatedAt;
use pngz_common::{bail_attach, ensure_attach, ensure_eq_attach, ensure_matches_attach, Result, ResultExt};

use super::bitstream::BitReader;
use super::huffman::{
    HuffmanTable, LITLEN, MAX_CODEWORD_LEN, NUM_LITLEN_SYMBOLS, NUM_OFFSET_SYMBOLS, NUM_PRECODE_SYMBOLS, OFFSET,
    PRECODE,
};
use super::BlockType;
use crate::error::{
    InvalidBackRefDistance, InvalidCodeLengthRepetition, InvalidSymbolCount, OutputFull, WhileDecodingBlock,
};
use crate::ParseError;

/// The result of successfully decoding a raw DEFLATE stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoded {
    /// The number of input bytes making up the stream, up to and including the final block's last byte.
    pub consumed: usize,

    /// The number of bytes written to the output buffer.
    pub written: usize,
}

/// Order in which the code length code's lengths are transmitted.
const PRECODE_ORDER: [u8; NUM_PRECODE_SYMBOLS] = [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

const END_OF_BLOCK: usize = 256;

/// Literal/length symbols past this count are reserved.
const MAX_LITLEN_COUNT: usize = 286;

/// Offset symbols past this count are reserved.
const MAX_OFFSET_COUNT: usize = 30;

const MAX_LENGTH_EXTRA_BITS: u32 = 5;
const MAX_OFFSET_EXTRA_BITS: u32 = 13;
const MAX_PRECODE_EXTRA_BITS: u32 = 7;

static FIXED_TABLES: OnceLock<FixedTables> = OnceLock::new();

struct FixedTables {
    litlen: HuffmanTable,
    offset: HuffmanTable,
}

#[derive(Default)]
struct DynamicTables {
    precode: HuffmanTable,
    litlen: HuffmanTable,
    offset: HuffmanTable,
    lengths: Vec<u8>,
}

struct OutputWindow<'o> {
    buf: &'o mut [u8],
    len: usize,
}

/// Decode a raw DEFLATE stream from `input` into `output`.
///
/// `output` is never grown: a stream which decodes to more than `output.len()` bytes is rejected. Bytes in `input`
/// after the final block are not examined; the returned [`Decoded::consumed`] tells where the stream ended.
pub fn decode(input: &[u8], output: &mut [u8]) -> Result<Decoded, ParseError> {
    let mut reader = BitReader::new(input);
    let mut output = OutputWindow { buf: output, len: 0 };
    let mut dynamic_tables = DynamicTables::default();

    let mut block_idx = 0;
    loop {
        reader.need(3);
        let is_final = reader.take_bit();
        let block_type = BlockType::from_bits(reader.take(2))?;

        let written_before = output.len;
        let block_result = match block_type {
            BlockType::Stored => read_stored_block(&mut reader, &mut output),
            BlockType::FixedHuffman => {
                let FixedTables { litlen, offset } = fixed_tables();
                read_huffman_block(&mut reader, &mut output, litlen, offset)
            }
            BlockType::DynamicHuffman => dynamic_tables.read(&mut reader).and_then(|()| {
                let DynamicTables { litlen, offset, .. } = &dynamic_tables;
                read_huffman_block(&mut reader, &mut output, litlen, offset)
            }),
        };
        block_result.attach_printable(WhileDecodingBlock(block_idx, block_type))?;

        ensure_attach!(
            !reader.is_exhausted(),
            ParseError::TruncatedInput,
            WhileDecodingBlock(block_idx, block_type),
        );
        log::debug!(
            "{block_type} block {block_idx}: {} bytes{}",
            output.len - written_before,
            if is_final { ", final" } else { "" },
        );

        if is_final {
            break;
        }
        block_idx += 1;
    }

    reader.align_to_byte();
    ensure_attach!(!reader.is_exhausted(), ParseError::TruncatedInput);
    Ok(Decoded { consumed: reader.consumed_bytes(), written: output.len })
}

fn fixed_tables() -> &'static FixedTables {
    FIXED_TABLES.get_or_init(|| FixedTables::new().unwrap_or_else(|_| unreachable!()))
}

fn read_stored_block(reader: &mut BitReader<'_>, output: &mut OutputWindow<'_>) -> Result<(), ParseError> {
    reader.align_to_byte();

    let offset = reader.consumed_bytes();
    ensure_matches_attach!(
        reader.read_aligned(4),
        Some(mut header),
        ParseError::TruncatedInput,
        TruncatedAt { offset, needed: 4, available: reader.remaining_bytes() },
    );
    let len = header.get_u16_le();
    let nlen = header.get_u16_le();
    ensure_eq_attach!(len, !nlen, ParseError::InvalidStoredLength);

    let offset = reader.consumed_bytes();
    ensure_matches_attach!(
        reader.read_aligned(len.into()),
        Some(data),
        ParseError::TruncatedInput,
        TruncatedAt { offset, needed: len.into(), available: reader.remaining_bytes() },
    );
    output.extend(data)
}

fn read_huffman_block(
    reader: &mut BitReader<'_>,
    output: &mut OutputWindow<'_>,
    litlen: &HuffmanTable,
    offset: &HuffmanTable,
) -> Result<(), ParseError> {
    loop {
        reader.need(MAX_CODEWORD_LEN);
        let entry = litlen.decode(reader);
        if entry.is_literal() {
            output.push(entry.payload() as u8)?;
            continue;
        }
        if entry.is_end_of_block() {
            return Ok(());
        }
        ensure_attach!(!entry.is_invalid(), ParseError::InvalidPrefixCode, "invalid literal/length symbol");

        reader.need(MAX_LENGTH_EXTRA_BITS + MAX_CODEWORD_LEN + MAX_OFFSET_EXTRA_BITS);
        let length = entry.base() + reader.take(entry.extra_bits());
        let offset_entry = offset.decode(reader);
        ensure_attach!(!offset_entry.is_invalid(), ParseError::InvalidPrefixCode, "invalid offset symbol");
        let distance = offset_entry.base() + reader.take(offset_entry.extra_bits());

        output.copy_match(distance as usize, length as usize)?;
    }
}

//
// FixedTables impls
//

impl FixedTables {
    fn new() -> Result<Self, ParseError> {
        let mut litlen_lengths = [0; NUM_LITLEN_SYMBOLS];
        litlen_lengths[..144].fill(8);
        litlen_lengths[144..256].fill(9);
        litlen_lengths[256..280].fill(7);
        litlen_lengths[280..].fill(8);
        let offset_lengths = [5; NUM_OFFSET_SYMBOLS];

        log::debug!("building fixed Huffman tables");
        let litlen = HuffmanTable::build(&litlen_lengths, &LITLEN)?;
        let offset = HuffmanTable::build(&offset_lengths, &OFFSET)?;
        Ok(Self { litlen, offset })
    }
}

//
// DynamicTables impls
//

impl DynamicTables {
    fn read(&mut self, reader: &mut BitReader<'_>) -> Result<(), ParseError> {
        reader.need(5 + 5 + 4);
        let litlen_count = 257 + reader.take(5) as usize;
        let offset_count = 1 + reader.take(5) as usize;
        let precode_count = 4 + reader.take(4) as usize;
        log::debug!("dynamic code counts: {litlen_count} litlen, {offset_count} offset, {precode_count} precode");

        ensure_attach!(
            litlen_count <= MAX_LITLEN_COUNT,
            ParseError::InvalidPrefixCode,
            InvalidSymbolCount(litlen_count, MAX_LITLEN_COUNT),
        );
        ensure_attach!(
            offset_count <= MAX_OFFSET_COUNT,
            ParseError::InvalidPrefixCode,
            InvalidSymbolCount(offset_count, MAX_OFFSET_COUNT),
        );

        let mut precode_lengths = [0; NUM_PRECODE_SYMBOLS];
        for &symbol in &PRECODE_ORDER[..precode_count] {
            reader.need(3);
            precode_lengths[usize::from(symbol)] = reader.take(3) as u8;
        }
        self.precode.rebuild(&precode_lengths, &PRECODE)?;

        let total_count = litlen_count + offset_count;
        self.lengths.clear();
        while self.lengths.len() < total_count {
            reader.need(PRECODE.max_len + MAX_PRECODE_EXTRA_BITS);
            let entry = self.precode.decode(reader);
            ensure_attach!(!entry.is_invalid(), ParseError::InvalidPrefixCode, "invalid code length symbol");
            let (len, repeat) = match entry.payload() {
                len @ 0..=15 => (len as u8, 1),
                16 => {
                    ensure_matches_attach!(
                        self.lengths.last(),
                        Some(&previous_len),
                        ParseError::InvalidPrefixCode,
                        "code length repetition without a previous code length",
                    );
                    (previous_len, 3 + reader.take(2))
                }
                17 => (0, 3 + reader.take(3)),
                18 => (0, 11 + reader.take(7)),
                symbol => bail_attach!(ParseError::InvalidPrefixCode, format!("invalid code length symbol `{symbol}`")),
            };

            let new_len = self.lengths.len() + repeat as usize;
            ensure_attach!(
                new_len <= total_count,
                ParseError::InvalidPrefixCode,
                InvalidCodeLengthRepetition(repeat, self.lengths.len(), total_count),
            );
            self.lengths.resize(new_len, len);
        }

        let (litlen_lengths, offset_lengths) = self.lengths.split_at(litlen_count);
        ensure_attach!(
            litlen_lengths[END_OF_BLOCK] != 0,
            ParseError::InvalidPrefixCode,
            "missing end-of-block code",
        );
        self.litlen.rebuild(litlen_lengths, &LITLEN)?;
        self.offset.rebuild(offset_lengths, &OFFSET)?;
        Ok(())
    }
}

//
// OutputWindow impls
//

impl OutputWindow<'_> {
    fn push(&mut self, byte: u8) -> Result<(), ParseError> {
        let available = self.buf.len();
        ensure_matches_attach!(
            self.buf.get_mut(self.len),
            Some(slot),
            ParseError::OutputOverflow,
            OutputFull { needed: self.len + 1, available },
        );
        *slot = byte;
        self.len += 1;
        Ok(())
    }

    fn extend(&mut self, data: &[u8]) -> Result<(), ParseError> {
        let end = self.len + data.len();
        let available = self.buf.len();
        ensure_matches_attach!(
            self.buf.get_mut(self.len..end),
            Some(dst),
            ParseError::OutputOverflow,
            OutputFull { needed: end, available },
        );
        dst.copy_from_slice(data);
        self.len = end;
        Ok(())
    }

    /// Copy `length` bytes starting `distance` bytes back. The source may overlap the bytes being written, in which
    /// case the overlapping pattern repeats.
    fn copy_match(&mut self, distance: usize, length: usize) -> Result<(), ParseError> {
        ensure_attach!(
            distance <= self.len,
            ParseError::InvalidBackReference,
            InvalidBackRefDistance(distance, self.len),
        );
        let end = self.len + length;
        ensure_attach!(
            end <= self.buf.len(),
            ParseError::OutputOverflow,
            OutputFull { needed: end, available: self.buf.len() },
        );

        let start = self.len - distance;
        if distance >= length {
            self.buf.copy_within(start..start + length, self.len);
        } else {
            for idx in self.len..end {
                self.buf[idx] = self.buf[idx - distance];
            }
        }
        self.len = end;
        Ok(())
    }
}
