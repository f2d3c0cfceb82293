//! Flat lookup-table decoders for canonical Huffman codes.

use pngz_common::{ensure_attach, ensure_matches_attach, Result, ResultExt};

use super::bitstream::BitReader;
use crate::error::{IncompleteCode, InvalidCodeLength, InvalidSymbolCount, OverflowingCode, WhileBuildingCode};
use crate::ParseError;

/// The longest codeword allowed in any DEFLATE Huffman code.
pub const MAX_CODEWORD_LEN: u32 = 15;

/// The number of symbols in the literal/length alphabet, including the two reserved symbols.
pub const NUM_LITLEN_SYMBOLS: usize = 288;

/// The number of symbols in the offset alphabet, including the two reserved symbols.
pub const NUM_OFFSET_SYMBOLS: usize = 32;

/// The number of symbols in the code length alphabet.
pub const NUM_PRECODE_SYMBOLS: usize = 19;

/// A single decoded table entry.
///
/// The low byte holds the number of bits the entry's codeword occupies (for a sub-table pointer, the index width of
/// the sub-table). The bits above it hold the decoded payload, or the sub-table's offset when
/// [`is_subtable`](Self::is_subtable) is set. The top four bits are flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeEntry(u32);

/// The shape of one of the three DEFLATE Huffman codes.
#[derive(Clone, Copy, Debug)]
pub struct CodeParams {
    /// A name for the code, used in error reports.
    pub name: &'static str,

    /// The payload decoded for each symbol.
    pub results: &'static [DecodeEntry],

    /// The longest allowed codeword.
    pub max_len: u32,

    /// The index width of the primary table. Longer codewords are resolved through sub-tables.
    pub table_bits: u32,

    /// The largest table size any valid code can require.
    pub enough: usize,

    /// Whether a code with no codewords at all is valid.
    pub allow_empty: bool,
}

/// A flat decode table built from a set of canonical Huffman code lengths.
///
/// Any symbol is resolved with at most two table reads: one in the primary table indexed by the next
/// [`CodeParams::table_bits`] input bits, and at most one in a sub-table for longer codewords.
#[derive(Clone, Debug, Default)]
pub struct HuffmanTable {
    entries: Vec<DecodeEntry>,
    table_bits: u32,
}

/// The code length code.
pub const PRECODE: CodeParams = CodeParams {
    name: "code length",
    results: &PRECODE_RESULTS,
    max_len: 7,
    table_bits: 7,
    enough: 128,
    allow_empty: false,
};

/// The literal/length code.
pub const LITLEN: CodeParams = CodeParams {
    name: "literal/length",
    results: &LITLEN_RESULTS,
    max_len: MAX_CODEWORD_LEN,
    table_bits: 10,
    enough: 1334,
    allow_empty: false,
};

/// The offset code.
///
/// A stream made only of literals may describe an offset code without any codewords.
pub const OFFSET: CodeParams = CodeParams {
    name: "offset",
    results: &OFFSET_RESULTS,
    max_len: MAX_CODEWORD_LEN,
    table_bits: 8,
    enough: 402,
    allow_empty: true,
};

const PRECODE_RESULTS: [DecodeEntry; NUM_PRECODE_SYMBOLS] = precode_results();
const LITLEN_RESULTS: [DecodeEntry; NUM_LITLEN_SYMBOLS] = litlen_results();
const OFFSET_RESULTS: [DecodeEntry; NUM_OFFSET_SYMBOLS] = offset_results();

const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131, 163, 195, 227, 258,
];
const LENGTH_EXTRA_BITS: [u8; 29] =
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0];

const OFFSET_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537, 2049, 3073, 4097, 6145,
    8193, 12289, 16385, 24577,
];
const OFFSET_EXTRA_BITS: [u8; 30] =
    [0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13];

const fn precode_results() -> [DecodeEntry; NUM_PRECODE_SYMBOLS] {
    let mut results = [DecodeEntry::invalid(); NUM_PRECODE_SYMBOLS];
    let mut symbol = 0;
    while symbol < NUM_PRECODE_SYMBOLS {
        results[symbol] = DecodeEntry::symbol(symbol as u16);
        symbol += 1;
    }
    results
}

const fn litlen_results() -> [DecodeEntry; NUM_LITLEN_SYMBOLS] {
    let mut results = [DecodeEntry::invalid(); NUM_LITLEN_SYMBOLS];
    let mut symbol = 0;
    while symbol < 256 {
        results[symbol] = DecodeEntry::literal(symbol as u8);
        symbol += 1;
    }
    results[256] = DecodeEntry::end_of_block();
    let mut idx = 0;
    while idx < LENGTH_BASE.len() {
        results[257 + idx] = DecodeEntry::base_extra(LENGTH_BASE[idx], LENGTH_EXTRA_BITS[idx]);
        idx += 1;
    }
    results
}

const fn offset_results() -> [DecodeEntry; NUM_OFFSET_SYMBOLS] {
    let mut results = [DecodeEntry::invalid(); NUM_OFFSET_SYMBOLS];
    let mut idx = 0;
    while idx < OFFSET_BASE.len() {
        results[idx] = DecodeEntry::base_extra(OFFSET_BASE[idx], OFFSET_EXTRA_BITS[idx]);
        idx += 1;
    }
    results
}

//
// DecodeEntry impls
//

impl DecodeEntry {
    const CODE_LEN_MASK: u32 = 0xff;
    const PAYLOAD_SHIFT: u32 = 8;
    const PAYLOAD_MASK: u32 = 0x000f_ffff;
    const EXTRA_BITS_MASK: u32 = 0xf;

    const INVALID: u32 = 1 << 28;
    const END_OF_BLOCK: u32 = 1 << 29;
    const LITERAL: u32 = 1 << 30;
    const SUBTABLE: u32 = 1 << 31;

    const fn new(flags: u32, payload: u32) -> Self {
        Self(flags | (payload & Self::PAYLOAD_MASK) << Self::PAYLOAD_SHIFT)
    }

    /// An entry for a symbol which is reserved or otherwise not allowed to appear in a stream.
    pub const fn invalid() -> Self {
        Self::new(Self::INVALID, 0)
    }

    pub const fn end_of_block() -> Self {
        Self::new(Self::END_OF_BLOCK, 0)
    }

    pub const fn literal(byte: u8) -> Self {
        Self::new(Self::LITERAL, byte as u32)
    }

    pub const fn symbol(symbol: u16) -> Self {
        Self::new(0, symbol as u32)
    }

    /// A length or offset entry: `base` plus the value of the following `extra_bits` input bits.
    pub const fn base_extra(base: u16, extra_bits: u8) -> Self {
        Self::new(0, (base as u32) << 4 | extra_bits as u32)
    }

    const fn subtable(start: usize, subtable_bits: u32) -> Self {
        Self(Self::SUBTABLE | (start as u32) << Self::PAYLOAD_SHIFT | subtable_bits)
    }

    const fn with_code_len(self, code_len: u32) -> Self {
        Self(self.0 & !Self::CODE_LEN_MASK | code_len)
    }

    pub fn code_len(self) -> u32 {
        self.0 & Self::CODE_LEN_MASK
    }

    pub fn payload(self) -> u32 {
        (self.0 >> Self::PAYLOAD_SHIFT) & Self::PAYLOAD_MASK
    }

    pub fn base(self) -> u32 {
        self.payload() >> 4
    }

    pub fn extra_bits(self) -> u32 {
        self.payload() & Self::EXTRA_BITS_MASK
    }

    pub fn is_invalid(self) -> bool {
        self.0 & Self::INVALID != 0
    }

    pub fn is_end_of_block(self) -> bool {
        self.0 & Self::END_OF_BLOCK != 0
    }

    pub fn is_literal(self) -> bool {
        self.0 & Self::LITERAL != 0
    }

    fn is_subtable(self) -> bool {
        self.0 & Self::SUBTABLE != 0
    }

    fn subtable_start(self) -> usize {
        ((self.0 & !Self::SUBTABLE) >> Self::PAYLOAD_SHIFT) as usize
    }
}

//
// HuffmanTable impls
//

impl HuffmanTable {
    /// Build a decode table for the code described by the per-symbol code `lengths`.
    pub fn build(lengths: &[u8], params: &CodeParams) -> Result<Self, ParseError> {
        let mut table = Self::default();
        table.rebuild(lengths, params)?;
        Ok(table)
    }

    /// Rebuild this table in place for a new code, reusing its allocation.
    pub fn rebuild(&mut self, lengths: &[u8], params: &CodeParams) -> Result<(), ParseError> {
        self.fill(lengths, params).attach_printable(WhileBuildingCode(params.name))?;
        log::debug!("built {} code: {} symbols, {} table entries", params.name, lengths.len(), self.entries.len());
        Ok(())
    }

    /// Decode one symbol. At least [`MAX_CODEWORD_LEN`] bits must be buffered in `reader`.
    #[inline]
    pub fn decode(&self, reader: &mut BitReader<'_>) -> DecodeEntry {
        let mut entry = self.entry(reader.peek(self.table_bits) as usize);
        if entry.is_subtable() {
            reader.consume(self.table_bits);
            entry = self.entry(entry.subtable_start() + reader.peek(entry.code_len()) as usize);
        }
        reader.consume(entry.code_len());
        entry
    }

    pub fn entries(&self) -> &[DecodeEntry] {
        &self.entries
    }

    fn entry(&self, idx: usize) -> DecodeEntry {
        self.entries.get(idx).copied().unwrap_or_else(DecodeEntry::invalid)
    }

    fn fill(&mut self, lengths: &[u8], params: &CodeParams) -> Result<(), ParseError> {
        let &CodeParams { results, max_len, table_bits, enough, allow_empty, .. } = params;

        ensure_attach!(
            lengths.len() <= results.len(),
            ParseError::InvalidPrefixCode,
            InvalidSymbolCount(lengths.len(), results.len()),
        );

        let mut len_counts = [0u16; MAX_CODEWORD_LEN as usize + 1];
        for (symbol, &len) in lengths.iter().enumerate() {
            ensure_attach!(
                u32::from(len) <= max_len,
                ParseError::InvalidPrefixCode,
                InvalidCodeLength { symbol, len, max_len },
            );
            len_counts[usize::from(len)] += 1;
        }

        // Sort the used symbols by code length, then by symbol value.
        let mut offsets = [0u16; MAX_CODEWORD_LEN as usize + 2];
        for len in 1..=max_len as usize {
            offsets[len + 1] = offsets[len] + len_counts[len];
        }
        let mut sorted = [0u16; NUM_LITLEN_SYMBOLS];
        for (symbol, &len) in lengths.iter().enumerate() {
            if len != 0 {
                let offset = &mut offsets[usize::from(len)];
                sorted[usize::from(*offset)] = symbol as u16;
                *offset += 1;
            }
        }
        let used_count = lengths.len() - usize::from(len_counts[0]);
        let mut sorted_results = sorted[..used_count].iter().map(|&symbol| results[usize::from(symbol)]);

        let codespace_used: u32 =
            (1..=max_len).map(|len| u32::from(len_counts[len as usize]) << (max_len - len)).sum();
        let codespace_full = 1 << max_len;
        ensure_attach!(
            codespace_used <= codespace_full,
            ParseError::InvalidPrefixCode,
            OverflowingCode(codespace_used, codespace_full),
        );

        self.table_bits = table_bits;
        self.entries.clear();
        let primary_len = 1usize << table_bits;

        if codespace_used < codespace_full {
            let entry = if codespace_used == 0 {
                ensure_attach!(
                    allow_empty,
                    ParseError::InvalidPrefixCode,
                    IncompleteCode(codespace_used, codespace_full),
                );
                DecodeEntry::invalid()
            } else {
                // A single codeword of length 1 is allowed to stand for the whole code.
                ensure_attach!(
                    codespace_used == codespace_full >> 1 && len_counts[1] == 1,
                    ParseError::InvalidPrefixCode,
                    IncompleteCode(codespace_used, codespace_full),
                );
                ensure_matches_attach!(sorted_results.next(), Some(entry), ParseError::InvalidPrefixCode);
                entry
            };
            self.entries.resize(primary_len, entry.with_code_len(1));
            return Ok(());
        }

        let count_at = |len: u32| -> Result<u16, ParseError> {
            ensure_matches_attach!(len_counts.get(len as usize), Some(&count), ParseError::InvalidPrefixCode);
            Ok(count)
        };
        let mut next_result = || -> Result<DecodeEntry, ParseError> {
            ensure_matches_attach!(sorted_results.next(), Some(entry), ParseError::InvalidPrefixCode);
            Ok(entry)
        };

        let mut codeword = 0u32;
        let mut len = 1;
        let mut count = count_at(len)?;
        while count == 0 {
            len += 1;
            count = count_at(len)?;
        }

        // Codewords which fit in the primary table are written once, and the table is doubled each time the codeword
        // length grows so shorter codewords cover every index they prefix.
        self.entries.resize(primary_len, DecodeEntry::default());
        if len <= table_bits {
            let mut table_end = 1usize << len;
            loop {
                loop {
                    self.entries[codeword as usize] = next_result()?.with_code_len(len);
                    if codeword as usize == table_end - 1 {
                        while table_end < primary_len {
                            self.entries.copy_within(..table_end, table_end);
                            table_end <<= 1;
                        }
                        return Ok(());
                    }
                    codeword = next_codeword(codeword, len);
                    count -= 1;
                    if count == 0 {
                        break;
                    }
                }
                loop {
                    len += 1;
                    if len <= table_bits {
                        self.entries.copy_within(..table_end, table_end);
                        table_end <<= 1;
                    }
                    count = count_at(len)?;
                    if count != 0 {
                        break;
                    }
                }
                if len > table_bits {
                    break;
                }
            }
        }

        // The remaining codewords are longer than the primary table's index width. Each distinct primary-width prefix
        // gets its own sub-table, sized to exactly cover the codespace below that prefix.
        let prefix_mask = primary_len as u32 - 1;
        let mut table_end = primary_len;
        let mut subtable_prefix = None;
        let mut subtable_start = 0;
        loop {
            let prefix = codeword & prefix_mask;
            if subtable_prefix != Some(prefix) {
                subtable_prefix = Some(prefix);
                subtable_start = table_end;
                let mut subtable_bits = len - table_bits;
                let mut codespace = u32::from(count);
                while codespace < 1 << subtable_bits {
                    subtable_bits += 1;
                    codespace = (codespace << 1) + u32::from(count_at(table_bits + subtable_bits)?);
                }
                table_end = subtable_start + (1 << subtable_bits);
                ensure_attach!(
                    table_end <= enough,
                    ParseError::InvalidPrefixCode,
                    InvalidSymbolCount(table_end, enough),
                );
                self.entries.resize(table_end, DecodeEntry::default());
                self.entries[prefix as usize] = DecodeEntry::subtable(subtable_start, subtable_bits);
            }

            let entry = next_result()?.with_code_len(len - table_bits);
            let stride = 1 << (len - table_bits);
            let mut idx = subtable_start + (codeword >> table_bits) as usize;
            while idx < table_end {
                self.entries[idx] = entry;
                idx += stride;
            }

            if codeword == (1 << len) - 1 {
                return Ok(());
            }
            codeword = next_codeword(codeword, len);
            count -= 1;
            while count == 0 {
                len += 1;
                count = count_at(len)?;
            }
        }
    }
}

/// Advance a bit-reversed `len`-bit codeword to the next codeword in canonical order.
fn next_codeword(codeword: u32, len: u32) -> u32 {
    let bit = 1 << (31 - (codeword ^ ((1 << len) - 1)).leading_zeros());
    (codeword & (bit - 1)) | bit
}
