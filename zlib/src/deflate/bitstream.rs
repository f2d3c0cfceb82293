#![allow(missing_docs)]

/// The most bits [`BitReader::need`] can guarantee to be buffered at once.
pub const MAX_NEED_BITS: u32 = 56;

/// A little-endian bit cursor over an in-memory DEFLATE stream.
///
/// Reading past the end of the input never fails: zero bits are buffered instead and the number of missing bytes is
/// counted as overrun. Callers detect truncation afterwards with [`is_exhausted`](Self::is_exhausted) or when reading
/// byte-aligned data.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    input: &'a [u8],
    pos: usize,
    bits: u64,
    bits_len: u32,
    overrun: usize,
}

//
// BitReader impls
//

impl<'a> BitReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0, bits: 0, bits_len: 0, overrun: 0 }
    }

    /// Ensure at least `count` bits are buffered.
    ///
    /// `count` must be at most [`MAX_NEED_BITS`].
    #[inline]
    pub fn need(&mut self, count: u32) {
        debug_assert!(count <= MAX_NEED_BITS);
        if self.bits_len >= count {
            return;
        }
        while self.bits_len < MAX_NEED_BITS {
            let byte = match self.input.get(self.pos) {
                Some(&byte) => {
                    self.pos += 1;
                    byte
                }
                None => {
                    self.overrun += 1;
                    0
                }
            };
            self.bits |= u64::from(byte) << self.bits_len;
            self.bits_len += 8;
        }
    }

    /// Return the low `count` buffered bits without consuming them.
    #[inline]
    pub fn peek(&self, count: u32) -> u32 {
        (self.bits & ((1 << count) - 1)) as u32
    }

    #[inline]
    pub fn consume(&mut self, count: u32) {
        debug_assert!(count <= self.bits_len);
        self.bits >>= count;
        self.bits_len = self.bits_len.saturating_sub(count);
    }

    /// Consume and return the low `count` buffered bits.
    #[inline]
    pub fn take(&mut self, count: u32) -> u32 {
        let value = self.peek(count);
        self.consume(count);
        value
    }

    #[inline]
    pub fn take_bit(&mut self) -> bool {
        self.take(1) != 0
    }

    /// Discard the remaining bits of the current byte and rewind the byte cursor over any whole buffered bytes.
    pub fn align_to_byte(&mut self) {
        self.pos = self.consumed_bytes();
        self.bits = 0;
        self.bits_len = 0;
        self.overrun = 0;
    }

    /// Read `len` bytes directly from the input. The reader must be byte-aligned.
    pub fn read_aligned(&mut self, len: usize) -> Option<&'a [u8]> {
        debug_assert_eq!(self.bits_len, 0);
        let end = self.pos.checked_add(len)?;
        let bytes = self.input.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    /// The number of input bytes consumed so far, counting a partially consumed byte and any overrun.
    pub fn consumed_bytes(&self) -> usize {
        (self.pos + self.overrun).saturating_sub((self.bits_len / 8) as usize)
    }

    /// The number of input bytes not yet consumed.
    pub fn remaining_bytes(&self) -> usize {
        self.input.len().saturating_sub(self.consumed_bytes())
    }

    /// Whether bits from beyond the end of the input have been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.consumed_bytes() > self.input.len()
    }
}
