use bitstream_io::{BitWrite, BitWriter, LittleEndian};

use crate::deflate::BlockType;

/// Writes hand-assembled DEFLATE streams.
pub struct TestDeflateWriter {
    writer: BitWriter<Vec<u8>, LittleEndian>,
}

/// The canonical codes for `lengths`, as in RFC 1951 section 3.2.2, with the first bit in the most significant place.
pub fn canonical_codes(lengths: &[u8]) -> Vec<u32> {
    let max_len = lengths.iter().copied().max().unwrap_or(0) as usize;
    let mut len_counts = vec![0u32; max_len + 1];
    for &len in lengths {
        len_counts[len as usize] += 1;
    }
    len_counts[0] = 0;

    let mut next_code = vec![0u32; max_len + 1];
    let mut code = 0;
    for len in 1..=max_len {
        code = (code + len_counts[len - 1]) << 1;
        next_code[len] = code;
    }

    lengths
        .iter()
        .map(|&len| {
            if len == 0 {
                return 0;
            }
            let code = next_code[len as usize];
            next_code[len as usize] += 1;
            code
        })
        .collect()
}

pub fn reverse_bits(code: u32, len: u32) -> u32 {
    if len == 0 {
        return 0;
    }
    code.reverse_bits() >> (32 - len)
}

//
// TestDeflateWriter impls
//

impl TestDeflateWriter {
    pub fn new() -> Self {
        Self { writer: BitWriter::endian(Vec::new(), LittleEndian) }
    }

    pub fn block_header(&mut self, is_final: bool, block_type: BlockType) -> &mut Self {
        self.bits(1, is_final.into()).bits(2, block_type as u32)
    }

    /// Write a stored block body, after its header.
    pub fn stored(&mut self, data: &[u8]) -> &mut Self {
        let len = u16::try_from(data.len()).unwrap();
        self.writer.byte_align().unwrap();
        self.writer.write(16, len).unwrap();
        self.writer.write(16, !len).unwrap();
        self.writer.write_bytes(data).unwrap();
        self
    }

    pub fn fixed_literal(&mut self, byte: u8) -> &mut Self {
        match byte {
            0..=143 => self.code(8, 0x30 + u32::from(byte)),
            144..=255 => self.code(9, 0x190 + u32::from(byte - 144)),
        }
    }

    pub fn fixed_end_of_block(&mut self) -> &mut Self {
        self.code(7, 0)
    }

    /// Write a back-reference using only fixed codes without extra bits.
    pub fn fixed_match(&mut self, length: u32, distance: u32) -> &mut Self {
        assert!((3..=10).contains(&length), "length {length}");
        assert!((1..=4).contains(&distance), "distance {distance}");
        self.code(7, length - 3 + 1).code(5, distance - 1)
    }

    /// Write a Huffman codeword, most significant bit first.
    pub fn code(&mut self, len: u32, code: u32) -> &mut Self {
        for bit in (0..len).rev() {
            self.writer.write_bit((code >> bit) & 1 != 0).unwrap();
        }
        self
    }

    /// Write a header field or extra bits, least significant bit first.
    pub fn bits(&mut self, count: u32, value: u32) -> &mut Self {
        if count != 0 {
            self.writer.write(count, value).unwrap();
        }
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.writer.byte_align().unwrap();
        self.writer.into_writer()
    }

    /// A single dynamic Huffman block which decodes to `abbbb`.
    ///
    /// The literal/length code has four two-bit codewords: `a`, `b`, end-of-block and length `3`. The offset code has a
    /// single one-bit codeword for distance `1`.
    pub fn dynamic_abbbb() -> Vec<u8> {
        let mut writer = Self::new();
        writer.block_header(true, BlockType::DynamicHuffman);
        // 258 literal/length codes, 1 offset code, 18 code length codes.
        writer.bits(5, 1).bits(5, 0).bits(4, 14);
        for len in [0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 2] {
            writer.bits(3, len);
        }

        // Code length codes: 18 -> 0, 1 -> 10, 2 -> 11.
        let zeros = |writer: &mut Self, count: u32| {
            writer.code(1, 0b0).bits(7, count - 11);
        };
        zeros(&mut writer, 97);
        writer.code(2, 0b11).code(2, 0b11);
        zeros(&mut writer, 138);
        zeros(&mut writer, 19);
        writer.code(2, 0b11).code(2, 0b11);
        writer.code(2, 0b10);

        // a, b, <length 3, distance 1>, end-of-block
        writer.code(2, 0b00).code(2, 0b01).code(2, 0b11).code(1, 0b0).code(2, 0b10);
        writer.finish()
    }
}
