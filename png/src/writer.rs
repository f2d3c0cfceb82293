use bytes::BufMut;

use crate::parse::{ChunkHeader, FourCC, ParseChunk, ParsedChunk, PngPrim, PngSignature};

/// Writes a PNG file as a signature followed by chunks, each with its CRC-32.
pub struct ChunkWriter {
    output: Vec<u8>,
}

//
// ChunkWriter impls
//

impl ChunkWriter {
    /// Start a PNG file of about `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        let mut output = Vec::with_capacity(PngSignature::ENCODED_LEN as usize + capacity);
        PngSignature.put_buf(&mut output);
        Self { output }
    }

    pub fn write_chunk(&mut self, name: FourCC, data: &[u8]) {
        for data in data.chunks(ChunkHeader::MAX_LEN as usize) {
            self.write_single_chunk(name, data);
        }
        if data.is_empty() {
            self.write_single_chunk(name, data);
        }
    }

    pub fn write_parsed<T: ParseChunk + ParsedChunk>(&mut self, chunk: &T) {
        let mut data = Vec::with_capacity(T::ENCODED_LEN as usize);
        chunk.put_buf(&mut data);
        self.write_single_chunk(T::NAME, &data);
    }

    pub fn finish(self) -> Vec<u8> {
        self.output
    }

    fn write_single_chunk(&mut self, name: FourCC, data: &[u8]) {
        let offset = self.output.len();
        ChunkHeader { name, len: data.len() as u32 }.put_buf(&mut self.output);
        self.output.put_slice(data);
        self.output.put_u32(ChunkHeader::crc(name, data));
        log::debug!("wrote {name} @ 0x{offset:08x}: {len} bytes", len = data.len());
    }
}

#[cfg(test)]
mod test {
    use crate::parse::chunk_type::{IDAT, IEND};
    use crate::reader::ChunkReader;

    use super::*;

    #[test]
    fn write_then_read() {
        let mut writer = ChunkWriter::new(0);
        writer.write_chunk(IDAT, b"image data");
        writer.write_chunk(IEND, &[]);
        let output = writer.finish();
        assert_eq!(output.len(), 8 + 12 + 10 + 12);

        let mut reader = ChunkReader::new(&output).unwrap();
        let idat = reader.read_chunk(IDAT).unwrap();
        idat.verify_crc().unwrap();
        assert_eq!(idat.data, b"image data");
        let iend = reader.read_chunk(IEND).unwrap();
        iend.verify_crc().unwrap();
        assert!(iend.data.is_empty());
        assert!(!reader.has_remaining());
    }

    #[test]
    fn empty_iend_bytes() {
        let mut writer = ChunkWriter::new(0);
        writer.write_chunk(IEND, &[]);
        let output = writer.finish();
        assert_eq!(output[8..], [0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xae, 0x42, 0x60, 0x82]);
    }
}
