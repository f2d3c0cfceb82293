use bytes::{Buf, BufMut};
use pngz_common::error::WhileParsingType;
use pngz_common::{ensure_attach, Result};

use super::{FourCC, ParseError, PngPrim};

#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    pub name: FourCC,
    pub len: u32,
}

/// The eight bytes every PNG file starts with.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PngSignature;

macro_rules! chunk_type {
    ($($code:ident),+ $(,)?) => {
        #[allow(missing_docs)]
        pub mod chunk_type {
            use super::*;
            $(
                #[doc = concat!("The `", stringify!($code), "` chunk type.")]
                pub const $code: FourCC = FourCC::from_str(stringify!($code));
            )+
        }
    };
}

chunk_type!(IDAT, IEND, IHDR);

//
// ChunkHeader impls
//

#[allow(missing_docs)]
impl ChunkHeader {
    /// The largest chunk length permitted by PNG.
    pub const MAX_LEN: u32 = (1 << 31) - 1;

    /// The length of the CRC-32 following each chunk's data.
    pub const CRC_LEN: u32 = 4;

    /// The CRC-32 of a chunk, computed over its type followed by its data.
    pub fn crc(name: FourCC, data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&name.value);
        hasher.update(data);
        hasher.finalize()
    }
}

impl PngPrim for ChunkHeader {
    const ENCODED_LEN: u32 = 8;

    fn parse<B: Buf>(mut buf: B) -> Result<Self, ParseError> {
        ensure_attach!(
            buf.remaining() >= Self::ENCODED_LEN as usize,
            ParseError::TruncatedChunk,
            WhileParsingType::new::<Self>(),
        );

        let len = buf.get_u32();
        let name = FourCC::parse(&mut buf);
        ensure_attach!(len <= Self::MAX_LEN, ParseError::InvalidInput, WhileParsingType::new::<Self>());
        ensure_attach!(
            name.is_alphabetic(),
            ParseError::InvalidChunkLayout,
            "chunk type is not alphabetic",
            WhileParsingType::new::<Self>(),
        );
        Ok(Self { name, len })
    }

    fn put_buf<B: BufMut>(&self, mut buf: B) {
        buf.put_u32(self.len);
        self.name.put_buf(&mut buf);
    }
}

//
// PngSignature impls
//

#[allow(missing_docs)]
impl PngSignature {
    pub const MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
}

impl PngPrim for PngSignature {
    const ENCODED_LEN: u32 = 8;

    fn parse<B: Buf>(mut buf: B) -> Result<Self, ParseError> {
        ensure_attach!(
            buf.remaining() >= Self::ENCODED_LEN as usize,
            ParseError::InvalidSignature,
            "not a PNG file",
        );

        let mut magic = [0; 8];
        buf.copy_to_slice(&mut magic);
        ensure_attach!(magic == Self::MAGIC, ParseError::InvalidSignature, "not a PNG file");
        Ok(Self)
    }

    fn put_buf<B: BufMut>(&self, mut buf: B) {
        buf.put_slice(&Self::MAGIC);
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::chunk_type::{IEND, IHDR};
    use super::*;

    #[test]
    fn header_big_endian() {
        let header = ChunkHeader::parse(&[0x00, 0x00, 0x01, 0x02, b'I', b'H', b'D', b'R'][..]).unwrap();
        assert_eq!(header, ChunkHeader { name: IHDR, len: 0x102 });

        let mut encoded = vec![];
        header.put_buf(&mut encoded);
        assert_eq!(encoded, [0x00, 0x00, 0x01, 0x02, b'I', b'H', b'D', b'R']);
    }

    #[test]
    fn header_truncated() {
        let err = ChunkHeader::parse(&[0x00, 0x00, 0x00, 0x00, b'I', b'E', b'N'][..]).unwrap_err();
        assert_matches!(err.get_ref(), ParseError::TruncatedChunk, "{err:?}");
    }

    #[test]
    fn header_len_too_large() {
        let err = ChunkHeader::parse(&[0x80, 0x00, 0x00, 0x00, b'I', b'D', b'A', b'T'][..]).unwrap_err();
        assert_matches!(err.get_ref(), ParseError::InvalidInput, "{err:?}");
    }

    #[test]
    fn header_non_alphabetic_type() {
        let err = ChunkHeader::parse(&[0x00, 0x00, 0x00, 0x00, b'I', b'D', b'4', b'T'][..]).unwrap_err();
        assert_matches!(err.get_ref(), ParseError::InvalidChunkLayout, "{err:?}");
    }

    #[test]
    fn iend_crc() {
        assert_eq!(ChunkHeader::crc(IEND, &[]), 0xae42_6082);
    }

    #[test]
    fn signature() {
        PngSignature::parse(&PngSignature::MAGIC[..]).unwrap();

        let mut not_png = PngSignature::MAGIC;
        not_png[1] = b'p';
        let err = PngSignature::parse(&not_png[..]).unwrap_err();
        assert_matches!(err.get_ref(), ParseError::InvalidSignature, "{err:?}");

        let err = PngSignature::parse(&PngSignature::MAGIC[..7]).unwrap_err();
        assert_matches!(err.get_ref(), ParseError::InvalidSignature, "{err:?}");
    }
}
