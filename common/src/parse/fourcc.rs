use std::fmt;

use bytes::Buf;
use bytes::BufMut;

/// A four-byte character code, such as a PNG chunk type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FourCC {
    /// The character code, as an array of four bytes.
    pub value: [u8; 4],
}

impl FourCC {
    /// The encoded length of a [`FourCC`], in bytes.
    pub const ENCODED_LEN: u32 = 4;

    /// Construct a [`FourCC`] from a string.
    pub const fn from_str(name: &str) -> Self {
        let name = name.as_bytes();
        let mut fourcc = [b' '; 4];
        let mut name_idx = 0;
        while name_idx < name.len() {
            fourcc[name_idx] = name[name_idx];
            name_idx += 1;
        }
        FourCC { value: fourcc }
    }

    /// Whether the code's first letter is lower case, which marks a PNG chunk as ancillary.
    ///
    /// Chunks which are not ancillary are critical to decoding the image.
    pub const fn is_ancillary(&self) -> bool {
        self.value[0] & 0x20 != 0
    }

    /// Whether every byte of the code is an ASCII letter, as required of PNG chunk types.
    pub fn is_alphabetic(&self) -> bool {
        self.value.iter().all(u8::is_ascii_alphabetic)
    }

    /// Parse a [`FourCC`] from a [`Buf`].
    ///
    /// The position of `input` is advanced by 4.
    ///
    /// # Panics
    ///
    /// This function panics if `input.remaining() < 4`.
    pub fn parse<B: Buf>(mut input: B) -> Self {
        let mut value = [0; 4];
        input.copy_to_slice(&mut value);
        Self { value }
    }

    /// Writes `self` to the [`BufMut`] `out`.
    pub fn put_buf<B: BufMut>(&self, mut out: B) {
        out.put(&self.value[..])
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Ok(string) = std::str::from_utf8(&self.value) {
            let string = string.trim();
            write!(f, "{string}")
        } else {
            write!(f, "0x{:08x}", u32::from_be_bytes(self.value))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ancillary_bit() {
        assert!(!FourCC::from_str("IDAT").is_ancillary());
        assert!(FourCC::from_str("tEXt").is_ancillary());
    }

    #[test]
    fn alphabetic() {
        assert!(FourCC::from_str("gAMA").is_alphabetic());
        assert!(!FourCC { value: *b"ID4T" }.is_alphabetic());
    }

    #[test]
    fn display() {
        assert_eq!(FourCC::from_str("IEND").to_string(), "IEND");
        assert_eq!(FourCC { value: [0xff, 0, 0, 1] }.to_string(), "0xff000001");
    }

    #[test]
    fn parse_put_buf() {
        let mut out = Vec::new();
        FourCC::from_str("IHDR").put_buf(&mut out);
        assert_eq!(out, b"IHDR");
        assert_eq!(FourCC::parse(&out[..]), FourCC::from_str("IHDR"));
    }
}
