use std::io;
use std::io::Cursor;

use bitstream_io::{BitWrite, BitWriter, LittleEndian};
use pngz_common::{ensure_attach, report_attach, Result};

use super::BlockType;
use crate::error::OutputFull;
use crate::ParseError;

/// The most data a single stored block can hold.
pub const MAX_STORED_BLOCK_LEN: usize = u16::MAX as usize;

/// Block header byte plus the `LEN` and `NLEN` fields.
const STORED_BLOCK_OVERHEAD: usize = 5;

/// The exact length of the raw DEFLATE stream [`encode`] produces for `input_len` bytes of input.
pub fn compressed_len(input_len: usize) -> usize {
    let block_count = ((input_len + MAX_STORED_BLOCK_LEN - 1) / MAX_STORED_BLOCK_LEN).max(1);
    input_len + block_count * STORED_BLOCK_OVERHEAD
}

/// Encode `input` as a raw DEFLATE stream of stored blocks into `output`, returning the number of bytes written.
///
/// `output` must hold at least [`compressed_len`] bytes. An empty input is encoded as a single empty final block.
pub fn encode(input: &[u8], output: &mut [u8]) -> Result<usize, ParseError> {
    let needed = compressed_len(input.len());
    ensure_attach!(
        output.len() >= needed,
        ParseError::OutputOverflow,
        OutputFull { needed, available: output.len() },
    );

    let mut writer = BitWriter::endian(Cursor::new(output), LittleEndian);
    write_stored_blocks(&mut writer, input).map_err(|err| report_attach!(ParseError::OutputOverflow, err))?;
    let written = writer.into_writer().position() as usize;
    log::debug!("encoded {} bytes as {written} bytes of stored blocks", input.len());
    Ok(written)
}

fn write_stored_blocks<W: BitWrite>(writer: &mut W, input: &[u8]) -> io::Result<()> {
    let mut offset = 0;
    loop {
        let block = &input[offset..input.len().min(offset + MAX_STORED_BLOCK_LEN)];
        offset += block.len();
        let is_final = offset == input.len();

        writer.write_bit(is_final)?;
        writer.write(2, BlockType::Stored as u8)?;
        writer.byte_align()?;
        let len = block.len() as u16;
        writer.write(16, len)?;
        writer.write(16, !len)?;
        writer.write_bytes(block)?;

        if is_final {
            return Ok(());
        }
    }
}
