pub mod png;

use bytes::BufMut;
use png::TestPngBuilder;

use crate::parse::{paeth_predictor, ChunkHeader, FilterType, FourCC};

pub fn test_png() -> TestPngBuilder {
    Default::default()
}

pub fn write_test_chunk(out: &mut Vec<u8>, name: FourCC, data: &[u8]) {
    out.put_u32(data.len() as u32);
    out.extend_from_slice(&name.value);
    out.extend_from_slice(data);
    out.put_u32(ChunkHeader::crc(name, data));
}

/// Apply `filter_type` to the unfiltered samples of `row`, where `prev_row` holds the unfiltered samples above.
pub fn filter_test_row(filter_type: FilterType, stride: usize, row: &[u8], prev_row: Option<&[u8]>) -> Vec<u8> {
    (0..row.len())
        .map(|idx| {
            let left = if idx >= stride { row[idx - stride] } else { 0 };
            let up = prev_row.map_or(0, |prev_row| prev_row[idx]);
            let up_left = match prev_row {
                Some(prev_row) if idx >= stride => prev_row[idx - stride],
                _ => 0,
            };
            let predictor = match filter_type {
                FilterType::None => 0,
                FilterType::Sub => left,
                FilterType::Up => up,
                FilterType::Average => ((u16::from(left) + u16::from(up)) / 2) as u8,
                FilterType::Paeth => paeth_predictor(left, up, up_left),
            };
            row[idx].wrapping_sub(predictor)
        })
        .collect()
}
