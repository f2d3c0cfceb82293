#![allow(missing_docs)]

use derive_more::Display;
use pngz_common::{bail_attach, ensure_eq_attach, Result, ResultExt};

use super::error::WhileDecodingScanline;
use super::{ColorType, IhdrChunk, ParseError};

/// The per-scanline filter types of PNG filter method `0`.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[repr(u8)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

//
// public functions
//

/// Reconstruct the filtered scanlines of `ihdr` in place, expanding them into 8-bit RGBA pixels.
pub fn decode_scanlines(filtered: &mut [u8], ihdr: &IhdrChunk) -> Result<Vec<u8>, ParseError> {
    ensure_eq_attach!(filtered.len(), ihdr.filtered_len(), ParseError::InvalidInput, "image data length");

    let scanline_len = ihdr.scanline_len();
    let bytes_per_pixel = ihdr.color_type.bytes_per_pixel();
    let mut pixels = Vec::with_capacity(ihdr.width as usize * ihdr.height as usize * 4);
    for row_idx in 0..ihdr.height {
        let (previous, rest) = filtered.split_at_mut(row_idx as usize * scanline_len);
        let prev_row = match previous.len() {
            0 => None,
            len => Some(&previous[len - scanline_len + 1..]),
        };
        let (filter_type, row) = rest[..scanline_len].split_at_mut(1);
        let filter_type = FilterType::from_u8(filter_type[0]).attach_printable(WhileDecodingScanline(row_idx))?;

        unfilter_row(filter_type, bytes_per_pixel, row, prev_row);
        expand_row(row, ihdr.color_type, &mut pixels);
    }
    Ok(pixels)
}

/// Narrow 8-bit RGBA `pixels` to the color type of `ihdr`, as scanlines with filter type [`FilterType::None`].
///
/// Grayscale samples are the truncated average of the red, green and blue samples.
pub fn encode_scanlines(pixels: &[u8], ihdr: &IhdrChunk) -> Vec<u8> {
    debug_assert_eq!(pixels.len(), ihdr.width as usize * ihdr.height as usize * 4);

    let mut filtered = Vec::with_capacity(ihdr.filtered_len());
    for row in pixels.chunks_exact(ihdr.width as usize * 4) {
        filtered.push(FilterType::None as u8);
        for pixel in row.chunks_exact(4) {
            let [red, green, blue, alpha] = [pixel[0], pixel[1], pixel[2], pixel[3]];
            match ihdr.color_type {
                ColorType::Grayscale | ColorType::GrayscaleAlpha => {
                    filtered.push(((u16::from(red) + u16::from(green) + u16::from(blue)) / 3) as u8)
                }
                ColorType::Rgb | ColorType::Rgba => filtered.extend_from_slice(&[red, green, blue]),
            }
            if ihdr.color_type.has_alpha() {
                filtered.push(alpha);
            }
        }
    }
    filtered
}

/// The Paeth predictor of a byte from its left, up and upper-left neighbours.
pub fn paeth_predictor(left: u8, up: u8, up_left: u8) -> u8 {
    let estimate = i16::from(left) + i16::from(up) - i16::from(up_left);
    let left_distance = (estimate - i16::from(left)).abs();
    let up_distance = (estimate - i16::from(up)).abs();
    let up_left_distance = (estimate - i16::from(up_left)).abs();
    if left_distance <= up_distance && left_distance <= up_left_distance {
        left
    } else if up_distance <= up_left_distance {
        up
    } else {
        up_left
    }
}

//
// FilterType impls
//

impl FilterType {
    pub fn from_u8(value: u8) -> Result<Self, ParseError> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Sub),
            2 => Ok(Self::Up),
            3 => Ok(Self::Average),
            4 => Ok(Self::Paeth),
            _ => bail_attach!(ParseError::InvalidFilterType(value)),
        }
    }
}

//
// private functions
//

/// Reverse `filter_type` on `row`, where `prev_row` is the reconstructed row above, if any.
fn unfilter_row(filter_type: FilterType, stride: usize, row: &mut [u8], prev_row: Option<&[u8]>) {
    match (filter_type, prev_row) {
        (FilterType::None, _) | (FilterType::Up, None) => {}
        (FilterType::Sub, _) | (FilterType::Paeth, None) => {
            for idx in stride..row.len() {
                row[idx] = row[idx].wrapping_add(row[idx - stride]);
            }
        }
        (FilterType::Up, Some(prev_row)) => {
            for (byte, &up) in row.iter_mut().zip(prev_row) {
                *byte = byte.wrapping_add(up);
            }
        }
        (FilterType::Average, prev_row) => {
            for idx in 0..row.len() {
                let left = if idx >= stride { row[idx - stride] } else { 0 };
                let up = prev_row.map_or(0, |prev_row| prev_row[idx]);
                let average = ((u16::from(left) + u16::from(up)) / 2) as u8;
                row[idx] = row[idx].wrapping_add(average);
            }
        }
        (FilterType::Paeth, Some(prev_row)) => {
            for idx in 0..stride.min(row.len()) {
                row[idx] = row[idx].wrapping_add(prev_row[idx]);
            }
            for idx in stride..row.len() {
                let predictor = paeth_predictor(row[idx - stride], prev_row[idx], prev_row[idx - stride]);
                row[idx] = row[idx].wrapping_add(predictor);
            }
        }
    }
}

fn expand_row(row: &[u8], color_type: ColorType, pixels: &mut Vec<u8>) {
    match color_type {
        ColorType::Grayscale => {
            for &gray in row {
                pixels.extend_from_slice(&[gray, gray, gray, u8::MAX]);
            }
        }
        ColorType::GrayscaleAlpha => {
            for pixel in row.chunks_exact(2) {
                pixels.extend_from_slice(&[pixel[0], pixel[0], pixel[0], pixel[1]]);
            }
        }
        ColorType::Rgb => {
            for pixel in row.chunks_exact(3) {
                pixels.extend_from_slice(&[pixel[0], pixel[1], pixel[2], u8::MAX]);
            }
        }
        ColorType::Rgba => pixels.extend_from_slice(row),
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    /// A 2x2 RGBA image, row by row.
    const GRID: [u8; 16] = [10, 20, 30, 255, 40, 60, 80, 255, 15, 25, 35, 200, 100, 50, 0, 128];

    fn decode(width: u32, height: u32, color_type: ColorType, filtered: &[u8]) -> Result<Vec<u8>, ParseError> {
        let ihdr = IhdrChunk::new(width, height, color_type).unwrap();
        decode_scanlines(&mut filtered.to_vec(), &ihdr)
    }

    fn decode_grid(filter_type: FilterType, rows: [[u8; 8]; 2]) -> Vec<u8> {
        let mut filtered = vec![];
        for row in rows {
            filtered.push(filter_type as u8);
            filtered.extend_from_slice(&row);
        }
        decode(2, 2, ColorType::Rgba, &filtered).unwrap()
    }

    #[test]
    fn none() {
        let rows = [[10, 20, 30, 255, 40, 60, 80, 255], [15, 25, 35, 200, 100, 50, 0, 128]];
        assert_eq!(decode_grid(FilterType::None, rows), GRID);
    }

    #[test]
    fn sub() {
        let rows = [[10, 20, 30, 255, 30, 40, 50, 0], [15, 25, 35, 200, 85, 25, 221, 184]];
        assert_eq!(decode_grid(FilterType::Sub, rows), GRID);
    }

    #[test]
    fn up() {
        let rows = [[10, 20, 30, 255, 40, 60, 80, 255], [5, 5, 5, 201, 60, 246, 176, 129]];
        assert_eq!(decode_grid(FilterType::Up, rows), GRID);
    }

    #[test]
    fn average() {
        let rows = [[10, 20, 30, 255, 35, 50, 65, 128], [10, 15, 20, 73, 73, 8, 199, 157]];
        assert_eq!(decode_grid(FilterType::Average, rows), GRID);
    }

    #[test]
    fn paeth() {
        let rows = [[10, 20, 30, 255, 30, 40, 50, 0], [5, 5, 5, 201, 60, 246, 176, 184]];
        assert_eq!(decode_grid(FilterType::Paeth, rows), GRID);
    }

    #[test]
    fn paeth_tie_break() {
        assert_eq!(paeth_predictor(7, 7, 7), 7);
        assert_eq!(paeth_predictor(10, 20, 15), 15);
        assert_eq!(paeth_predictor(30, 0, 10), 30);
        assert_eq!(paeth_predictor(0, 30, 10), 30);
        assert_eq!(paeth_predictor(0, 10, 0), 10);
        assert_eq!(paeth_predictor(10, 0, 10), 0);
        assert_eq!(paeth_predictor(100, 110, 140), 100);
        assert_eq!(paeth_predictor(60, 90, 80), 60);
        assert_eq!(paeth_predictor(90, 60, 50), 90);
        assert_eq!(paeth_predictor(40, 60, 100), 40);
        assert_eq!(paeth_predictor(100, 60, 40), 100);
        assert_eq!(paeth_predictor(60, 100, 40), 100);
    }

    #[test]
    fn gray_alpha_stride() {
        let filtered = [FilterType::Sub as u8, 10, 200, 20, 156];
        let pixels = decode(2, 1, ColorType::GrayscaleAlpha, &filtered).unwrap();
        assert_eq!(pixels, [10, 10, 10, 200, 30, 30, 30, 100]);

        let filtered = [FilterType::None as u8, 10, 200, 30, 100, FilterType::Average as u8, 5, 100, 5, 50];
        let pixels = decode(2, 2, ColorType::GrayscaleAlpha, &filtered).unwrap();
        assert_eq!(&pixels[8..], [10, 10, 10, 200, 25, 25, 25, 200]);
    }

    #[test]
    fn gray_expansion() {
        let filtered = [FilterType::Sub as u8, 100, 5, 251];
        let pixels = decode(3, 1, ColorType::Grayscale, &filtered).unwrap();
        assert_eq!(pixels, [100, 100, 100, 255, 105, 105, 105, 255, 100, 100, 100, 255]);
    }

    #[test]
    fn rgb_expansion() {
        let filtered = [FilterType::None as u8, 1, 2, 3, FilterType::Up as u8, 255, 255, 255];
        let pixels = decode(1, 2, ColorType::Rgb, &filtered).unwrap();
        assert_eq!(pixels, [1, 2, 3, 255, 0, 1, 2, 255]);
    }

    #[test]
    fn invalid_filter_type() {
        let filtered = [FilterType::None as u8, 1, 5, 1];
        let err = decode(1, 2, ColorType::Grayscale, &filtered).unwrap_err();
        assert_matches!(err.get_ref(), ParseError::InvalidFilterType(5), "{err:?}");
    }

    #[test]
    fn wrong_data_length() {
        let err = decode(1, 2, ColorType::Grayscale, &[0, 1, 0]).unwrap_err();
        assert_matches!(err.get_ref(), ParseError::InvalidInput, "{err:?}");
    }

    #[test]
    fn encode_narrowing() {
        let pixels = [1, 1, 2, 9, 255, 255, 255, 0];
        let expect = [
            (ColorType::Grayscale, &[0, 1, 255][..]),
            (ColorType::GrayscaleAlpha, &[0, 1, 9, 255, 0][..]),
            (ColorType::Rgb, &[0, 1, 1, 2, 255, 255, 255][..]),
            (ColorType::Rgba, &[0, 1, 1, 2, 9, 255, 255, 255, 0][..]),
        ];
        for (color_type, filtered) in expect {
            let ihdr = IhdrChunk::new(2, 1, color_type).unwrap();
            assert_eq!(encode_scanlines(&pixels, &ihdr), filtered, "{color_type}");
        }
    }

    #[test]
    fn encode_then_decode() {
        let ihdr = IhdrChunk::new(2, 2, ColorType::Rgba).unwrap();
        let mut filtered = encode_scanlines(&GRID, &ihdr);
        assert_eq!(filtered.len(), ihdr.filtered_len());
        assert_eq!(decode_scanlines(&mut filtered, &ihdr).unwrap(), GRID);
    }
}
