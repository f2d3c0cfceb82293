use std::io::Write;

use bytes::BufMut;
use derive_builder::Builder;
use pngz_common::InputSpan;
use pngz_common_test::init_logger;

use crate::parse::chunk_type::{IDAT, IEND, IHDR};
use crate::parse::{ColorType, FilterType, FourCC, PngSignature};
use crate::{load_with_config, Config, Error, Image};

use super::{filter_test_row, write_test_chunk};

#[derive(Builder)]
#[builder(name = "TestPngBuilder", build_fn(name = "build_spec"))]
pub struct TestPngSpec {
    #[builder(default = "PngSignature::MAGIC")]
    signature: [u8; 8],

    #[builder(default = "3")]
    width: u32,

    #[builder(default = "2")]
    height: u32,

    #[builder(default = "ColorType::Rgba as u8")]
    color_type: u8,

    #[builder(default = "8")]
    bit_depth: u8,

    #[builder(default)]
    interlace_method: u8,

    /// Filter types for successive scanlines, repeated as needed.
    #[builder(default = "vec![FilterType::None]")]
    #[builder(setter(into))]
    filter_types: Vec<FilterType>,

    /// Unfiltered samples, in the color type of the image.
    #[builder(default, setter(into, strip_option))]
    samples: Option<Vec<u8>>,

    /// Filtered scanlines, replacing the ones computed from `samples` and `filter_types`.
    #[builder(default, setter(into, strip_option))]
    filtered: Option<Vec<u8>>,

    /// A zlib stream, replacing the one compressed from the filtered scanlines.
    #[builder(default, setter(into, strip_option))]
    zlib: Option<Vec<u8>>,

    /// Compress with stored blocks from `pngz-zlib` rather than with `libflate`.
    #[builder(default)]
    stored: bool,

    #[builder(default = "vec![IHDR, IDAT, IEND]")]
    #[builder(setter(into, each(name = "add_chunk")))]
    chunks: Vec<FourCC>,

    /// Offsets at which the zlib stream is split between `IDAT` chunks. Split evenly by default.
    #[builder(default, setter(into, strip_option))]
    idat_splits: Option<Vec<usize>>,

    #[builder(default)]
    #[builder(setter(into))]
    iend_data: Vec<u8>,
}

#[derive(Clone)]
pub struct TestPng {
    pub data: Vec<u8>,
    /// The span of each chunk, in file order.
    pub chunk_spans: Vec<InputSpan>,
    pub zlib: Vec<u8>,
    /// The RGBA pixels the file decodes to, if the image data was not overridden.
    pub expected_pixels: Option<Vec<u8>>,
}

const DUMMY_CHUNK_DATA: &[u8] = b"dummy ancillary chunk data";

impl TestPngBuilder {
    pub fn build(&self) -> TestPng {
        self.build_spec().unwrap().build()
    }
}

impl TestPngSpec {
    pub fn build(&self) -> TestPng {
        init_logger();

        let color_type = ColorType::from_u8(self.color_type).ok();
        let bytes_per_pixel = color_type.map_or(1, ColorType::bytes_per_pixel);
        let row_len = self.width as usize * bytes_per_pixel;

        let samples = self.samples.clone().unwrap_or_else(|| {
            let len = row_len * self.height as usize;
            (0..len).map(|idx| (idx.wrapping_mul(37) + idx / 7) as u8).collect()
        });

        let filtered = self.filtered.clone().unwrap_or_else(|| {
            let mut filtered = Vec::with_capacity((1 + row_len) * self.height as usize);
            let mut prev_row = None;
            for (row_idx, row) in samples.chunks(row_len.max(1)).take(self.height as usize).enumerate() {
                let filter_type = self.filter_types[row_idx % self.filter_types.len()];
                filtered.push(filter_type as u8);
                filtered.extend(filter_test_row(filter_type, bytes_per_pixel, row, prev_row));
                prev_row = Some(row);
            }
            if row_len == 0 {
                filtered.resize(self.height as usize, FilterType::None as u8);
            }
            filtered
        });

        let zlib = self.zlib.clone().unwrap_or_else(|| match self.stored {
            true => pngz_zlib::compress(&filtered).unwrap(),
            false => {
                let mut encoder = libflate::zlib::Encoder::new(Vec::new()).unwrap();
                encoder.write_all(&filtered).unwrap();
                encoder.finish().into_result().unwrap()
            }
        });

        let expected_pixels = match (color_type, &self.filtered, &self.zlib) {
            (Some(color_type), None, None) => Some(expand_samples(&samples, color_type)),
            _ => None,
        };

        let idat_count = self.chunks.iter().filter(|&&name| name == IDAT).count();
        let mut idat_data = split_image_data(&zlib, idat_count, self.idat_splits.as_deref()).into_iter();

        let mut data = self.signature.to_vec();
        let mut chunk_spans = Vec::with_capacity(self.chunks.len());
        for &name in &self.chunks {
            let offset = data.len();
            match name {
                IHDR => {
                    let mut ihdr = Vec::with_capacity(13);
                    ihdr.put_u32(self.width);
                    ihdr.put_u32(self.height);
                    ihdr.extend_from_slice(&[self.bit_depth, self.color_type, 0, 0, self.interlace_method]);
                    write_test_chunk(&mut data, name, &ihdr);
                }
                IDAT => write_test_chunk(&mut data, name, idat_data.next().unwrap_or_default()),
                IEND => write_test_chunk(&mut data, name, &self.iend_data),
                _ => write_test_chunk(&mut data, name, DUMMY_CHUNK_DATA),
            }
            chunk_spans.push(InputSpan::new(offset, data.len() - offset));
        }

        TestPng { data, chunk_spans, zlib, expected_pixels }
    }
}

impl TestPng {
    /// Decode a valid file, asserting the decoder accepts it and produces the expected pixels.
    pub fn load_ok(&self) -> Image {
        self.load_ok_with_config(Config::default())
    }

    /// Decode a valid file, with a [`Config`], asserting the decoder accepts it and produces the expected pixels.
    pub fn load_ok_with_config(&self, config: Config) -> Image {
        let image = load_with_config(&self.data, config).unwrap();
        if let Some(expected_pixels) = &self.expected_pixels {
            assert_eq!(image.pixels(), &expected_pixels[..]);
        }
        image
    }

    /// Decode an invalid file, asserting the decoder rejects it.
    pub fn load_invalid(&self) -> Error {
        self.load_invalid_with_config(Config::default())
    }

    /// Decode an invalid file, with a [`Config`], asserting the decoder rejects it.
    pub fn load_invalid_with_config(&self, config: Config) -> Error {
        let err = load_with_config(&self.data, config).unwrap_err();
        log::info!("decoder rejected invalid file: {err}\n{err:?}");
        err
    }
}

fn split_image_data<'a>(zlib: &'a [u8], idat_count: usize, splits: Option<&[usize]>) -> Vec<&'a [u8]> {
    let mut bounds = vec![0];
    match splits {
        Some(splits) => bounds.extend_from_slice(splits),
        None => bounds.extend((1..idat_count).map(|idx| idx * zlib.len() / idat_count)),
    }
    bounds.push(zlib.len());
    bounds.windows(2).map(|bounds| &zlib[bounds[0]..bounds[1]]).collect()
}

fn expand_samples(samples: &[u8], color_type: ColorType) -> Vec<u8> {
    samples
        .chunks_exact(color_type.bytes_per_pixel())
        .flat_map(|pixel| match *pixel {
            [gray] => [gray, gray, gray, 255],
            [gray, alpha] => [gray, gray, gray, alpha],
            [red, green, blue] => [red, green, blue, 255],
            [red, green, blue, alpha] => [red, green, blue, alpha],
            _ => unreachable!(),
        })
        .collect()
}
