#![no_main]

use libfuzzer_sys::fuzz_target;

const MAX_CAPACITY: usize = 1 << 20;

fuzz_target!(|data: &[u8]| {
    #[cfg_attr(not(fuzzing_repro), allow(unused))]
    match pngz_zlib::decompress(data, MAX_CAPACITY) {
        Ok(decompressed) => {
            #[cfg(fuzzing_repro)]
            eprintln!("decompressed {} bytes", decompressed.len());

            let recompressed = pngz_zlib::compress(&decompressed).unwrap();
            assert_eq!(pngz_zlib::decompress(&recompressed, decompressed.len()).unwrap(), decompressed);
        }
        Err(error) => {
            #[cfg(fuzzing_repro)]
            eprintln!("pngz-zlib returned an error: {error}\n{error:?}");
        }
    }
});
