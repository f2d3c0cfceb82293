#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    #[cfg_attr(not(fuzzing_repro), allow(unused))]
    match pngz::load(data) {
        Ok(image) => {
            #[cfg(fuzzing_repro)]
            eprintln!("decoded {}x{} image", image.width(), image.height());

            let reencoded = pngz::save(&image, pngz::ColorType::Rgba).unwrap();
            assert_eq!(pngz::load(&reencoded).unwrap(), image);
        }
        Err(error) => {
            #[cfg(fuzzing_repro)]
            eprintln!("pngz returned an error: {error}\n{error:?}");
        }
    }
});
