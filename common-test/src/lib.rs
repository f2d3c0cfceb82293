use std::fs;
use std::io;
use std::io::Read;
use std::path::PathBuf;

use libflate::gzip;

//
// public types
//

/// The directory a test input was found in, and so the outcome expected from decoding it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestType {
    /// The input is well-formed and must decode.
    Valid,
    /// The input is malformed and must be rejected.
    Invalid,
}

//
// private types
//

struct TestDirSpec {
    path: &'static str,
    test_type: TestType,
}

macro_rules! test_dir {
    ($name:literal, $test_type:ident) => {
        $crate::TestDirSpec {
            path: concat!(env!("CARGO_MANIFEST_DIR"), "/../test-data/", $name),
            test_type: TestType::$test_type,
        }
    };
}

const TEST_DATA_DIRS: &[TestDirSpec] = &[test_dir!("valid", Valid), test_dir!("invalid", Invalid)];

//
// public functions
//

pub fn init_logger() {
    // Ignore errors initializing the logger if tests race to configure it
    let _ignore = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .is_test(true)
        .try_init();
}

/// Run `decode` on every file under `test-data/` ending with `ext` or `ext` + `.gz`, in file name order.
///
/// Missing test data directories are skipped.
pub fn test_data<F: FnMut(TestType, &[u8])>(ext: &str, mut decode: F) {
    init_logger();
    let ext_gz = ext.to_string() + ".gz";
    for dir_spec in TEST_DATA_DIRS {
        for path in sorted_dir_entries(dir_spec.path) {
            let file_name = path.file_name().unwrap_or_default().to_string_lossy().into_owned();
            let data = match &file_name {
                name if name.ends_with(ext) => fs::read(&path).unwrap(),
                name if name.ends_with(&ext_gz) => gunzip(&fs::read(&path).unwrap()),
                _ => continue,
            };
            match dir_spec.test_type {
                TestType::Valid => log::info!("running test on valid input: {file_name:?}"),
                TestType::Invalid => log::info!("running test on invalid input: {file_name:?}"),
            }
            decode(dir_spec.test_type, &data[..]);
        }
    }
}

//
// private functions
//

fn sorted_dir_entries(path: &str) -> Vec<PathBuf> {
    let dir_entries = match fs::read_dir(path) {
        Ok(dir_entries) => dir_entries,
        Err(err) => match err.kind() {
            io::ErrorKind::NotFound => return vec![],
            _ => panic!("could not read test data directory: {err}"),
        },
    };
    let mut paths: Vec<_> = dir_entries.map(|dir_entry| dir_entry.unwrap().path()).collect();
    paths.sort();
    paths
}

fn gunzip(input: &[u8]) -> Vec<u8> {
    let mut decoder = gzip::Decoder::new(input).unwrap();
    let mut data = Vec::new();
    decoder.read_to_end(&mut data).unwrap();
    data
}
