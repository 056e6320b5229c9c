#![no_main]

use dotmeta::{metadata::validation::validate_rows, scan::inspect};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(assembly) = dotmeta::load(data.to_vec()) {
        let _ = validate_rows(&assembly);
        let _ = inspect(&assembly);
    }
});
