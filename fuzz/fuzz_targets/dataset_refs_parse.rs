//! Fuzz target for dataset reference list parsing.
//!
//! This fuzzer feeds arbitrary UTF-8 strings to the `INPUT_DATASETS` parser,
//! checking for panics, crashes, or hangs.

#![no_main]

use kaggle_sync::ident::dataset::fuzz_parse_dataset_refs;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(refs) = fuzz_parse_dataset_refs(raw) {
        for reference in refs {
            assert!(!reference.owner.is_empty());
            assert!(!reference.name.is_empty());
        }
    }
});
