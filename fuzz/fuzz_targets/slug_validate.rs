//! Fuzz target for slug normalization and validation.
//!
//! Checks that normalizing any input yields a slug that validates, and that
//! validation never panics.

#![no_main]

use kaggle_sync::ident::normalize_slug;
use kaggle_sync::ident::slug::fuzz_validate_slug;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = std::str::from_utf8(data) else {
        return;
    };

    let _ = fuzz_validate_slug(value);

    let slug = normalize_slug(value);
    if !slug.is_empty() {
        assert!(fuzz_validate_slug(&slug).is_ok());
    }
});
