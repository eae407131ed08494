#![no_main]

//! Fuzz target for normalize()
//!
//! Normalization must never panic and must be idempotent.
//!
//! Run with: cargo +nightly fuzz run fuzz_normalize

use bestshot_core::normalize;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(url) = std::str::from_utf8(data) {
        let once = normalize(url);
        assert_eq!(normalize(&once), once);
    }
});
