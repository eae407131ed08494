#![no_main]

//! Fuzz target for the decode and scoring path
//!
//! Arbitrary payloads go through decoding, and anything that decodes is
//! cropped, scored and fingerprinted. None of these steps may panic.
//!
//! Run with: cargo +nightly fuzz run fuzz_decode

use bestshot_core::{crop_whitespace, decode_image, sharpness, Fingerprinter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(image) = decode_image(data) {
        // Keep the fuzzer away from huge allocations in the scorers
        if u64::from(image.width()) * u64::from(image.height()) > 1 << 22 {
            return;
        }
        let _ = Fingerprinter::default().fingerprint(&image);
        let cropped = crop_whitespace(image);
        let _ = sharpness(&cropped);
    }
});
