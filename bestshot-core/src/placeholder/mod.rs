//! Placeholder ("no photo available") detection.
//!
//! A [`PlaceholderCorpus`] is built once from a directory of reference
//! graphics and then shared read-only by every selection call. Candidates whose
//! fingerprint lies within the Hamming threshold of any corpus entry are
//! rejected.

pub mod corpus;
pub mod fingerprint;

pub use corpus::{is_placeholder, load_placeholders, PlaceholderCorpus};
pub use fingerprint::{
    hamming_distance, Fingerprint, FingerprintAlgorithm, Fingerprinter, FINGERPRINT_BITS,
};
