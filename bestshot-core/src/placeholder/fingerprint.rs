//! Perceptual fingerprints for images.
//!
//! Visually near-identical images (resized, recompressed, lightly cropped)
//! produce fingerprints a few bits apart; unrelated images differ in roughly
//! half of their bits.
//!
//! # Algorithms
//!
//! - [`FingerprintAlgorithm::Dct64`] (default): the grayscale image is resized
//!   to 16x16, transformed with a 2D DCT, and the 8x8 lowest-frequency
//!   coefficients are thresholded against their median (`image_hasher`).
//! - [`FingerprintAlgorithm::Blockhash64`]: the grid-based Blockhash algorithm.
//!
//! Both produce exactly 64 bits.

use std::fmt;

use blockhash::{blockhash64, Blockhash64};
use image::{DynamicImage, RgbImage};
use image_hasher::{HashAlg, HasherConfig};

/// Number of bits in a fingerprint.
pub const FINGERPRINT_BITS: u32 = 64;

/// Fingerprint algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FingerprintAlgorithm {
    /// DCT-preprocessed median hash.
    #[default]
    Dct64,
    /// Blockhash over a 8x8 block grid.
    Blockhash64,
}

/// A 64-bit perceptual fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Number of differing bits between two fingerprints.
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        hamming_distance(*self, *other)
    }

    /// Get the fingerprint as a 16-digit hexadecimal string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_be_bytes())
    }

    /// Parse a fingerprint from a 16-digit hexadecimal string.
    pub fn from_hex(hex_str: &str) -> Option<Self> {
        let bytes: [u8; 8] = hex::decode(hex_str).ok()?.try_into().ok()?;
        Some(Self(u64::from_be_bytes(bytes)))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Count of differing bits between two fingerprints.
pub fn hamming_distance(a: Fingerprint, b: Fingerprint) -> u32 {
    (a.0 ^ b.0).count_ones()
}

/// Fingerprint computation for a chosen algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fingerprinter {
    algorithm: FingerprintAlgorithm,
}

impl Fingerprinter {
    pub fn new(algorithm: FingerprintAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> FingerprintAlgorithm {
        self.algorithm
    }

    /// Compute the fingerprint of a decoded RGB image.
    pub fn fingerprint(&self, image: &RgbImage) -> Fingerprint {
        match self.algorithm {
            FingerprintAlgorithm::Dct64 => dct_fingerprint(image),
            FingerprintAlgorithm::Blockhash64 => {
                let hash: Blockhash64 = blockhash64(&DynamicImage::ImageRgb8(image.clone()));
                let hash_bytes: [u8; 8] = hash.into();
                Fingerprint(u64::from_be_bytes(hash_bytes))
            }
        }
    }
}

fn dct_fingerprint(image: &RgbImage) -> Fingerprint {
    if image.width() == 0 || image.height() == 0 {
        return Fingerprint(0);
    }

    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::Median)
        .preproc_dct()
        .hash_size(8, 8) // 64-bit hash
        .to_hasher();
    fingerprint_from_bytes(hasher.hash_image(image).as_bytes())
}

/// Pack up to eight hash bytes, most significant first.
fn fingerprint_from_bytes(bytes: &[u8]) -> Fingerprint {
    let mut packed = [0u8; 8];
    for (dst, src) in packed.iter_mut().zip(bytes) {
        *dst = *src;
    }
    Fingerprint(u64::from_be_bytes(packed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn scene(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let u = x as f64 / width as f64;
            let v = y as f64 / height as f64;
            let blob = (-((u - 0.3).powi(2) + (v - 0.35).powi(2)) / 0.02).exp();
            Rgb([(40.0 + 150.0 * blob + 60.0 * u) as u8, (50.0 + 40.0 * v) as u8, 90])
        })
    }

    #[test]
    fn test_default_algorithm() {
        assert_eq!(FingerprintAlgorithm::default(), FingerprintAlgorithm::Dct64);
        assert_eq!(
            Fingerprinter::default().algorithm(),
            FingerprintAlgorithm::Dct64
        );
    }

    #[test]
    fn test_hamming_distance() {
        assert_eq!(hamming_distance(Fingerprint(0), Fingerprint(0)), 0);
        assert_eq!(hamming_distance(Fingerprint(0), Fingerprint(u64::MAX)), 64);
        assert_eq!(Fingerprint(0b1011).hamming_distance(&Fingerprint(0b0001)), 2);
    }

    #[test]
    fn test_hex_roundtrip() {
        let fp = Fingerprint(0xDEAD_BEEF_CAFE_BABE);
        assert_eq!(fp.to_hex(), "deadbeefcafebabe");
        assert_eq!(Fingerprint::from_hex("deadbeefcafebabe"), Some(fp));
        assert_eq!(Fingerprint::from_hex("dead"), None);
        assert_eq!(Fingerprint::from_hex("not hex at all!!"), None);
    }

    #[test]
    fn test_identical_images_match_exactly() {
        let hasher = Fingerprinter::default();
        let a = hasher.fingerprint(&scene(120, 90));
        let b = hasher.fingerprint(&scene(120, 90));
        assert_eq!(a, b);
    }

    #[test]
    fn test_half_the_bits_are_set() {
        // Median thresholding splits the coefficients roughly in half.
        let ones = Fingerprinter::default().fingerprint(&scene(200, 160)).0.count_ones();
        assert!((28..=36).contains(&ones), "{ones} bits set");
    }

    #[test]
    fn test_tiny_and_empty_images() {
        let hasher = Fingerprinter::default();
        let _ = hasher.fingerprint(&RgbImage::from_pixel(3, 2, Rgb([10, 20, 30])));
        assert_eq!(hasher.fingerprint(&RgbImage::new(0, 0)), Fingerprint(0));
    }

    #[test]
    fn test_hash_bytes_pack_big_endian() {
        assert_eq!(
            fingerprint_from_bytes(&[0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF]),
            Fingerprint(0x0123_4567_89AB_CDEF)
        );
        assert_eq!(fingerprint_from_bytes(&[0xFF]), Fingerprint(0xFF00_0000_0000_0000));
    }

    #[test]
    fn test_rescaled_image_stays_close() {
        let hasher = Fingerprinter::default();
        let distance = hasher
            .fingerprint(&scene(200, 160))
            .hamming_distance(&hasher.fingerprint(&scene(400, 320)));
        assert!(distance <= 10, "distance {distance}");
    }

    #[test]
    fn test_blockhash_is_deterministic() {
        let hasher = Fingerprinter::new(FingerprintAlgorithm::Blockhash64);
        let image = scene(64, 64);
        assert_eq!(hasher.fingerprint(&image), hasher.fingerprint(&image));
    }
}
