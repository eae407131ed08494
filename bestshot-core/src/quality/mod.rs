//! Pixel-level quality analysis.
//!
//! - **Whitespace cropping** trims near-white borders so that later metrics see
//!   only photographic content.
//! - **Sharpness** is the variance of a discrete Laplacian over the grayscale
//!   image; higher means more edge detail.

pub mod crop;
pub mod sharpness;

pub use crop::{crop_whitespace, NEAR_WHITE_LUMA};
pub use sharpness::sharpness;

use image::Rgb;

/// Grayscale value of an RGB pixel using ITU-R BT.601 weights.
pub(crate) fn luma(pixel: &Rgb<u8>) -> f64 {
    let [r, g, b] = pixel.0;
    0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)
}
