use image::RgbImage;
use tracing::trace;

use super::luma;

/// Pixels at or above this luma count as whitespace.
pub const NEAR_WHITE_LUMA: f64 = 245.0;

/// Trim uniform near-white rows and columns from every edge.
///
/// An image that is near-white everywhere is returned unchanged rather than
/// collapsed to zero size.
pub fn crop_whitespace(image: RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let is_white = |x: u32, y: u32| luma(image.get_pixel(x, y)) >= NEAR_WHITE_LUMA;
    let row_is_white = |y: u32| (0..width).all(|x| is_white(x, y));

    let Some(top) = (0..height).find(|&y| !row_is_white(y)) else {
        return image;
    };
    // A non-white row exists, so both searches below succeed.
    let bottom = (top..height)
        .rev()
        .find(|&y| !row_is_white(y))
        .unwrap_or(top);
    let column_is_white = |x: u32| (top..=bottom).all(|y| is_white(x, y));
    let left = (0..width).find(|&x| !column_is_white(x)).unwrap_or(0);
    let right = (left..width)
        .rev()
        .find(|&x| !column_is_white(x))
        .unwrap_or(left);

    let new_width = right - left + 1;
    let new_height = bottom - top + 1;
    if new_width == width && new_height == height {
        return image;
    }

    trace!(
        left,
        top,
        width = new_width,
        height = new_height,
        "Cropped whitespace border"
    );
    image::imageops::crop_imm(&image, left, top, new_width, new_height).to_image()
}
