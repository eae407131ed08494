use image::RgbImage;

use super::luma;

/// Variance of the 4-neighbour Laplacian response over the grayscale image.
///
/// Kernel `[0 1 0; 1 -4 1; 0 1 0]`, borders mirrored without repeating the
/// edge pixel. Flat or heavily blurred images score near zero.
pub fn sharpness(image: &RgbImage) -> f64 {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let (w, h) = (width as usize, height as usize);
    let gray: Vec<f64> = image.pixels().map(luma).collect();
    let at = |x: usize, y: usize| gray[y * w + x];

    let count = (w * h) as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for y in 0..h {
        let up = reflect(y as isize - 1, h);
        let down = reflect(y as isize + 1, h);
        for x in 0..w {
            let left = reflect(x as isize - 1, w);
            let right = reflect(x as isize + 1, w);
            let response = at(x, up) + at(x, down) + at(left, y) + at(right, y) - 4.0 * at(x, y);
            sum += response;
            sum_sq += response * response;
        }
    }

    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0)
}

/// Mirror an out-of-range index back into `0..len`, excluding the edge itself.
fn reflect(index: isize, len: usize) -> usize {
    let len = len as isize;
    if len == 1 {
        return 0;
    }
    let reflected = if index < 0 {
        -index
    } else if index >= len {
        2 * len - 2 - index
    } else {
        index
    };
    reflected as usize
}
