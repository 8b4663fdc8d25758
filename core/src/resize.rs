//! Resolution constraint: fit an image inside a bounding box without upscaling.

use image::imageops::FilterType;
use image::DynamicImage;

/// Dimensions that fit `(width, height)` inside `(max_width, max_height)`.
///
/// The aspect ratio is preserved up to rounding, neither side drops below
/// 1 px, and a source that already fits is returned unchanged.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let (w, h) = (width as u64, height as u64);
    let (mw, mh) = (max_width as u64, max_height as u64);

    // Compare w/mw against h/mh without floats: the larger ratio binds.
    if w * mh >= h * mw {
        let new_h = div_round(h * mw, w).max(1);
        (max_width, new_h.min(mh) as u32)
    } else {
        let new_w = div_round(w * mh, h).max(1);
        (new_w.min(mw) as u32, max_height)
    }
}

fn div_round(num: u64, den: u64) -> u64 {
    (num + den / 2) / den
}

/// Scale `img` down to fit the bounds. Returns the input untouched if it fits.
pub fn scale_down(img: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    let (new_w, new_h) = fit_within(width, height, max_width, max_height);
    if (new_w, new_h) == (width, height) {
        return img;
    }
    log::debug!("Resizing {}x{} -> {}x{}", width, height, new_w, new_h);
    img.resize_exact(new_w, new_h, FilterType::Lanczos3)
}
