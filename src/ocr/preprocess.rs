use image::{ImageBuffer, Rgba};

use crate::capture::geometry::Rect;

/// Converts the image to high-contrast grayscale in place.
///
/// Per pixel: Rec. 709 luminance `0.2126 R + 0.7152 G + 0.0722 B`, then darks
/// (< 128) are scaled by 0.8 and lights by 1.2, clamped to 0..=255. All three
/// colour channels receive the result; alpha is left untouched.
pub fn enhance_for_ocr(img: &mut ImageBuffer<Rgba<u8>, Vec<u8>>) {
    for pixel in img.pixels_mut() {
        let r = pixel[0] as f32;
        let g = pixel[1] as f32;
        let b = pixel[2] as f32;

        let v = 0.2126 * r + 0.7152 * g + 0.0722 * b;
        let v = if v < 128.0 { v * 0.8 } else { v * 1.2 };
        let v = v.round().clamp(0.0, 255.0) as u8;

        pixel[0] = v;
        pixel[1] = v;
        pixel[2] = v;
    }
}

/// Crops a sub-region given in native pixel coordinates.
///
/// The rectangle is truncated to whole pixels and clamped to the image bounds,
/// so a region partly outside the frame yields the overlapping part only.
pub fn crop_region(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    region: &Rect,
) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    let (w, h) = img.dimensions();

    let x0 = (region.x.max(0.0) as u32).min(w);
    let y0 = (region.y.max(0.0) as u32).min(h);
    let x1 = ((region.x + region.width).max(0.0) as u32).min(w);
    let y1 = ((region.y + region.height).max(0.0) as u32).min(h);

    image::imageops::crop_imm(img, x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
        .to_image()
}
