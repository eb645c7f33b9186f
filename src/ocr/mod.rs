pub mod setup;
pub mod preprocess;
pub mod engine;
pub mod extract;

pub use engine::{RecognizedSpan, Recognizer, TesseractRecognizer};
pub use extract::{Candidate, CandidateNormalizer};
#[allow(unused_imports)]
pub use preprocess::{crop_region, enhance_for_ocr};

use anyhow::Result;
use image::{ImageBuffer, ImageFormat, Rgba};
use std::io::Cursor;

use crate::capture::geometry::Rect;

/// High-level function: live frame → enhanced, PNG-encoded region.
///
/// Crops the region of interest out of the frame, applies the OCR contrast
/// enhancement, and returns both the still (for overlay display) and its
/// encoding (for the recognizer).
pub fn prepare_region(
    frame: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    region: &Rect,
) -> Result<(ImageBuffer<Rgba<u8>, Vec<u8>>, Vec<u8>)> {
    log::info!(
        "OCR: cropping region x={:.1} y={:.1} w={:.1} h={:.1}",
        region.x, region.y, region.width, region.height
    );

    let mut still = crop_region(frame, region);
    enhance_for_ocr(&mut still);

    let mut png = Vec::new();
    still.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok((still, png))
}
