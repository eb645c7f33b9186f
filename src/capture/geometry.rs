//! Coordinate conversion utilities.
//!
//! Three pixel spaces meet here: the viewport the live frame is displayed in,
//! the native pixel grid of the camera frame, and the rendered overlay the
//! captured still is shown in. The live frame is shown "cover" fitted (scaled
//! to fill the viewport and centre-cropped); the still is stretched to its slot
//! on independent axes.

use crate::config::RoiConfig;

/// Width and height in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero, e.g. a frame whose metadata has not loaded.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// An axis-aligned rectangle: top-left corner plus extent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Corner-form bounding box as returned by the recognizer, in still-image pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// Scale and centring offset of a cover-fitted frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverFit {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl CoverFit {
    /// Identity mapping, used while the native size is unknown.
    pub const IDENTITY: CoverFit = CoverFit {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Computes the cover fit of a `native` frame inside a `client` box.
    pub fn new(native: Size, client: Size) -> Self {
        if native.is_empty() {
            return Self::IDENTITY;
        }

        let scale = (client.width / native.width).max(client.height / native.height);
        Self {
            scale,
            offset_x: (client.width - native.width * scale) / 2.0,
            offset_y: (client.height - native.height * scale) / 2.0,
        }
    }

    /// Maps a viewport rectangle to native frame pixels.
    pub fn display_to_native(&self, rect: &Rect) -> Rect {
        Rect {
            x: (rect.x - self.offset_x) / self.scale,
            y: (rect.y - self.offset_y) / self.scale,
            width: rect.width / self.scale,
            height: rect.height / self.scale,
        }
    }

    /// Maps a native frame rectangle to viewport pixels.
    pub fn native_to_display(&self, rect: &Rect) -> Rect {
        Rect {
            x: rect.x * self.scale + self.offset_x,
            y: rect.y * self.scale + self.offset_y,
            width: rect.width * self.scale,
            height: rect.height * self.scale,
        }
    }
}

/// Per-axis stretch from captured still pixels to the rendered overlay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayScale {
    pub scale_x: f32,
    pub scale_y: f32,
}

impl OverlayScale {
    pub fn new(still: Size, rendered: Size) -> Self {
        if still.is_empty() {
            return Self {
                scale_x: 1.0,
                scale_y: 1.0,
            };
        }

        Self {
            scale_x: rendered.width / still.width,
            scale_y: rendered.height / still.height,
        }
    }

    /// Overlay position of a recognized word box.
    pub fn map_box(&self, bbox: &BoundingBox) -> Rect {
        Rect {
            x: bbox.x0 * self.scale_x,
            y: bbox.y0 * self.scale_y,
            width: bbox.width() * self.scale_x,
            height: bbox.height() * self.scale_y,
        }
    }
}

/// The fixed region of interest in viewport pixels.
pub fn roi_in_viewport(viewport: Size, roi: &RoiConfig) -> Rect {
    let width = viewport.width * roi.width_fraction;
    let height = roi.height_px;
    Rect {
        x: (viewport.width - width) / 2.0,
        y: viewport.height * roi.center_y_fraction - height / 2.0,
        width,
        height,
    }
}

/// The region of interest mapped onto the native frame.
pub fn roi_in_frame(native: Size, viewport: Size, roi: &RoiConfig) -> Rect {
    let fit = CoverFit::new(native, viewport);
    fit.display_to_native(&roi_in_viewport(viewport, roi))
}
