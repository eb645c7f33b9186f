//! Frame acquisition and coordinate mapping.
//!
//! This module provides:
//! - Live frame sources behind the `CameraSource` trait (`camera`)
//! - Viewport / native frame / overlay coordinate conversion (`geometry`)

pub mod camera;
pub mod geometry;

#[allow(unused_imports)]
pub use camera::{CameraSource, CameraStream, ImageFileCamera, LiveFeed};
#[allow(unused_imports)]
pub use geometry::{BoundingBox, CoverFit, OverlayScale, Rect, Size};
