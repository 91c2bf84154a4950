//! Image processing for the OCR pipeline.
//!
//! This module owns every pixel-level operation the pipeline performs:
//! the [`ImageBuffer`] raster type with crop, resize, pad, tensor pack,
//! threshold, dilate, and connected-component extraction, plus the geometry
//! helpers that map detection boxes between model and source coordinates.

pub mod geometry;
pub mod image_buffer;
pub mod types;

pub use geometry::{
    apply_padding_to_rect, calculate_resize_dimensions, project_rect_to_source, reading_order,
    ResizeParams, TextRect,
};
pub use image_buffer::ImageBuffer;
pub use types::{DistanceNorm, PaddingOptions, ResizeTarget};
