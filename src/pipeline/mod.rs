//! The high-level OCR pipeline.
//!
//! [`Pipeline`] wires the detector and the recognizer together behind a
//! single `recognize` call and groups results into reading-order lines.

pub mod ocr;
pub mod result;

pub use ocr::{ImageInput, Pipeline, PipelineBuilder};
pub use result::OcrDocument;
