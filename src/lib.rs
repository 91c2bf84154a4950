//! # ppocr-lite
//!
//! A dependency-light OCR pipeline around the PaddleOCR PP-OCR family of
//! models (text detection + text recognition).
//!
//! Given a raw pixel buffer, the pipeline returns recognized text strings
//! with bounding boxes and confidences, optionally grouped into
//! reading-order lines. The ONNX inference engine is consumed through a
//! narrow [`core::InferenceGateway`] capability; everything around the two
//! sessions (geometric preprocessing, probability-map postprocessing,
//! cropping, and CTC decoding) lives in this crate.
//!
//! ## Modules
//!
//! * [`core`] - Error handling, configuration, and the inference gateway
//! * [`processors`] - Pixel-level image operations and geometry
//! * [`predictors`] - Text detection and text recognition drivers
//! * [`pipeline`] - The orchestrating [`pipeline::Pipeline`] and result types

pub mod core;
pub mod pipeline;
pub mod predictors;
pub mod processors;

/// Prelude module for convenient imports.
pub mod prelude {
    // Error handling
    pub use crate::core::{OcrError, OcrResult};

    // Configuration
    pub use crate::core::{DetectionConfig, RecognitionConfig, SessionConfig};

    // Inference capability
    pub use crate::core::{InferenceGateway, InferenceSession, OrtGateway};

    // Geometry and raster types
    pub use crate::processors::{ImageBuffer, TextRect};

    // Pipeline (high-level API)
    pub use crate::pipeline::{ImageInput, OcrDocument, Pipeline, PipelineBuilder};
    pub use crate::predictors::RecognitionResult;
}
