//! The core module of the OCR pipeline.
//!
//! This module contains the fundamental components shared by the rest of the
//! crate:
//! - Error handling
//! - Configuration for detection, recognition, and the ONNX session
//! - The inference gateway abstraction and its `ort`-backed implementation
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod config;
pub mod errors;
pub mod inference;

pub use config::{DetectionConfig, OptimizationLevel, RecognitionConfig, SessionConfig};
pub use errors::{ImageProcessError, OcrError, OcrResult, ProcessingStage};
pub use inference::{
    InferenceGateway, InferenceSession, OrtGateway, Tensor4D, TensorMap, MODEL_INPUT_NAME,
};
