//! Core error types for the OCR pipeline.
//!
//! This module defines the error surface of the crate: the main [`OcrError`]
//! enum, the [`ProcessingStage`] enum used to tag processing failures, and
//! the [`ImageProcessError`] enum for misuse of the pixel-level operations.

use thiserror::Error;

/// Convenient result alias used throughout the crate.
pub type OcrResult<T> = Result<T, OcrError>;

/// Errors raised by the pixel-level image operations.
///
/// These are programmer errors: the operations are called with arguments
/// that violate their documented contracts.
#[derive(Debug, Error)]
pub enum ImageProcessError {
    /// The crop rectangle is not fully inside the source image.
    #[error(
        "crop rectangle ({x}, {y}, {width}, {height}) out of bounds for {image_width}x{image_height} image"
    )]
    CropOutOfBounds {
        /// X-coordinate of the requested rectangle.
        x: u32,
        /// Y-coordinate of the requested rectangle.
        y: u32,
        /// Width of the requested rectangle.
        width: u32,
        /// Height of the requested rectangle.
        height: u32,
        /// Width of the source image.
        image_width: u32,
        /// Height of the source image.
        image_height: u32,
    },
    /// Resize was requested without a target width or height.
    #[error("resize requires a target width, a target height, or both")]
    MissingTargetSize,
    /// Resize was requested with a zero-sized target.
    #[error("resize target must be at least 1x1 pixel")]
    InvalidTargetSize,
    /// Dilation was requested with a norm other than L-infinity.
    #[error("dilation supports only the L-infinity norm")]
    UnsupportedNorm,
    /// Dilation was requested on an image that is not single-channel.
    #[error("dilation requires a single-channel image, got {channels} channels")]
    NotGrayscale {
        /// Channel count of the offending image.
        channels: u32,
    },
}

/// Enum representing different stages of processing in the OCR pipeline.
///
/// Used to identify which stage an error occurred in, providing context for
/// debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Error occurred while packing pixels into a tensor.
    TensorOperation,
    /// Error occurred during image resizing.
    Resize,
    /// Error occurred during an image processing operation.
    ImageProcessing,
    /// Error occurred while postprocessing a model output.
    PostProcessing,
    /// Error occurred during pipeline execution.
    PipelineExecution,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::TensorOperation => write!(f, "tensor operation"),
            ProcessingStage::Resize => write!(f, "resize"),
            ProcessingStage::ImageProcessing => write!(f, "image processing"),
            ProcessingStage::PostProcessing => write!(f, "post-processing"),
            ProcessingStage::PipelineExecution => write!(f, "pipeline execution"),
        }
    }
}

/// Enum representing the errors that can occur in the OCR pipeline.
#[derive(Debug, Error)]
pub enum OcrError {
    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    Config {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error occurred during processing.
    #[error("{stage} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        stage: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A model did not produce the output tensor the pipeline expected.
    ///
    /// The detector treats this as "no text found"; the recognizer surfaces
    /// it as fatal, since it signals an incompatible model.
    #[error(
        "model '{model}' produced no output named '{expected}'; available outputs: {available:?}"
    )]
    MissingOutput {
        /// The model whose output was missing.
        model: String,
        /// The output name the pipeline looked for.
        expected: String,
        /// The output names the session actually produced.
        available: Vec<String>,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor shape operations.
    #[error("tensor shape")]
    Tensor(#[from] ndarray::ShapeError),
}

impl From<ImageProcessError> for OcrError {
    /// Converts an [`ImageProcessError`] into [`OcrError::Processing`].
    fn from(error: ImageProcessError) -> Self {
        Self::Processing {
            stage: ProcessingStage::ImageProcessing,
            context: error.to_string(),
            source: Some(Box::new(error)),
        }
    }
}

impl OcrError {
    /// Creates a processing error with a stage tag and free-form context.
    pub fn processing(stage: ProcessingStage, context: impl Into<String>) -> Self {
        Self::Processing {
            stage,
            context: context.into(),
            source: None,
        }
    }

    /// Creates a configuration error for missing required fields.
    ///
    /// # Arguments
    ///
    /// * `field` - The name of the missing field
    /// * `context` - Context about where the field is required
    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: format!(
                "missing required field '{}' in {}",
                field.into(),
                context.into()
            ),
        }
    }

    /// Creates a configuration error for invalid field values.
    ///
    /// # Arguments
    ///
    /// * `field` - The name of the field with an invalid value
    /// * `expected` - Description of what was expected
    /// * `actual` - Description of what was actually provided
    pub fn invalid_field(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Config {
            message: format!(
                "invalid value for field '{}': expected {}, got {}",
                field.into(),
                expected.into(),
                actual.into()
            ),
        }
    }

    /// Creates an invalid-input error from a free-form message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
