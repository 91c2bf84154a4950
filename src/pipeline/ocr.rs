//! Pipeline construction and orchestration.
//!
//! [`PipelineBuilder`] collects the model bytes, the character dictionary,
//! and the stage configs, then materializes both inference sessions through
//! the caller-supplied [`InferenceGateway`]. A built [`Pipeline`] owns the
//! sessions; `recognize` runs strictly sequentially: validate, optionally
//! pad, detect, recognize.

use crate::core::config::{DetectionConfig, RecognitionConfig};
use crate::core::errors::{OcrError, OcrResult};
use crate::core::inference::InferenceGateway;
use crate::pipeline::result::{group_into_lines, OcrDocument};
use crate::predictors::{RecognitionResult, TextDetector, TextRecognizer};
use crate::processors::{ImageBuffer, PaddingOptions};

/// A raw pixel buffer handed to [`Pipeline::recognize`].
///
/// `data` holds interleaved 8-bit samples; the channel count is derived as
/// `data.len() / (width * height)` and must be an integer in `1..=4`.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Interleaved pixel bytes, rows top-to-bottom.
    pub data: Vec<u8>,
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    detection_model: Vec<u8>,
    recognition_model: Vec<u8>,
    characters_dictionary: Vec<String>,
    detection_config: DetectionConfig,
    recognition_config: RecognitionConfig,
}

impl PipelineBuilder {
    /// Creates a builder from the required inputs: the two ONNX model
    /// buffers and the character dictionary (index 0 is the CTC blank).
    pub fn new(
        detection_model: impl Into<Vec<u8>>,
        recognition_model: impl Into<Vec<u8>>,
        characters_dictionary: Vec<String>,
    ) -> Self {
        Self {
            detection_model: detection_model.into(),
            recognition_model: recognition_model.into(),
            characters_dictionary,
            detection_config: DetectionConfig::default(),
            recognition_config: RecognitionConfig::default(),
        }
    }

    /// Sets the detection stage configuration.
    pub fn detection_config(mut self, config: DetectionConfig) -> Self {
        self.detection_config = config;
        self
    }

    /// Sets the recognition stage configuration.
    pub fn recognition_config(mut self, config: RecognitionConfig) -> Self {
        self.recognition_config = config;
        self
    }

    /// Builds the pipeline, creating both inference sessions.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error when a model buffer or the
    /// dictionary is empty, when a config value is out of range, or when the
    /// gateway rejects a model.
    pub fn build(self, gateway: &dyn InferenceGateway) -> OcrResult<Pipeline> {
        if self.detection_model.is_empty() {
            return Err(OcrError::missing_field("model_data", "detection config"));
        }
        if self.recognition_model.is_empty() {
            return Err(OcrError::missing_field("model_data", "recognition config"));
        }
        if self.characters_dictionary.is_empty() {
            return Err(OcrError::missing_field(
                "characters_dictionary",
                "recognition config",
            ));
        }

        let detector = TextDetector::new(
            gateway.load_session(&self.detection_model)?,
            self.detection_config,
        )?;
        let recognizer = TextRecognizer::new(
            gateway.load_session(&self.recognition_model)?,
            self.recognition_config,
            self.characters_dictionary,
        )?;

        Ok(Pipeline {
            detector,
            recognizer,
        })
    }
}

/// The end-to-end OCR pipeline: detection followed by recognition.
///
/// The pipeline owns both inference sessions; `recognize` must not be
/// invoked concurrently on one instance. Multiple pipelines may coexist,
/// each with independent sessions.
#[derive(Debug)]
pub struct Pipeline {
    detector: TextDetector,
    recognizer: TextRecognizer,
}

impl Pipeline {
    /// Creates a [`PipelineBuilder`].
    pub fn builder(
        detection_model: impl Into<Vec<u8>>,
        recognition_model: impl Into<Vec<u8>>,
        characters_dictionary: Vec<String>,
    ) -> PipelineBuilder {
        PipelineBuilder::new(detection_model, recognition_model, characters_dictionary)
    }

    /// Runs OCR over a raw pixel buffer.
    ///
    /// Returns the recognized regions in reading order. When the detection
    /// config carries an outer `padding`, the image is first wrapped in
    /// white on all four sides so text touching the edges stays detectable;
    /// reported boxes are then relative to the padded image.
    pub fn recognize(&mut self, input: ImageInput) -> OcrResult<Vec<RecognitionResult>> {
        let image = ImageBuffer::from_raw(input.width, input.height, input.data)?;

        let padding = self.detector.config().padding;
        let image = if padding > 0 {
            tracing::debug!(padding, "wrapping input in white outer padding");
            image.padding(&PaddingOptions::uniform(padding, [255, 255, 255, 255]))
        } else {
            image
        };

        let boxes = self.detector.run(&image)?;
        self.recognizer.run(&image, &boxes)
    }

    /// Groups reading-ordered results into lines and joins them into a
    /// single string (spaces within a line, newlines between lines).
    pub fn process_recognition(&self, results: &[RecognitionResult]) -> OcrDocument {
        group_into_lines(results)
    }

    /// Releases both inference sessions.
    ///
    /// Dropping the pipeline has the same effect; this form exists for
    /// callers that want the release to be explicit.
    pub fn destroy(self) {
        drop(self);
    }
}
