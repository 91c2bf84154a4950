//! Configuration types for the OCR pipeline.
//!
//! Detection, recognition, and ONNX-session settings are plain records with
//! every field defaulted. Configs are read-only once the pipeline is built;
//! `validate()` is called at construction and rejects out-of-range values.

use crate::core::errors::{OcrError, OcrResult};
use serde::{Deserialize, Serialize};

/// Configuration for the text detection stage.
///
/// `mean` and `std_deviation` are per-channel normalization statistics in
/// normalized (`[0, 1]`) units; the detector derives the actual packer
/// coefficients from them so that the packed value equals
/// `(px / 255 - mean) / std`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Outer whitespace, in pixels, wrapped around the input before
    /// detection. Makes text touching the image edge detectable.
    pub padding: u32,
    /// Per-channel normalization mean.
    pub mean: [f32; 3],
    /// Per-channel normalization standard deviation.
    pub std_deviation: [f32; 3],
    /// Upper bound on the longer side of the resized detection input.
    pub max_side_length: u32,
    /// Probability above which a pixel counts as text, in `(0, 1)`.
    pub text_pixel_threshold: f32,
    /// Minimum connected-component area, in pixels, kept as a detection.
    pub minimum_area_threshold: u32,
    /// Vertical box inflation as a fraction of the box height.
    pub padding_box_vertical: f32,
    /// Horizontal box inflation as a fraction of the box height.
    ///
    /// Derived from the height rather than the width so the margin scales
    /// with glyph size.
    pub padding_box_horizontal: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            padding: 0,
            mean: [0.485, 0.456, 0.406],
            std_deviation: [0.229, 0.224, 0.225],
            max_side_length: 960,
            text_pixel_threshold: 0.5,
            minimum_area_threshold: 20,
            padding_box_vertical: 0.4,
            padding_box_horizontal: 0.6,
        }
    }
}

impl DetectionConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `text_pixel_threshold` is outside `(0, 1)`, if
    /// `max_side_length` is zero, or if any standard deviation is not
    /// strictly positive.
    pub fn validate(&self) -> OcrResult<()> {
        if !(self.text_pixel_threshold > 0.0 && self.text_pixel_threshold < 1.0) {
            return Err(OcrError::invalid_field(
                "text_pixel_threshold",
                "a value in (0, 1)",
                format!("{}", self.text_pixel_threshold),
            ));
        }
        if self.max_side_length == 0 {
            return Err(OcrError::invalid_field(
                "max_side_length",
                "a positive pixel count",
                "0",
            ));
        }
        validate_normalization(&self.mean, &self.std_deviation)
    }
}

/// Configuration for the text recognition stage.
///
/// The character dictionary is deliberately not part of this record: it is a
/// required input and is passed to the pipeline builder directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Per-channel normalization mean.
    pub mean: [f32; 3],
    /// Per-channel normalization standard deviation.
    pub std_deviation: [f32; 3],
    /// Fixed input height of the recognition model; crops are scaled to this
    /// height with their aspect ratio preserved.
    pub image_height: u32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            mean: [0.5, 0.5, 0.5],
            std_deviation: [0.5, 0.5, 0.5],
            image_height: 48,
        }
    }
}

impl RecognitionConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> OcrResult<()> {
        if self.image_height == 0 {
            return Err(OcrError::invalid_field(
                "image_height",
                "a positive pixel count",
                "0",
            ));
        }
        validate_normalization(&self.mean, &self.std_deviation)
    }
}

fn validate_normalization(mean: &[f32; 3], std: &[f32; 3]) -> OcrResult<()> {
    for (i, &m) in mean.iter().enumerate() {
        if !m.is_finite() {
            return Err(OcrError::invalid_field(
                "mean",
                "finite values",
                format!("{m} at index {i}"),
            ));
        }
    }
    for (i, &s) in std.iter().enumerate() {
        if !(s.is_finite() && s > 0.0) {
            return Err(OcrError::invalid_field(
                "std_deviation",
                "finite values greater than 0",
                format!("{s} at index {i}"),
            ));
        }
    }
    Ok(())
}

/// Graph optimization level applied when building an ONNX session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    /// Disable all graph optimizations.
    DisableAll,
    /// Basic optimizations.
    Level1,
    /// Extended optimizations.
    Level2,
    /// All available optimizations.
    Level3,
}

/// ONNX Runtime session options.
///
/// Unset fields keep the runtime's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of threads used within an operator.
    pub intra_threads: Option<usize>,
    /// Number of threads used across operators.
    pub inter_threads: Option<usize>,
    /// Whether operators may execute in parallel.
    pub parallel_execution: Option<bool>,
    /// Graph optimization level.
    pub optimization_level: Option<OptimizationLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_config_defaults() {
        let config = DetectionConfig::default();
        assert_eq!(config.max_side_length, 960);
        assert_eq!(config.text_pixel_threshold, 0.5);
        assert_eq!(config.minimum_area_threshold, 20);
        assert_eq!(config.padding_box_vertical, 0.4);
        assert_eq!(config.padding_box_horizontal, 0.6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_recognition_config_defaults() {
        let config = RecognitionConfig::default();
        assert_eq!(config.image_height, 48);
        assert_eq!(config.mean, [0.5, 0.5, 0.5]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_detection_config_rejects_out_of_range_threshold() {
        let config = DetectionConfig {
            text_pixel_threshold: 1.0,
            ..DetectionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configs_reject_non_positive_std() {
        let config = DetectionConfig {
            std_deviation: [0.229, 0.0, 0.225],
            ..DetectionConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RecognitionConfig {
            std_deviation: [0.5, 0.5, -0.5],
            ..RecognitionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
