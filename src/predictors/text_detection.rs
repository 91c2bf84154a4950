//! Text detection over a dense probability map.
//!
//! The detector resizes the source to a 32-multiple, packs it into a CHW
//! tensor, runs the DB-style detection model, and converts the resulting
//! per-pixel text probability map into padded bounding boxes in source
//! coordinates: threshold, L∞ dilation to reconnect thin strokes, connected
//! components, height-proportional inflation, and back-projection.

use ndarray::Array4;

use crate::core::config::DetectionConfig;
use crate::core::errors::{OcrError, OcrResult, ProcessingStage};
use crate::core::inference::InferenceSession;
use crate::predictors::FALLBACK_OUTPUT_NAME;
use crate::processors::{
    apply_padding_to_rect, calculate_resize_dimensions, project_rect_to_source, DistanceNorm,
    ImageBuffer, ResizeParams, ResizeTarget, TextRect,
};

/// Text detection predictor.
pub struct TextDetector {
    session: Box<dyn InferenceSession>,
    config: DetectionConfig,
}

impl std::fmt::Debug for TextDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDetector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TextDetector {
    /// Creates a detector from a loaded session and a validated config.
    pub fn new(session: Box<dyn InferenceSession>, config: DetectionConfig) -> OcrResult<Self> {
        config.validate()?;
        Ok(Self { session, config })
    }

    /// The detector's configuration.
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Detects text regions, returning boxes in source coordinates.
    ///
    /// A session that produces no output tensor under the expected name is
    /// treated as "no text found" and yields an empty list.
    pub fn run(&mut self, image: &ImageBuffer) -> OcrResult<Vec<TextRect>> {
        let (input, params) = self.preprocess(image)?;

        let outputs = self.session.run(input)?;
        let output_name = self
            .session
            .output_names()
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_OUTPUT_NAME)
            .to_string();

        let Some(probability_map) = outputs.get(&output_name) else {
            tracing::debug!(
                expected = %output_name,
                available = ?outputs.keys().collect::<Vec<_>>(),
                "detection model produced no output tensor; reporting no text"
            );
            return Ok(Vec::new());
        };

        self.postprocess(probability_map.view(), &params)
    }

    /// Resizes and packs the source into the `[1, 3, dstH, dstW]` input.
    fn preprocess(&self, image: &ImageBuffer) -> OcrResult<(Array4<f32>, ResizeParams)> {
        let params = calculate_resize_dimensions(
            image.width(),
            image.height(),
            self.config.max_side_length,
        );
        tracing::debug!(
            src_w = params.src_w,
            src_h = params.src_h,
            dst_w = params.dst_w,
            dst_h = params.dst_h,
            "detection preprocess"
        );

        let resized = image.resize(ResizeTarget::exact(params.dst_w, params.dst_h))?;

        let mean = self.config.mean.map(|m| m * 255.0);
        let norm = self.config.std_deviation.map(|s| 1.0 / (s * 255.0));
        let tensor = resized.tensor(&mean, &norm);

        let input = Array4::from_shape_vec(
            (1, 3, params.dst_h as usize, params.dst_w as usize),
            tensor,
        )?;
        Ok((input, params))
    }

    /// Converts the probability map into padded source-coordinate boxes.
    fn postprocess(
        &self,
        probability_map: ndarray::ArrayViewD<'_, f32>,
        params: &ResizeParams,
    ) -> OcrResult<Vec<TextRect>> {
        let expected = [1usize, 1, params.dst_h as usize, params.dst_w as usize];
        if probability_map.shape() != expected {
            return Err(OcrError::processing(
                ProcessingStage::PostProcessing,
                format!(
                    "detection output shape {:?} does not match expected {:?}",
                    probability_map.shape(),
                    expected
                ),
            ));
        }

        let pixels: Vec<u8> = probability_map
            .iter()
            .map(|&p| (p * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect();
        let map = ImageBuffer::new(params.dst_w, params.dst_h, 1, pixels)?;

        let threshold = (255.0 * self.config.text_pixel_threshold).round() as u8;
        let mask = map.threshold(threshold);
        // Radius-1 dilation reconnects strokes the threshold split apart.
        let mask = mask.dilate(DistanceNorm::LInf, 1)?;

        let components = mask.contours(self.config.minimum_area_threshold);
        tracing::debug!(count = components.len(), "detection components");

        let boxes = components
            .into_iter()
            .map(|component| {
                let padded = apply_padding_to_rect(
                    component,
                    params.dst_w,
                    params.dst_h,
                    self.config.padding_box_vertical,
                    self.config.padding_box_horizontal,
                );
                project_rect_to_source(padded, params)
            })
            .collect();

        Ok(boxes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inference::{Tensor4D, TensorMap};

    /// Session stub that returns a probability map with one solid block.
    struct BlockSession {
        names: Vec<String>,
        block: Option<(usize, usize, usize, usize)>,
    }

    impl InferenceSession for BlockSession {
        fn output_names(&self) -> &[String] {
            &self.names
        }

        fn run(&mut self, input: Tensor4D) -> OcrResult<TensorMap> {
            let (_, _, height, width) = input.dim();
            let mut map = ndarray::ArrayD::<f32>::zeros(vec![1, 1, height, width]);
            if let Some((x, y, w, h)) = self.block {
                for yy in y..y + h {
                    for xx in x..x + w {
                        map[[0, 0, yy, xx]] = 1.0;
                    }
                }
            }
            let mut outputs = TensorMap::new();
            outputs.insert(self.names[0].clone(), map);
            Ok(outputs)
        }
    }

    /// Session stub that never produces the expected output.
    struct SilentSession {
        names: Vec<String>,
    }

    impl InferenceSession for SilentSession {
        fn output_names(&self) -> &[String] {
            &self.names
        }

        fn run(&mut self, _input: Tensor4D) -> OcrResult<TensorMap> {
            Ok(TensorMap::new())
        }
    }

    fn white_image(width: u32, height: u32) -> ImageBuffer {
        ImageBuffer::new(width, height, 3, vec![255; (width * height * 3) as usize]).unwrap()
    }

    #[test]
    fn test_detector_returns_boxes_within_source_bounds() {
        let session = BlockSession {
            names: vec!["sigmoid_0.tmp_0".to_string()],
            block: Some((100, 100, 200, 40)),
        };
        let mut detector =
            TextDetector::new(Box::new(session), DetectionConfig::default()).unwrap();

        let image = white_image(1000, 500);
        let boxes = detector.run(&image).unwrap();
        assert_eq!(boxes.len(), 1);

        let rect = boxes[0];
        assert!(rect.is_valid());
        assert!(rect.right() <= 1000);
        assert!(rect.bottom() <= 500);
        // The inflated, back-projected box still covers the seeded block
        // (block at 100,100 in the 960x480 map maps to ~104,104 in source).
        assert!(rect.x < 105 && rect.y < 105);
        assert!(rect.right() > 312 && rect.bottom() > 145);
    }

    #[test]
    fn test_detector_missing_output_yields_empty() {
        let session = SilentSession {
            names: vec!["sigmoid_0.tmp_0".to_string()],
        };
        let mut detector =
            TextDetector::new(Box::new(session), DetectionConfig::default()).unwrap();
        let boxes = detector.run(&white_image(64, 64)).unwrap();
        assert!(boxes.is_empty());
    }

    #[test]
    fn test_detector_filters_small_components() {
        let session = BlockSession {
            names: vec!["sigmoid_0.tmp_0".to_string()],
            block: Some((10, 10, 2, 2)),
        };
        let config = DetectionConfig {
            minimum_area_threshold: 100,
            ..DetectionConfig::default()
        };
        let mut detector = TextDetector::new(Box::new(session), config).unwrap();
        // A 2x2 block dilates to 4x4 = 16 px, below the 100 px floor.
        let boxes = detector.run(&white_image(640, 640)).unwrap();
        assert!(boxes.is_empty());
    }
}
