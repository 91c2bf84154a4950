//! Text recognition over detected regions.
//!
//! Each detection box is cropped out of the source, scaled to the
//! recognition model's fixed input height (width following the aspect
//! ratio), packed into a CHW tensor, and decoded from the model's
//! `[1, T, C]` logits by greedy CTC: per time step the argmax class is
//! taken and blanks (class 0) are skipped. Matching the trained models'
//! observed contract, consecutive repeats are NOT collapsed.

use ndarray::{Array4, Axis, Ix3};
use serde::Serialize;

use crate::core::config::RecognitionConfig;
use crate::core::errors::{OcrError, OcrResult, ProcessingStage};
use crate::core::inference::InferenceSession;
use crate::predictors::FALLBACK_OUTPUT_NAME;
use crate::processors::{reading_order, ImageBuffer, ResizeTarget, TextRect};

/// A recognized text region.
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionResult {
    /// The decoded text.
    pub text: String,
    /// The region's bounding box in source coordinates.
    pub bounding_box: TextRect,
    /// Mean per-step confidence in `[0, 1]`; NaN when no step survived
    /// blank skipping.
    pub confidence: f32,
}

/// Text recognition predictor.
pub struct TextRecognizer {
    session: Box<dyn InferenceSession>,
    config: RecognitionConfig,
    dictionary: Vec<String>,
}

impl std::fmt::Debug for TextRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRecognizer")
            .field("config", &self.config)
            .field("dictionary", &self.dictionary)
            .finish_non_exhaustive()
    }
}

impl TextRecognizer {
    /// Creates a recognizer from a loaded session, a validated config, and
    /// the character dictionary (index 0 is the CTC blank).
    pub fn new(
        session: Box<dyn InferenceSession>,
        config: RecognitionConfig,
        dictionary: Vec<String>,
    ) -> OcrResult<Self> {
        config.validate()?;
        if dictionary.is_empty() {
            return Err(OcrError::missing_field(
                "characters_dictionary",
                "recognition config",
            ));
        }
        Ok(Self {
            session,
            config,
            dictionary,
        })
    }

    /// The recognizer's configuration.
    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    /// Recognizes text in each box, returning results in reading order.
    ///
    /// Zero-area boxes are dropped. A missing output tensor is fatal and
    /// names both the expected output and the outputs the model actually
    /// produced.
    pub fn run(
        &mut self,
        image: &ImageBuffer,
        boxes: &[TextRect],
    ) -> OcrResult<Vec<RecognitionResult>> {
        let mut results = Vec::with_capacity(boxes.len());

        for rect in boxes {
            if !rect.is_valid() {
                tracing::debug!(?rect, "skipping zero-area detection box");
                continue;
            }

            let crop = image.crop(rect.x, rect.y, rect.width, rect.height)?;
            let resized = crop.resize(ResizeTarget::height(self.config.image_height))?;

            let mean = self.config.mean.map(|m| m * 255.0);
            let norm = self.config.std_deviation.map(|s| 1.0 / (s * 255.0));
            let tensor = resized.tensor(&mean, &norm);
            let input = Array4::from_shape_vec(
                (
                    1,
                    3,
                    resized.height() as usize,
                    resized.width() as usize,
                ),
                tensor,
            )?;

            let outputs = self.session.run(input)?;
            let output_name = self
                .session
                .output_names()
                .first()
                .map(String::as_str)
                .unwrap_or(FALLBACK_OUTPUT_NAME)
                .to_string();

            let Some(logits) = outputs.get(&output_name) else {
                let mut available: Vec<String> = outputs.keys().cloned().collect();
                available.sort();
                return Err(OcrError::MissingOutput {
                    model: "recognition".to_string(),
                    expected: output_name,
                    available,
                });
            };

            let logits = logits.view().into_dimensionality::<Ix3>().map_err(|_| {
                OcrError::processing(
                    ProcessingStage::PostProcessing,
                    format!(
                        "recognition output must be [1, T, C], got shape {:?}",
                        outputs[&output_name].shape()
                    ),
                )
            })?;

            let (text, confidence) =
                ctc_greedy_decode(logits.index_axis(Axis(0), 0), &self.dictionary);
            tracing::debug!(?rect, steps = logits.shape()[1], text = %text, "decoded region");

            results.push(RecognitionResult {
                text,
                bounding_box: *rect,
                confidence,
            });
        }

        results.sort_by(|a, b| reading_order(&a.bounding_box, &b.bounding_box));
        Ok(results)
    }
}

/// Greedily decodes `[T, C]` CTC scores against a dictionary whose index 0
/// is the blank.
///
/// Steps whose argmax is the blank are skipped; surviving steps emit
/// `dictionary[argmax]` as-is (repeats are not collapsed). The confidence is
/// the arithmetic mean of the surviving steps' max scores, NaN when every
/// step was blank.
pub fn ctc_greedy_decode(scores: ndarray::ArrayView2<'_, f32>, dictionary: &[String]) -> (String, f32) {
    let mut text = String::new();
    let mut score_sum = 0.0f32;
    let mut emitted = 0usize;

    for step in scores.outer_iter() {
        let mut best_index = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for (index, &score) in step.iter().enumerate() {
            if score > best_score {
                best_index = index;
                best_score = score;
            }
        }

        if best_index == 0 {
            continue;
        }
        if let Some(glyph) = dictionary.get(best_index) {
            text.push_str(glyph);
            score_sum += best_score;
            emitted += 1;
        }
    }

    let confidence = score_sum / emitted as f32;
    (text, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inference::{Tensor4D, TensorMap};
    use ndarray::Array2;

    fn dict() -> Vec<String> {
        ["<blank>", "a", "b", "c"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn scores(rows: &[[f32; 4]]) -> Array2<f32> {
        let mut data = Vec::new();
        for row in rows {
            data.extend_from_slice(row);
        }
        Array2::from_shape_vec((rows.len(), 4), data).unwrap()
    }

    #[test]
    fn test_ctc_decode_all_blank_is_empty_with_nan_confidence() {
        let logits = scores(&[[0.9, 0.0, 0.0, 0.1], [0.8, 0.1, 0.0, 0.0]]);
        let (text, confidence) = ctc_greedy_decode(logits.view(), &dict());
        assert!(text.is_empty());
        assert!(confidence.is_nan());
    }

    #[test]
    fn test_ctc_decode_constant_class_repeats_uncollapsed() {
        let logits = scores(&[
            [0.0, 0.8, 0.1, 0.1],
            [0.0, 0.6, 0.2, 0.2],
            [0.0, 0.7, 0.1, 0.2],
        ]);
        let (text, confidence) = ctc_greedy_decode(logits.view(), &dict());
        assert_eq!(text, "aaa");
        assert!((confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_ctc_decode_skips_blanks_between_glyphs() {
        let logits = scores(&[
            [0.1, 0.8, 0.0, 0.1],
            [0.9, 0.0, 0.0, 0.1],
            [0.0, 0.1, 0.2, 0.7],
        ]);
        let (text, confidence) = ctc_greedy_decode(logits.view(), &dict());
        assert_eq!(text, "ac");
        assert!((confidence - 0.75).abs() < 1e-6);
    }

    /// Session stub that replays a fixed score row per call.
    struct ScriptedSession {
        names: Vec<String>,
        rows: Vec<Vec<[f32; 4]>>,
        calls: usize,
    }

    impl InferenceSession for ScriptedSession {
        fn output_names(&self) -> &[String] {
            &self.names
        }

        fn run(&mut self, _input: Tensor4D) -> OcrResult<TensorMap> {
            let rows = self.rows[self.calls.min(self.rows.len() - 1)].clone();
            self.calls += 1;
            let steps = rows.len();
            let mut data = Vec::new();
            for row in rows {
                data.extend_from_slice(&row);
            }
            let logits = ndarray::ArrayD::from_shape_vec(vec![1, steps, 4], data).unwrap();
            let mut outputs = TensorMap::new();
            outputs.insert(self.names[0].clone(), logits);
            Ok(outputs)
        }
    }

    fn gray_image(width: u32, height: u32) -> ImageBuffer {
        ImageBuffer::new(width, height, 1, vec![128; (width * height) as usize]).unwrap()
    }

    #[test]
    fn test_recognizer_orders_results_and_drops_empty_boxes() {
        let session = ScriptedSession {
            names: vec!["softmax_0.tmp_0".to_string()],
            rows: vec![
                vec![[0.0, 0.9, 0.0, 0.1]], // "a" for the first processed box
                vec![[0.0, 0.1, 0.9, 0.0]], // "b" for the second
            ],
            calls: 0,
        };
        let mut recognizer =
            TextRecognizer::new(Box::new(session), RecognitionConfig::default(), dict()).unwrap();

        let image = gray_image(200, 100);
        let boxes = [
            TextRect::new(120, 11, 60, 20), // same line, further right
            TextRect::new(0, 0, 0, 10),     // dropped: zero width
            TextRect::new(10, 10, 60, 20),
        ];
        let results = recognizer.run(&image, &boxes).unwrap();

        assert_eq!(results.len(), 2);
        // Reading order puts the left box first even though it was second in.
        assert_eq!(results[0].bounding_box.x, 10);
        assert_eq!(results[0].text, "b");
        assert_eq!(results[1].bounding_box.x, 120);
        assert_eq!(results[1].text, "a");
        assert!((results[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_recognizer_missing_output_is_fatal() {
        struct Empty {
            names: Vec<String>,
        }
        impl InferenceSession for Empty {
            fn output_names(&self) -> &[String] {
                &self.names
            }
            fn run(&mut self, _input: Tensor4D) -> OcrResult<TensorMap> {
                Ok(TensorMap::new())
            }
        }

        let session = Empty {
            names: vec!["softmax_0.tmp_0".to_string()],
        };
        let mut recognizer =
            TextRecognizer::new(Box::new(session), RecognitionConfig::default(), dict()).unwrap();
        let err = recognizer
            .run(&gray_image(64, 64), &[TextRect::new(0, 0, 32, 32)])
            .unwrap_err();
        assert!(matches!(err, OcrError::MissingOutput { .. }));
        assert!(err.to_string().contains("softmax_0.tmp_0"));
    }

    #[test]
    fn test_recognizer_requires_dictionary() {
        let session = ScriptedSession {
            names: vec!["x".to_string()],
            rows: vec![vec![[0.0; 4]]],
            calls: 0,
        };
        let err = TextRecognizer::new(Box::new(session), RecognitionConfig::default(), Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("characters_dictionary"));
    }
}
