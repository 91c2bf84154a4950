//! Aggregated OCR results.

use serde::Serialize;

use crate::predictors::RecognitionResult;

/// The line-grouped output of a `recognize` call.
#[derive(Debug, Clone, Serialize)]
pub struct OcrDocument {
    /// All recognized text, space-joined within lines and newline-joined
    /// between lines.
    pub text: String,
    /// Recognition results grouped into reading-order lines.
    pub lines: Vec<Vec<RecognitionResult>>,
    /// Arithmetic mean of the per-region confidences; NaN when `lines` is
    /// empty.
    pub confidence: f32,
}

/// Groups reading-ordered results into lines.
///
/// A result joins the current line when its vertical offset from the
/// previous result is at most half the running average of the line's box
/// heights; otherwise it starts a new line. Only adjacent offsets are
/// compared, so interleaved-column layouts may misgroup.
pub fn group_into_lines(results: &[RecognitionResult]) -> OcrDocument {
    let mut lines: Vec<Vec<RecognitionResult>> = Vec::new();
    let mut current: Vec<RecognitionResult> = Vec::new();

    for result in results {
        if let Some(previous) = current.last() {
            let average_height = current
                .iter()
                .map(|item| item.bounding_box.height as f32)
                .sum::<f32>()
                / current.len() as f32;
            let dy = (result.bounding_box.y as f32 - previous.bounding_box.y as f32).abs();
            if dy > average_height * 0.5 {
                lines.push(std::mem::take(&mut current));
            }
        }
        current.push(result.clone());
    }
    if !current.is_empty() {
        lines.push(current);
    }

    let text = lines
        .iter()
        .map(|line| {
            line.iter()
                .map(|item| item.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n");

    let confidence = results.iter().map(|item| item.confidence).sum::<f32>()
        / results.len() as f32;

    OcrDocument {
        text,
        lines,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::TextRect;

    fn result(text: &str, y: u32, height: u32, confidence: f32) -> RecognitionResult {
        RecognitionResult {
            text: text.to_string(),
            bounding_box: TextRect::new(0, y, 40, height),
            confidence,
        }
    }

    #[test]
    fn test_group_into_lines_splits_on_vertical_gap() {
        let results = [
            result("first", 10, 20, 0.9),
            result("second", 12, 20, 0.8),
            result("third", 40, 20, 0.7),
        ];
        let document = group_into_lines(&results);

        assert_eq!(document.lines.len(), 2);
        assert_eq!(document.lines[0].len(), 2);
        assert_eq!(document.lines[1].len(), 1);
        assert_eq!(document.text, "first second\nthird");
        assert!((document.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_group_into_lines_single_line() {
        let results = [result("a", 5, 10, 1.0), result("b", 7, 10, 1.0)];
        let document = group_into_lines(&results);
        assert_eq!(document.lines.len(), 1);
        assert_eq!(document.text, "a b");
    }

    #[test]
    fn test_group_into_lines_empty_input() {
        let document = group_into_lines(&[]);
        assert!(document.text.is_empty());
        assert!(document.lines.is_empty());
        assert!(document.confidence.is_nan());
    }

    #[test]
    fn test_group_uses_running_average_height() {
        // Line of short boxes (height 8): a following box 6px lower starts a
        // new line because 6 > 8 * 0.5.
        let results = [
            result("a", 10, 8, 1.0),
            result("b", 12, 8, 1.0),
            result("c", 18, 8, 1.0),
        ];
        let document = group_into_lines(&results);
        assert_eq!(document.lines.len(), 2);
        assert_eq!(document.text, "a b\nc");
    }
}
