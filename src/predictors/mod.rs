//! Model drivers for the two PP-OCR stages.
//!
//! [`TextDetector`] turns an image into text-region boxes;
//! [`TextRecognizer`] turns an image plus boxes into text strings with
//! confidences. Both own their inference session and run strictly
//! sequentially.

pub mod text_detection;
pub mod text_recognition;

pub use text_detection::TextDetector;
pub use text_recognition::{ctc_greedy_decode, RecognitionResult, TextRecognizer};

/// Literal output name carried forward from the exported PP-OCR models,
/// used when a session declares no output names of its own.
pub(crate) const FALLBACK_OUTPUT_NAME: &str = "fetch_name_0";
