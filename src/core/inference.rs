//! The inference gateway abstraction.
//!
//! The pipeline treats the ONNX engine as an opaque operator: given a
//! float32 tensor of known shape, a session returns named float32 output
//! tensors. This module defines that contract ([`InferenceGateway`] /
//! [`InferenceSession`]) and provides [`OrtGateway`], the ONNX Runtime
//! implementation used by default. Tests substitute their own gateway.

use std::collections::HashMap;

use crate::core::config::{OptimizationLevel, SessionConfig};
use crate::core::errors::{OcrError, OcrResult};

/// 4-dimensional f32 tensor in `[N, C, H, W]` layout, the only input shape
/// the PP-OCR models take.
pub type Tensor4D = ndarray::Array4<f32>;

/// Named output tensors of a single forward pass.
pub type TensorMap = HashMap<String, ndarray::ArrayD<f32>>;

/// Input name shared by the PP-OCR detection and recognition models.
pub const MODEL_INPUT_NAME: &str = "x";

/// A loaded model that can run single-input forward passes.
///
/// Sessions are single-writer: the pipeline never issues concurrent `run`
/// calls on the same session. Resources are released on drop.
pub trait InferenceSession: Send {
    /// The output names the model declares, in declaration order.
    fn output_names(&self) -> &[String];

    /// Runs a forward pass over the input tensor (fed as `"x"`) and returns
    /// every produced output as an owned f32 tensor.
    fn run(&mut self, input: Tensor4D) -> OcrResult<TensorMap>;
}

/// Capability to materialize inference sessions from model bytes.
pub trait InferenceGateway {
    /// Creates a session from an in-memory ONNX model.
    fn load_session(&self, model: &[u8]) -> OcrResult<Box<dyn InferenceSession>>;
}

/// [`InferenceGateway`] backed by ONNX Runtime via the `ort` crate.
#[derive(Debug, Clone, Default)]
pub struct OrtGateway {
    config: SessionConfig,
}

impl OrtGateway {
    /// Creates a gateway with default session options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway with explicit session options.
    pub fn with_config(config: SessionConfig) -> Self {
        Self { config }
    }

    fn apply_session_config(
        &self,
        mut builder: ort::session::builder::SessionBuilder,
    ) -> Result<ort::session::builder::SessionBuilder, ort::Error> {
        use ort::session::builder::GraphOptimizationLevel;

        if let Some(intra) = self.config.intra_threads {
            builder = builder.with_intra_threads(intra)?;
        }
        if let Some(inter) = self.config.inter_threads {
            builder = builder.with_inter_threads(inter)?;
        }
        if let Some(parallel) = self.config.parallel_execution {
            builder = builder.with_parallel_execution(parallel)?;
        }
        if let Some(level) = self.config.optimization_level {
            let mapped = match level {
                OptimizationLevel::DisableAll => GraphOptimizationLevel::Disable,
                OptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
                OptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
                OptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
            };
            builder = builder.with_optimization_level(mapped)?;
        }
        Ok(builder)
    }
}

impl InferenceGateway for OrtGateway {
    fn load_session(&self, model: &[u8]) -> OcrResult<Box<dyn InferenceSession>> {
        let builder = self.apply_session_config(ort::session::Session::builder()?)?;
        let session = builder.commit_from_memory(model)?;

        let output_names: Vec<String> = session
            .outputs
            .iter()
            .map(|output| output.name.clone())
            .collect();

        tracing::debug!(outputs = ?output_names, "loaded ONNX session");

        Ok(Box::new(OrtSession {
            session,
            output_names,
        }))
    }
}

struct OrtSession {
    session: ort::session::Session,
    output_names: Vec<String>,
}

impl InferenceSession for OrtSession {
    fn output_names(&self) -> &[String] {
        &self.output_names
    }

    fn run(&mut self, input: Tensor4D) -> OcrResult<TensorMap> {
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs![MODEL_INPUT_NAME => input_value])?;

        let mut map = TensorMap::with_capacity(self.output_names.len());
        for name in &self.output_names {
            if let Some(value) = outputs.get(name.as_str()) {
                let tensor = value
                    .try_extract_array::<f32>()
                    .map_err(OcrError::Session)?
                    .to_owned();
                map.insert(name.clone(), tensor);
            }
        }
        Ok(map)
    }
}
