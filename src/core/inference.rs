//! ONNX Runtime session wrapper for classification backends.
//!
//! Every backend in the roster is exported as an ONNX graph and invoked
//! through this wrapper. The wrapper treats the graph as an opaque scoring
//! function: a 4D `f32` input tensor goes in, a `(batch, num_classes)` score
//! matrix comes out. Input and output tensor names are discovered from the
//! session metadata at load time.

use crate::core::errors::{RetinaError, RetinaResult, SimpleError};
use crate::core::tensor::{Tensor2D, Tensor4D};
use ndarray::ArrayView2;
use ort::logging::LogLevel;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use std::sync::Mutex;

/// A loaded ONNX classification session.
///
/// The session is guarded by a mutex because ONNX Runtime requires exclusive
/// access during a forward pass. The underlying weights are never mutated
/// after load, so a handle can be shared freely across threads.
pub struct OrtInfer {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    model_name: String,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OrtInfer {
    /// Creates a new session from an ONNX model file.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Path to the ONNX model file
    /// * `model_name` - Human-readable name used in error context
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be created or the model
    /// declares no input or output tensors.
    pub fn from_file(model_path: impl AsRef<Path>, model_name: &str) -> RetinaResult<Self> {
        let path = model_path.as_ref();
        let session = Session::builder()?
            .with_log_level(LogLevel::Error)?
            .commit_from_file(path)
            .map_err(|e| {
                RetinaError::model_load(
                    model_name,
                    format!("failed to create ONNX session from '{}'", path.display()),
                    e,
                )
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .ok_or_else(|| {
                RetinaError::model_load(
                    model_name,
                    "model declares no input tensors",
                    SimpleError::new("empty input list"),
                )
            })?;
        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| {
                RetinaError::model_load(
                    model_name,
                    "model declares no output tensors",
                    SimpleError::new("empty output list"),
                )
            })?;

        Ok(OrtInfer {
            session: Mutex::new(session),
            input_name,
            output_name,
            model_name: model_name.to_string(),
        })
    }

    /// Returns the model name associated with this session.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Runs a forward pass and returns the class score matrix.
    ///
    /// # Arguments
    ///
    /// * `x` - Input tensor with shape (batch, channels, height, width)
    ///
    /// # Returns
    ///
    /// A (batch_size, num_classes) score matrix. Whether the scores are raw
    /// logits or probabilities depends on the exported graph; the adapter
    /// layer decides whether to re-normalize.
    pub fn infer_2d(&self, x: &Tensor4D) -> RetinaResult<Tensor2D> {
        let batch_size = x.shape()[0];
        let input_shape = x.shape().to_vec();

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            RetinaError::inference(
                &self.model_name,
                format!("failed to convert input tensor with shape {input_shape:?}"),
                e,
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let mut session = self.session.lock().map_err(|_| {
            RetinaError::inference(
                &self.model_name,
                "failed to acquire session lock",
                SimpleError::new("poisoned session mutex"),
            )
        })?;

        let outputs = session.run(inputs).map_err(|e| {
            RetinaError::inference(
                &self.model_name,
                format!(
                    "forward pass failed with input '{}' -> output '{}'",
                    self.input_name, self.output_name
                ),
                e,
            )
        })?;

        let (output_shape, output_data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                RetinaError::inference(
                    &self.model_name,
                    format!("failed to extract output tensor '{}' as f32", self.output_name),
                    e,
                )
            })?;

        if output_shape.len() != 2 {
            return Err(RetinaError::inference(
                &self.model_name,
                format!(
                    "expected 2D output tensor, got {}D with shape {:?}",
                    output_shape.len(),
                    output_shape
                ),
                SimpleError::new("invalid output tensor dimensions"),
            ));
        }

        let num_classes = output_shape[1] as usize;
        if output_data.len() != batch_size * num_classes {
            return Err(RetinaError::InvalidInput {
                message: format!(
                    "output data size mismatch: expected {}, got {}",
                    batch_size * num_classes,
                    output_data.len()
                ),
            });
        }

        let view = ArrayView2::from_shape((batch_size, num_classes), output_data)
            .map_err(RetinaError::Tensor)?;
        Ok(view.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_fails_for_missing_model() {
        let result = OrtInfer::from_file("does_not_exist.onnx", "Missing");
        assert!(result.is_err());
    }
}
