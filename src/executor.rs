//! Multi-backend inference fan-out.
//!
//! One preprocessed input is handed to every loaded backend in registry
//! order. A backend that fails at inference time contributes an explicit
//! error-marker result instead of aborting the batch; the aggregator later
//! treats those markers as non-voting entries.
//!
//! Backend invocations are synchronous CPU-bound calls. When this crate is
//! embedded in a cooperative-scheduling host, run [`predict_all`] on a worker
//! thread so it does not starve concurrent request handling.
//!
//! [`predict_all`]: InferenceExecutor::predict_all

use crate::core::errors::{RetinaError, RetinaResult};
use crate::domain::{NUM_CLASSES, Severity};
use crate::preprocess::Preprocessor;
use crate::registry::BackendRegistry;
use serde::Serialize;
use std::sync::Arc;

/// Per-backend classification outcome for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleBackendResult {
    /// Name of the backend that produced this result.
    pub model_name: String,
    /// Predicted class label, or `"Error"` for a failed invocation.
    pub prediction: String,
    /// Top-1 confidence in [0, 1]; 0.0 for a failed invocation.
    pub confidence: f32,
    /// Severity tier of the predicted class.
    pub severity: Severity,
    /// Probability vector over the five classes; all zeros on failure.
    pub probabilities: Vec<f32>,
}

impl SingleBackendResult {
    /// Label used in place of a prediction when a backend fails.
    pub const ERROR_LABEL: &'static str = "Error";

    /// Builds the explicit error-marker entry for a failed backend.
    pub fn error_marker(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            prediction: Self::ERROR_LABEL.to_string(),
            confidence: 0.0,
            severity: Severity::None,
            probabilities: vec![0.0; NUM_CLASSES],
        }
    }

    /// Whether this entry marks a failed invocation.
    pub fn is_error(&self) -> bool {
        self.prediction == Self::ERROR_LABEL
    }
}

/// Fans a single input out across every loaded backend.
#[derive(Debug)]
pub struct InferenceExecutor {
    registry: Arc<BackendRegistry>,
    preprocessor: Preprocessor,
}

impl InferenceExecutor {
    /// Creates an executor reading from the given registry.
    pub fn new(registry: Arc<BackendRegistry>, preprocessor: Preprocessor) -> Self {
        Self {
            registry,
            preprocessor,
        }
    }

    /// Returns the registry this executor reads from.
    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    /// Classifies raw image bytes with every loaded backend.
    ///
    /// Preprocessing runs once; backends are invoked in registry order and
    /// the returned vector preserves that order, one entry per loaded
    /// backend. A per-backend failure is logged and represented as an
    /// error-marker entry.
    ///
    /// # Errors
    ///
    /// * [`RetinaError::NotReady`] if the registry has no usable backends
    ///   (still loading, or the load pass failed entirely).
    /// * [`RetinaError::ImageDecode`] if the bytes are not a decodable image.
    pub fn predict_all(&self, raw_bytes: &[u8]) -> RetinaResult<Vec<SingleBackendResult>> {
        let status = self.registry.status();
        if !status.ready {
            return Err(RetinaError::NotReady {
                loading: status.loading,
                loaded_count: status.loaded_count,
                total_count: status.total_count,
            });
        }

        let input = self.preprocessor.run(raw_bytes)?;

        let handles = self.registry.handles();
        let mut results = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            match handle.classify(&input) {
                Ok(raw) => match Severity::from_index(raw.class_index) {
                    Some(severity) => results.push(SingleBackendResult {
                        model_name: name,
                        prediction: severity.label().to_string(),
                        confidence: raw.confidence,
                        severity,
                        probabilities: raw.probabilities,
                    }),
                    None => {
                        tracing::error!(
                            backend = %name,
                            class_index = raw.class_index,
                            "backend predicted an out-of-range class"
                        );
                        results.push(SingleBackendResult::error_marker(name));
                    }
                },
                Err(err) => {
                    tracing::error!(
                        backend = %name,
                        error = %err,
                        "backend inference failed"
                    );
                    results.push(SingleBackendResult::error_marker(name));
                }
            }
        }

        Ok(results)
    }
}
