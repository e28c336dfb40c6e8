//! End-to-end facade for the serving layer.
//!
//! The HTTP layer hands this module raw image bytes and gets back the full
//! response body: every per-backend result, the consensus verdict, and the
//! submitted filename. Transport concerns (content-type checks, status
//! codes, retry signaling) stay on the HTTP side; it maps
//! [`RetinaError::NotReady`] and [`RetinaError::ImageDecode`] to the
//! appropriate responses.
//!
//! [`RetinaError::NotReady`]: crate::core::RetinaError::NotReady
//! [`RetinaError::ImageDecode`]: crate::core::RetinaError::ImageDecode

use crate::consensus::{ConsensusResult, aggregate};
use crate::core::errors::RetinaResult;
use crate::executor::{InferenceExecutor, SingleBackendResult};
use crate::preprocess::Preprocessor;
use crate::registry::BackendRegistry;
use serde::Serialize;
use std::sync::Arc;

/// Complete analysis response for one submitted image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    /// Per-backend results in registry order.
    pub results: Vec<SingleBackendResult>,
    /// Aggregated consensus verdict.
    pub consensus: ConsensusResult,
    /// Filename the image was submitted under.
    pub image_filename: String,
}

/// Couples the executor and the aggregator into one entry point.
#[derive(Debug)]
pub struct InferencePipeline {
    executor: InferenceExecutor,
}

impl InferencePipeline {
    /// Creates a pipeline over the given registry and preprocessor.
    pub fn new(registry: Arc<BackendRegistry>, preprocessor: Preprocessor) -> Self {
        Self {
            executor: InferenceExecutor::new(registry, preprocessor),
        }
    }

    /// Returns the underlying executor.
    pub fn executor(&self) -> &InferenceExecutor {
        &self.executor
    }

    /// Runs the full analysis: fan-out, aggregation, response assembly.
    ///
    /// # Errors
    ///
    /// Propagates the executor's request-level errors (not ready, decode
    /// failure). Per-backend failures are already data by this point.
    pub fn analyze(
        &self,
        raw_bytes: &[u8],
        image_filename: &str,
    ) -> RetinaResult<PredictionResponse> {
        let results = self.executor.predict_all(raw_bytes)?;
        let consensus = aggregate(&results);
        Ok(PredictionResponse {
            results,
            consensus,
            image_filename: image_filename.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::adapter::{ClassifierBackend, RawPrediction};
    use crate::backend::loader::BackendLoader;
    use crate::backend::{BackendArch, BackendSpec, CheckpointLayout};
    use crate::core::errors::RetinaError;
    use crate::domain::Severity;
    use crate::preprocess::PreprocessedInput;
    use std::io::Cursor;

    #[derive(Debug)]
    struct FixedBackend {
        class_index: usize,
        confidence: f32,
    }

    impl ClassifierBackend for FixedBackend {
        fn classify(&self, _input: &PreprocessedInput) -> RetinaResult<RawPrediction> {
            let mut probabilities = vec![0.0; 5];
            probabilities[self.class_index] = self.confidence;
            Ok(RawPrediction {
                class_index: self.class_index,
                confidence: self.confidence,
                probabilities,
            })
        }
    }

    struct FixedLoader;

    impl BackendLoader for FixedLoader {
        fn load(&self, spec: &BackendSpec) -> RetinaResult<Box<dyn ClassifierBackend>> {
            // Vote severity by position: first backend moderate, rest mild.
            let (class_index, confidence) = match spec.name.as_str() {
                "First" => (2, 0.9),
                _ => (1, 0.8),
            };
            Ok(Box::new(FixedBackend {
                class_index,
                confidence,
            }))
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(32, 32, image::Rgb([10, 20, 30]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn ready_pipeline(dir: &tempfile::TempDir, names: &[&str]) -> InferencePipeline {
        let roster: Vec<BackendSpec> = names
            .iter()
            .map(|name| {
                let path = dir.path().join(format!("{name}.onnx"));
                std::fs::write(&path, b"weights").unwrap();
                BackendSpec::new(*name, BackendArch::VitB16, path, CheckpointLayout::Flat)
            })
            .collect();

        let registry = Arc::new(BackendRegistry::new());
        registry
            .begin_loading(roster, Arc::new(FixedLoader))
            .unwrap()
            .join()
            .unwrap();

        InferencePipeline::new(registry, Preprocessor::default())
    }

    #[test]
    fn test_analyze_assembles_results_consensus_and_filename() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ready_pipeline(&dir, &["First", "Second", "Third"]);

        let response = pipeline.analyze(&png_bytes(), "fundus.jpg").unwrap();
        assert_eq!(response.results.len(), 3);
        assert_eq!(response.image_filename, "fundus.jpg");
        // Two mild votes beat the single moderate vote.
        assert_eq!(response.consensus.severity, Severity::Mild);
        assert_eq!(response.consensus.agreement_count, 2);
        assert_eq!(response.consensus.total_models, 3);
    }

    #[test]
    fn test_analyze_refuses_on_unloaded_registry() {
        let registry = Arc::new(BackendRegistry::new());
        let pipeline = InferencePipeline::new(registry, Preprocessor::default());

        let err = pipeline.analyze(&png_bytes(), "fundus.jpg").unwrap_err();
        assert!(matches!(err, RetinaError::NotReady { .. }));
    }

    #[test]
    fn test_response_serializes_to_the_boundary_shape() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ready_pipeline(&dir, &["First", "Second"]);

        let response = pipeline.analyze(&png_bytes(), "scan.png").unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert!(json["results"].is_array());
        assert_eq!(json["image_filename"], "scan.png");
        let consensus = &json["consensus"];
        for field in [
            "prediction",
            "severity",
            "confidence",
            "agreement_count",
            "total_models",
            "recommendation",
        ] {
            assert!(!consensus[field].is_null(), "missing field {field}");
        }
    }
}
