//! Loading backends from their checkpoints.
//!
//! The registry drives the load pass but never touches ONNX directly; it
//! goes through [`BackendLoader`] so lifecycle semantics can be tested with
//! stub backends and no weight files on disk.

use crate::backend::adapter::{ArrayClassifier, ClassifierBackend, ImageClassifier};
use crate::backend::{BackendSpec, InputKind};
use crate::core::errors::{RetinaError, RetinaResult, SimpleError};
use crate::core::inference::OrtInfer;

/// Instantiates a ready-to-invoke backend from its spec.
pub trait BackendLoader: Send + Sync {
    /// Loads the backend described by `spec`.
    ///
    /// Called by the registry once per roster entry, on the loader thread.
    /// Any error is isolated to this backend: the registry logs it and moves
    /// on to the next spec.
    fn load(&self, spec: &BackendSpec) -> RetinaResult<Box<dyn ClassifierBackend>>;
}

/// The production loader: builds an ONNX Runtime session per backend and
/// wraps it in the adapter variant the architecture calls for.
#[derive(Debug, Default)]
pub struct OrtBackendLoader;

impl OrtBackendLoader {
    /// Creates a new ONNX backend loader.
    pub fn new() -> Self {
        Self
    }
}

impl BackendLoader for OrtBackendLoader {
    fn load(&self, spec: &BackendSpec) -> RetinaResult<Box<dyn ClassifierBackend>> {
        let model_file = spec.layout.resolve(&spec.weights_path);
        if !model_file.is_file() {
            return Err(RetinaError::model_load(
                &spec.name,
                format!(
                    "checkpoint entry '{}' not found",
                    model_file.display()
                ),
                SimpleError::new("missing model file in checkpoint"),
            ));
        }

        let inference = OrtInfer::from_file(&model_file, &spec.name)?;

        let backend: Box<dyn ClassifierBackend> = match spec.arch.input_kind() {
            InputKind::NormalizedArray => Box::new(ArrayClassifier::new(inference)),
            InputKind::RawImage => Box::new(ImageClassifier::new(inference)),
        };
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendArch, CheckpointLayout};

    #[test]
    fn test_load_fails_when_checkpoint_entry_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let spec = BackendSpec::new(
            "DenseNet121 + EA",
            BackendArch::DenseNet121Ea,
            dir.path(),
            CheckpointLayout::Nested {
                key: "model_state_dict".to_string(),
            },
        );

        let err = OrtBackendLoader::new().load(&spec).unwrap_err();
        assert!(matches!(err, RetinaError::ModelLoad { .. }));
        assert!(err.to_string().contains("DenseNet121 + EA"));
    }

    #[test]
    fn test_load_fails_for_corrupt_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let model_file = dir.path().join("best.onnx");
        std::fs::write(&model_file, b"not an onnx graph").unwrap();

        let spec = BackendSpec::new(
            "YOLOv8x-cls",
            BackendArch::Yolov8Cls,
            &model_file,
            CheckpointLayout::Flat,
        );

        assert!(OrtBackendLoader::new().load(&spec).is_err());
    }
}
