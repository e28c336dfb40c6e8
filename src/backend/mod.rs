//! Backend configuration: specs, architectures, checkpoint layouts, rosters.
//!
//! The roster is data, not logic: which backends get loaded is decided by a
//! list of [`BackendSpec`] values that can come from JSON or from
//! [`default_roster`]. Orchestration code never names a concrete backend.

pub mod adapter;
pub mod loader;

pub use adapter::{ArrayClassifier, ClassifierBackend, ImageClassifier, RawPrediction};
pub use loader::{BackendLoader, OrtBackendLoader};

use crate::core::errors::{RetinaError, RetinaResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Architecture identity of a backend.
///
/// Besides naming the trained architecture, this fixes which adapter variant
/// wraps the session: most backends consume the normalized tensor, the YOLO
/// classifier consumes the resized image directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendArch {
    /// DenseNet121 trunk with external attention head.
    DenseNet121Ea,
    /// EfficientNet-B0 trunk with external attention head.
    EfficientNetB0Ea,
    /// ResNet50 trunk with external attention head.
    ResNet50Ea,
    /// ViT-B/16 with a 5-class head.
    VitB16,
    /// YOLOv8x classification variant.
    Yolov8Cls,
}

/// The input representation a backend consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Channel-normalized CHW tensor.
    NormalizedArray,
    /// Resized RGB image, scaled internally by the adapter.
    RawImage,
}

impl BackendArch {
    /// Returns which input representation this architecture consumes.
    pub fn input_kind(&self) -> InputKind {
        match self {
            BackendArch::Yolov8Cls => InputKind::RawImage,
            _ => InputKind::NormalizedArray,
        }
    }
}

/// How the exported model graph is stored at the configured weights path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointLayout {
    /// The weights path is the model file itself.
    Flat,
    /// The weights path is a checkpoint directory and the model file lives
    /// under the named entry (`<path>/<key>.onnx`).
    Nested {
        /// Name of the checkpoint entry holding the model graph.
        key: String,
    },
}

impl CheckpointLayout {
    /// Resolves the concrete model file for the given weights path.
    pub fn resolve(&self, weights_path: &Path) -> PathBuf {
        match self {
            CheckpointLayout::Flat => weights_path.to_path_buf(),
            CheckpointLayout::Nested { key } => weights_path.join(format!("{key}.onnx")),
        }
    }
}

/// Immutable configuration entry for one backend in the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSpec {
    /// Unique, human-readable backend name.
    pub name: String,
    /// Architecture identity, fixing the adapter variant.
    pub arch: BackendArch,
    /// Configured weight location (file or checkpoint directory).
    pub weights_path: PathBuf,
    /// How the model graph is stored at the weights path.
    pub layout: CheckpointLayout,
}

impl BackendSpec {
    /// Creates a new backend spec.
    pub fn new(
        name: impl Into<String>,
        arch: BackendArch,
        weights_path: impl Into<PathBuf>,
        layout: CheckpointLayout,
    ) -> Self {
        Self {
            name: name.into(),
            arch,
            weights_path: weights_path.into(),
            layout,
        }
    }
}

/// Builds the five-backend roster the screening service ships with.
///
/// The externally-attended convolutional backends store their graph under a
/// `model_state_dict` checkpoint entry; the ViT and YOLO exports are flat
/// model files.
pub fn default_roster(models_dir: &Path) -> Vec<BackendSpec> {
    vec![
        BackendSpec::new(
            "DenseNet121 + EA",
            BackendArch::DenseNet121Ea,
            models_dir.join("densenet121_ea"),
            CheckpointLayout::Nested {
                key: "model_state_dict".to_string(),
            },
        ),
        BackendSpec::new(
            "EfficientNet-B0 + EA",
            BackendArch::EfficientNetB0Ea,
            models_dir.join("efficientnet_b0_ea"),
            CheckpointLayout::Nested {
                key: "model_state_dict".to_string(),
            },
        ),
        BackendSpec::new(
            "ResNet50 + EA",
            BackendArch::ResNet50Ea,
            models_dir.join("resnet50_ea"),
            CheckpointLayout::Nested {
                key: "model_state_dict".to_string(),
            },
        ),
        BackendSpec::new(
            "ViT-B/16",
            BackendArch::VitB16,
            models_dir.join("vit_b16").join("vit_b16_best.onnx"),
            CheckpointLayout::Flat,
        ),
        BackendSpec::new(
            "YOLOv8x-cls",
            BackendArch::Yolov8Cls,
            models_dir.join("yolov8x_cls").join("best.onnx"),
            CheckpointLayout::Flat,
        ),
    ]
}

/// Parses a roster from a JSON document.
///
/// # Errors
///
/// Returns a configuration error if the document does not parse, the roster
/// is empty, or two entries share a name.
pub fn roster_from_json(json: &str) -> RetinaResult<Vec<BackendSpec>> {
    let roster: Vec<BackendSpec> = serde_json::from_str(json)
        .map_err(|e| RetinaError::config(format!("invalid roster document: {e}")))?;

    if roster.is_empty() {
        return Err(RetinaError::config("roster must name at least one backend"));
    }

    let mut seen = std::collections::HashSet::new();
    for spec in &roster {
        if !seen.insert(spec.name.as_str()) {
            return Err(RetinaError::config(format!(
                "duplicate backend name '{}' in roster",
                spec.name
            )));
        }
    }

    Ok(roster)
}
