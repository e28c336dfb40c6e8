//! # Retina Fundus
//!
//! A multi-model inference orchestrator for diabetic retinopathy screening.
//! A single fundus photograph is fanned out across a roster of independently
//! trained ONNX classification backends, and the per-backend verdicts are
//! reduced to one consensus severity verdict with a confidence score and a
//! clinical recommendation.
//!
//! ## Components
//!
//! - **Backend registry**: loads the configured roster on a background thread
//!   at startup and publishes readiness without blocking the host service.
//! - **Preprocessing**: decodes raw image bytes and produces the normalized
//!   tensor and resized image representations the adapters consume.
//! - **Inference executor**: invokes every loaded backend with per-backend
//!   failure isolation.
//! - **Consensus aggregator**: majority vote over severity tiers with a
//!   confidence average across the agreeing backends.
//!
//! ## Modules
//!
//! * [`core`] - Error handling, tensor aliases, and the ONNX session wrapper
//! * [`domain`] - Severity taxonomy and recommendation text
//! * [`backend`] - Backend specs, adapters, and the weight loader
//! * [`processors`] - Image normalization and score post-processing
//! * [`preprocess`] - Raw bytes to model input
//! * [`registry`] - Backend lifecycle management
//! * [`executor`] - Multi-backend fan-out
//! * [`consensus`] - Verdict aggregation
//! * [`pipeline`] - End-to-end facade for the serving layer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use retina_fundus::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(BackendRegistry::new());
//! let roster = default_roster(std::path::Path::new("models"));
//! registry.begin_loading(roster, Arc::new(OrtBackendLoader::new()));
//!
//! // Later, once registry.status().ready:
//! let pipeline = InferencePipeline::new(registry, Preprocessor::default());
//! let image_bytes = std::fs::read("fundus.jpg")?;
//! let response = pipeline.analyze(&image_bytes, "fundus.jpg")?;
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod consensus;
pub mod core;
pub mod domain;
pub mod executor;
pub mod pipeline;
pub mod preprocess;
pub mod processors;
pub mod registry;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use retina_fundus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backend::{BackendSpec, OrtBackendLoader, default_roster};
    pub use crate::consensus::{ConsensusResult, aggregate};
    pub use crate::core::{RetinaError, RetinaResult};
    pub use crate::domain::Severity;
    pub use crate::executor::{InferenceExecutor, SingleBackendResult};
    pub use crate::pipeline::{InferencePipeline, PredictionResponse};
    pub use crate::preprocess::Preprocessor;
    pub use crate::registry::{BackendRegistry, RegistryStatus};
}
