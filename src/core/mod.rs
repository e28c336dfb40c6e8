//! Core building blocks for the inference orchestrator.
//!
//! This module contains the fundamental pieces shared by the rest of the
//! crate:
//! - Error handling
//! - Tensor type aliases
//! - The ONNX Runtime session wrapper used by the backend adapters

pub mod errors;
pub mod inference;
pub mod tensor;

pub use errors::{RetinaError, RetinaResult};
pub use inference::OrtInfer;
pub use tensor::{Tensor2D, Tensor4D};
