//! Numeric processing utilities shared by the backend adapters.

pub mod normalization;
pub mod scores;

pub use normalization::NormalizeImage;
pub use scores::{argmax, round4, round4_vec, softmax};
