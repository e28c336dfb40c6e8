//! Domain types for diabetic retinopathy grading.

pub mod severity;

pub use severity::{NUM_CLASSES, Severity};
