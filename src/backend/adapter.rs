//! Uniform capability wrappers around heterogeneous backends.
//!
//! Backends differ in calling convention but share one capability: score a
//! preprocessed input over the five severity classes. The trait below is the
//! only surface the executor sees; the two implementations cover the two
//! native conventions in the roster.

use crate::core::errors::{RetinaError, RetinaResult, SimpleError};
use crate::core::inference::OrtInfer;
use crate::domain::NUM_CLASSES;
use crate::preprocess::PreprocessedInput;
use crate::processors::{NormalizeImage, argmax, round4, round4_vec, softmax};

/// Raw classification output of a single backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    /// Index of the top-1 class.
    pub class_index: usize,
    /// Probability of the top-1 class, rounded to 4 decimal digits.
    pub confidence: f32,
    /// Full probability vector over the five classes, rounded to 4 digits.
    pub probabilities: Vec<f32>,
}

/// The one capability every backend exposes.
///
/// Implementations are read-only after construction; a handle may be shared
/// and invoked from multiple threads.
pub trait ClassifierBackend: Send + Sync + std::fmt::Debug {
    /// Classifies a preprocessed input over the five severity classes.
    fn classify(&self, input: &PreprocessedInput) -> RetinaResult<RawPrediction>;
}

fn class_row(inference: &OrtInfer, scores: crate::core::Tensor2D) -> RetinaResult<Vec<f32>> {
    let row: Vec<f32> = scores.row(0).to_vec();
    if row.len() != NUM_CLASSES {
        return Err(RetinaError::inference(
            inference.model_name(),
            format!(
                "expected {NUM_CLASSES} class scores, got {}",
                row.len()
            ),
            SimpleError::new("class count mismatch"),
        ));
    }
    Ok(row)
}

fn top1(inference: &OrtInfer, probabilities: &[f32]) -> RetinaResult<(usize, f32)> {
    argmax(probabilities).ok_or_else(|| {
        RetinaError::inference(
            inference.model_name(),
            "empty probability vector",
            SimpleError::new("no classes to rank"),
        )
    })
}

/// Adapter for backends that consume the normalized tensor.
///
/// The exported graphs emit raw logits; the adapter applies a softmax and
/// takes the arg-max as the predicted class.
#[derive(Debug)]
pub struct ArrayClassifier {
    inference: OrtInfer,
}

impl ArrayClassifier {
    /// Wraps a loaded session as an array-input backend.
    pub fn new(inference: OrtInfer) -> Self {
        Self { inference }
    }
}

impl ClassifierBackend for ArrayClassifier {
    fn classify(&self, input: &PreprocessedInput) -> RetinaResult<RawPrediction> {
        let scores = self.inference.infer_2d(&input.tensor)?;
        let logits = class_row(&self.inference, scores)?;
        let probabilities = softmax(&logits);
        let (class_index, confidence) = top1(&self.inference, &probabilities)?;

        Ok(RawPrediction {
            class_index,
            confidence: round4(confidence),
            probabilities: round4_vec(&probabilities),
        })
    }
}

/// Adapter for backends that consume the resized image directly.
///
/// The session embeds its own preprocessing statistics and already emits a
/// normalized probability vector, so the adapter only scales pixels into
/// [0, 1] and reads the top-1 from the output as-is.
#[derive(Debug)]
pub struct ImageClassifier {
    inference: OrtInfer,
    scaler: NormalizeImage,
}

impl ImageClassifier {
    /// Wraps a loaded session as an image-input backend.
    pub fn new(inference: OrtInfer) -> Self {
        Self {
            inference,
            scaler: NormalizeImage::scale_only(),
        }
    }
}

impl ClassifierBackend for ImageClassifier {
    fn classify(&self, input: &PreprocessedInput) -> RetinaResult<RawPrediction> {
        let tensor = self.scaler.normalize_to(&input.image)?;
        let scores = self.inference.infer_2d(&tensor)?;
        let probabilities = class_row(&self.inference, scores)?;
        let (class_index, confidence) = top1(&self.inference, &probabilities)?;

        Ok(RawPrediction {
            class_index,
            confidence: round4(confidence),
            probabilities: round4_vec(&probabilities),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_prediction_rounding_contract() {
        // The adapters promise 4-digit outputs; spot-check the helpers they use.
        let probabilities = softmax(&[2.0, 1.0, 0.5, 0.1, -1.0]);
        let rounded = round4_vec(&probabilities);
        for p in &rounded {
            assert_eq!(*p, round4(*p));
        }
        let (idx, _) = argmax(&rounded).unwrap();
        assert_eq!(idx, 0);
    }
}
