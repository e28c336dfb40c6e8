//! Score post-processing for classification outputs.
//!
//! Backends either emit raw logits (which need a softmax) or already
//! normalized probabilities. Both paths share the arg-max and the 4-digit
//! rounding that keeps results stable across repeated evaluation.

/// Applies a numerically stable softmax over a score vector.
///
/// Returns a vector of the same length with values in [0, 1] summing to 1.
/// An empty input yields an empty output.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    if scores.is_empty() {
        return Vec::new();
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

/// Returns the index and value of the largest score.
///
/// Ties resolve to the earliest index. Returns `None` for an empty input.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, value)) if score <= value => {}
            _ => best = Some((i, score)),
        }
    }
    best
}

/// Rounds a value to 4 decimal digits.
pub fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

/// Rounds every value in a vector to 4 decimal digits.
pub fn round4_vec(values: &[f32]) -> Vec<f32> {
    values.iter().map(|&v| round4(v)).collect()
}
