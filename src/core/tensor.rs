//! Tensor type aliases used throughout the crate.

/// A 2D tensor of `f32` values (batch_size x num_classes).
pub type Tensor2D = ndarray::Array2<f32>;

/// A 4D tensor of `f32` values (batch_size x channels x height x width).
pub type Tensor4D = ndarray::Array4<f32>;
