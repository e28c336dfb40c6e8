//! Image normalization for classification inference.
//!
//! Converts an RGB image into a CHW `f32` tensor with a leading batch
//! dimension of one. The per-channel affine transform is precomputed as
//! `alpha = scale / std` and `beta = -mean / std`, so each pixel costs one
//! multiply-add at normalization time.

use crate::core::errors::{RetinaError, RetinaResult};
use crate::core::tensor::Tensor4D;
use image::RgbImage;

/// Normalizes RGB images into model input tensors.
#[derive(Debug, Clone)]
pub struct NormalizeImage {
    /// Scaling factors for each channel (alpha = scale / std).
    alpha: [f32; 3],
    /// Offset values for each channel (beta = -mean / std).
    beta: [f32; 3],
}

impl NormalizeImage {
    /// Creates a normalizer from scale, per-channel mean and standard deviation.
    ///
    /// # Arguments
    ///
    /// * `scale` - Scaling factor applied to raw pixel values (typically 1/255)
    /// * `mean` - Per-channel mean in RGB order
    /// * `std` - Per-channel standard deviation in RGB order
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the scale is not positive or any
    /// standard deviation is not positive.
    pub fn new(scale: f32, mean: [f32; 3], std: [f32; 3]) -> RetinaResult<Self> {
        if scale <= 0.0 {
            return Err(RetinaError::config("scale must be greater than 0"));
        }
        for (i, &s) in std.iter().enumerate() {
            if s <= 0.0 {
                return Err(RetinaError::config(format!(
                    "standard deviation at index {i} must be greater than 0, got {s}"
                )));
            }
        }

        Ok(Self::from_constants(scale, mean, std))
    }

    /// Builds the affine transform from known-good constants.
    fn from_constants(scale: f32, mean: [f32; 3], std: [f32; 3]) -> Self {
        let mut alpha = [0.0f32; 3];
        let mut beta = [0.0f32; 3];
        for c in 0..3 {
            alpha[c] = scale / std[c];
            beta[c] = -mean[c] / std[c];
        }
        Self { alpha, beta }
    }

    /// Creates a normalizer with the ImageNet reference constants.
    ///
    /// Scale 1/255, mean [0.485, 0.456, 0.406], std [0.229, 0.224, 0.225].
    /// This is what the array-input backends were trained with.
    pub fn imagenet() -> Self {
        Self::from_constants(1.0 / 255.0, [0.485, 0.456, 0.406], [0.229, 0.224, 0.225])
    }

    /// Creates a normalizer that only scales pixels into [0, 1].
    ///
    /// Image-input backends apply their own statistics internally and expect
    /// plain scaled pixels.
    pub fn scale_only() -> Self {
        Self::from_constants(1.0 / 255.0, [0.0, 0.0, 0.0], [1.0, 1.0, 1.0])
    }

    /// Normalizes a single image into a (1, 3, H, W) tensor.
    pub fn normalize_to(&self, img: &RgbImage) -> RetinaResult<Tensor4D> {
        let (width, height) = img.dimensions();
        let (w, h) = (width as usize, height as usize);
        let mut result = vec![0.0f32; 3 * h * w];

        for c in 0..3 {
            for y in 0..h {
                for x in 0..w {
                    let pixel = img.get_pixel(x as u32, y as u32);
                    let channel_value = pixel[c] as f32;
                    result[c * h * w + y * w + x] =
                        channel_value * self.alpha[c] + self.beta[c];
                }
            }
        }

        ndarray::Array4::from_shape_vec((1, 3, h, w), result).map_err(RetinaError::Tensor)
    }
}
