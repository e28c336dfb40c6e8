//! Preprocessing pipeline: raw image bytes to model input.
//!
//! Runs once per request, before any backend is touched. A decode failure
//! aborts the whole request; everything downstream works on the two
//! representations produced here.

use crate::core::errors::{RetinaError, RetinaResult};
use crate::core::tensor::Tensor4D;
use crate::processors::NormalizeImage;
use image::{RgbImage, imageops::FilterType};

/// The two input representations consumed by the backend adapters.
///
/// Array-input backends take the normalized tensor; image-input backends
/// take the resized image and apply their own pixel scaling.
#[derive(Debug)]
pub struct PreprocessedInput {
    /// Channel-normalized CHW tensor with a batch dimension of one.
    pub tensor: Tensor4D,
    /// The resized RGB image.
    pub image: RgbImage,
}

/// Decodes and normalizes raw image bytes for classification.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    /// Target input shape (height, width).
    input_shape: (u32, u32),
    /// Resizing filter.
    resize_filter: FilterType,
    /// Channel normalizer for the tensor representation.
    normalizer: NormalizeImage,
}

impl Preprocessor {
    /// Creates a preprocessor with an explicit shape, filter and normalizer.
    pub fn new(
        input_shape: (u32, u32),
        resize_filter: FilterType,
        normalizer: NormalizeImage,
    ) -> Self {
        Self {
            input_shape,
            resize_filter,
            normalizer,
        }
    }

    /// Decodes raw bytes into a 3-channel RGB image.
    ///
    /// # Errors
    ///
    /// Returns [`RetinaError::ImageDecode`] for corrupt or non-image bytes.
    pub fn decode(&self, raw_bytes: &[u8]) -> RetinaResult<RgbImage> {
        let img = image::load_from_memory(raw_bytes).map_err(RetinaError::ImageDecode)?;
        Ok(img.to_rgb8())
    }

    /// Runs the full pipeline: decode, resize, normalize.
    pub fn run(&self, raw_bytes: &[u8]) -> RetinaResult<PreprocessedInput> {
        let decoded = self.decode(raw_bytes)?;
        let resized = image::imageops::resize(
            &decoded,
            self.input_shape.1,
            self.input_shape.0,
            self.resize_filter,
        );
        let tensor = self.normalizer.normalize_to(&resized)?;
        Ok(PreprocessedInput {
            tensor,
            image: resized,
        })
    }
}

impl Default for Preprocessor {
    /// 224x224 input with Lanczos3 resampling and ImageNet normalization.
    fn default() -> Self {
        Self::new((224, 224), FilterType::Lanczos3, NormalizeImage::imagenet())
    }
}
