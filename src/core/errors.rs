//! Error types for the inference orchestrator.
//!
//! This module defines the error enum shared by the loader, the executor and
//! the preprocessing pipeline, together with helper constructors for errors
//! that carry per-model context.
//!
//! Failures that are local to a single backend are absorbed by the loader and
//! executor loops and converted to data (skipped backends, error-marker
//! results); only failures that make the whole request meaningless (decode
//! failure, registry not ready) surface through these types to the caller.

use thiserror::Error;

/// Convenient result alias for orchestrator operations.
pub type RetinaResult<T> = Result<T, RetinaError>;

/// Errors that can occur while loading backends or running inference.
#[derive(Error, Debug)]
pub enum RetinaError {
    /// The submitted bytes could not be decoded as an image.
    #[error("image decode")]
    ImageDecode(#[source] image::ImageError),

    /// A backend checkpoint could not be loaded.
    #[error("model load for '{model_name}': {context}")]
    ModelLoad {
        /// Name of the backend whose checkpoint failed to load.
        model_name: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A backend raised an error during a `classify` call.
    #[error("inference for '{model_name}': {context}")]
    Inference {
        /// Name of the backend that failed.
        model_name: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The registry has no usable backends for this request.
    #[error(
        "backends not ready (loading: {loading}, loaded: {loaded_count}/{total_count})"
    )]
    NotReady {
        /// Whether a load pass is still in progress.
        loading: bool,
        /// Number of backends loaded so far.
        loaded_count: usize,
        /// Number of backends configured in the roster.
        total_count: usize,
    },

    /// A configuration value is invalid.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// An input value is invalid.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl RetinaError {
    /// Creates a model load error with per-backend context.
    pub fn model_load(
        model_name: impl Into<String>,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RetinaError::ModelLoad {
            model_name: model_name.into(),
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates an inference error with per-backend context.
    pub fn inference(
        model_name: impl Into<String>,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RetinaError::Inference {
            model_name: model_name.into(),
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates a configuration error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        RetinaError::ConfigError {
            message: message.into(),
        }
    }
}

/// A minimal error wrapper for cases where only a message is available.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    /// Creates a new SimpleError with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
