//! Error types of the density computation.

use crate::breaks::Dataset;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DensityError {
    /// Invalid bin size, cutoff, or chromosome table; aborts the run.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// None of the requested samples occur in the dataset.
    #[error("none of the samples {samples:?} found in {dataset} breakpoints")]
    InvalidSample {
        dataset: Dataset,
        samples: Vec<String>,
    },
    /// Malformed input row or missing column.
    #[error("malformed input {path:?}: {message}")]
    DataShape { path: String, message: String },
}

impl DensityError {
    /// Whether the error aborts the whole run rather than a single unit.
    pub fn is_fatal(&self) -> bool {
        match self {
            DensityError::Configuration(_) | DensityError::DataShape { .. } => true,
            DensityError::InvalidSample { .. } => false,
        }
    }

    /// Process exit code to use when this error ends the run.
    pub fn exit_code(&self) -> u8 {
        match self {
            DensityError::Configuration(_) => 2,
            DensityError::DataShape { .. } => 3,
            DensityError::InvalidSample { .. } => 4,
        }
    }

    pub(crate) fn data_shape<P: std::fmt::Debug, M: std::fmt::Display>(
        path: P,
        message: M,
    ) -> Self {
        DensityError::DataShape {
            path: format!("{:?}", path),
            message: message.to_string(),
        }
    }
}
