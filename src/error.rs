//! Error types for SmoothFlow operations.
//!
//! Configuration problems are reported eagerly, before any sample is drawn.
//! Classifier failures are carried through untouched as the error source.
//! Abstention is never an error; see [`crate::smooth::Prediction`].

use std::fmt;

/// Boxed error produced by an external classifier.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for SmoothFlow operations.
///
/// # Examples
///
/// ```
/// use smoothflow::error::SmoothFlowError;
///
/// let err = SmoothFlowError::InvalidHyperparameter {
///     param: "sigma".to_string(),
///     value: "-0.5".to_string(),
///     constraint: "> 0".to_string(),
/// };
/// assert!(err.to_string().contains("sigma"));
/// ```
#[derive(Debug)]
pub enum SmoothFlowError {
    /// A certification parameter is outside its valid range.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Perturbation name does not match any known kind.
    UnknownPerturbation {
        /// Name that failed to parse
        name: String,
    },

    /// The classifier failed while scoring a batch (e.g. device memory
    /// exhaustion). The classifier's own error is kept as the source.
    Inference(BoxError),

    /// Shapes disagree (classifier output rows, class count, point count).
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// I/O error while writing results or samples.
    Io(std::io::Error),

    /// Serialization/deserialization error.
    Serialization(String),

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for SmoothFlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmoothFlowError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
            SmoothFlowError::UnknownPerturbation { name } => {
                write!(f, "Unknown perturbation kind: {name}")
            }
            SmoothFlowError::Inference(e) => write!(f, "Classifier inference failed: {e}"),
            SmoothFlowError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {expected}, got {actual}")
            }
            SmoothFlowError::Io(e) => write!(f, "I/O error: {e}"),
            SmoothFlowError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            SmoothFlowError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for SmoothFlowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SmoothFlowError::Io(e) => Some(e),
            SmoothFlowError::Inference(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SmoothFlowError {
    fn from(err: std::io::Error) -> Self {
        SmoothFlowError::Io(err)
    }
}

impl From<serde_json::Error> for SmoothFlowError {
    fn from(err: serde_json::Error) -> Self {
        SmoothFlowError::Serialization(err.to_string())
    }
}

impl From<String> for SmoothFlowError {
    fn from(msg: String) -> Self {
        SmoothFlowError::Other(msg)
    }
}

impl SmoothFlowError {
    /// Create an invalid hyperparameter error.
    #[must_use]
    pub fn invalid(param: &str, value: impl fmt::Display, constraint: &str) -> Self {
        Self::InvalidHyperparameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }

    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// True for errors detected while validating configuration.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidHyperparameter { .. } | Self::UnknownPerturbation { .. }
        )
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, SmoothFlowError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug)]
    struct OutOfMemory;

    impl fmt::Display for OutOfMemory {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "CUDA out of memory")
        }
    }

    impl std::error::Error for OutOfMemory {}

    #[test]
    fn test_invalid_hyperparameter_display() {
        let err = SmoothFlowError::invalid("alpha", 1.5, "in (0, 1)");
        let msg = err.to_string();
        assert!(msg.contains("Invalid hyperparameter"));
        assert!(msg.contains("alpha"));
        assert!(msg.contains("1.5"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unknown_perturbation_display() {
        let err = SmoothFlowError::UnknownPerturbation {
            name: "rotationw".to_string(),
        };
        assert!(err.to_string().contains("rotationw"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_inference_keeps_source() {
        let err = SmoothFlowError::Inference(Box::new(OutOfMemory));
        assert!(!err.is_configuration());
        let source = err.source().expect("inference error has a source");
        assert_eq!(source.to_string(), "CUDA out of memory");
        assert!(source.downcast_ref::<OutOfMemory>().is_some());
    }

    #[test]
    fn test_dimension_mismatch_helper() {
        let err = SmoothFlowError::dimension_mismatch("classes", 40, 10);
        let msg = err.to_string();
        assert!(msg.contains("classes=40"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SmoothFlowError = io.into();
        assert!(matches!(err, SmoothFlowError::Io(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_string() {
        let err: SmoothFlowError = "plain".to_string().into();
        assert_eq!(err.to_string(), "plain");
    }
}
