//! Error types for the smoothflow CLI.

use smoothflow::SmoothFlowError;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Result type alias for CLI operations
pub(crate) type Result<T> = std::result::Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug)]
pub(crate) enum CliError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Input file could not be parsed
    #[error("Invalid input in {path}: {message}")]
    InvalidInput {
        /// Offending file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Bad configuration (sigma, sample counts, chunking, perturbation name)
    #[error("Invalid configuration: {0}")]
    Config(SmoothFlowError),

    /// Classifier failed during certification
    #[error("Inference failed: {0}")]
    Inference(SmoothFlowError),

    /// Any other library error
    #[error("SmoothFlow error: {0}")]
    SmoothFlow(SmoothFlowError),
}

impl CliError {
    /// Get exit code for this error
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileNotFound(_) => ExitCode::from(3),
            Self::InvalidInput { .. } => ExitCode::from(4),
            Self::Config(_) => ExitCode::from(5),
            Self::Io(_) | Self::Csv(_) => ExitCode::from(7),
            Self::Inference(_) => ExitCode::from(8),
            Self::SmoothFlow(_) => ExitCode::from(1),
        }
    }
}

impl From<SmoothFlowError> for CliError {
    fn from(e: SmoothFlowError) -> Self {
        if e.is_configuration() {
            Self::Config(e)
        } else if matches!(e, SmoothFlowError::Inference(_)) {
            Self::Inference(e)
        } else {
            Self::SmoothFlow(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_errors_are_classified() {
        let config: CliError = SmoothFlowError::invalid("sigma", -1.0, "> 0").into();
        assert!(matches!(config, CliError::Config(_)));
        assert_eq!(config.exit_code(), ExitCode::from(5));

        let inference: CliError = SmoothFlowError::Inference("oom".into()).into();
        assert!(matches!(inference, CliError::Inference(_)));
        assert_eq!(inference.exit_code(), ExitCode::from(8));

        let other: CliError = SmoothFlowError::Other("x".to_string()).into();
        assert_eq!(other.exit_code(), ExitCode::from(1));
    }

    #[test]
    fn test_display() {
        let err = CliError::FileNotFound(PathBuf::from("data.json"));
        assert_eq!(err.to_string(), "File not found: data.json");
    }
}
