//! Error types for the spectral modeling engine

use std::fmt;

/// Errors that can occur during spectral analysis or resynthesis
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Invalid input samples (empty where data is required, NaN/Inf, ...)
    InvalidInput(String),

    /// Configuration outside the documented preconditions
    InvalidConfig(String),

    /// Processing error during analysis
    ProcessingError(String),

    /// Numerical error (non-finite spectrum, degenerate interpolation, etc.)
    NumericalError(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            AnalysisError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}
