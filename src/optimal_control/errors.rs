//! Error kinds of the transcription engine.
//!
//! None of them is retried internally: the derivation is deterministic, so the
//! caller has to change the inputs before trying again.
use crate::symbolic::symbolic_errors::SymbolicError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranscriptionError {
    /// The problem definition is incomplete or inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The requested methods cannot be used together, or a method is unknown.
    #[error("unsupported combination: {0}")]
    UnsupportedCombination(String),
    /// The stationarity condition has no usable solution.
    #[error("control law resolution failed: {0}")]
    ControlLawResolution(String),
    /// No control appeared within the allowed number of time derivatives.
    #[error("path constraint `{constraint}` does not expose a control within {max_order} time derivatives")]
    ConstraintOrderExceeded { constraint: String, max_order: usize },
    #[error("guess mapper not properly set up: bind a control law before mapping")]
    GuessMapperNotBound,
    /// Parsing or numeric evaluation failed in the symbolic kernel.
    #[error(transparent)]
    Symbolic(#[from] SymbolicError),
}

pub type TranscriptionResult<T> = Result<T, TranscriptionError>;
