//! Errors raised by the symbolic kernel: parsing, numeric evaluation and
//! symbolic linear algebra.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SymbolicError {
    /// The input string is not a valid expression.
    #[error("cannot parse `{input}`: {reason}")]
    Parse { input: String, reason: String },
    /// A symbol had no value bound to it during numeric evaluation.
    #[error("symbol `{0}` has no value bound to it")]
    UnboundSymbol(String),
    /// Gaussian elimination found no structurally non-zero pivot in a column.
    #[error("symbolic linear system is singular in column {column}")]
    SingularSystem { column: usize },
    /// Matrix and right-hand side sizes do not agree.
    #[error("linear system shape mismatch: {rows} rows, {rhs} right-hand-side entries")]
    ShapeMismatch { rows: usize, rhs: usize },
}
