//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// Apart from the record lookups, every variant is a usage error: the caller
/// handed the learner something with the wrong shape or an index it was never
/// configured for.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SarsaError {
    /// Shapes of the operands of a matrix operation do not match.
    #[error("Matrix dimensions do not match, supplied {lhs:?} and {rhs:?}")]
    DimensionMismatch {
        /// Shape of the left-hand operand, `[rows, columns]`.
        lhs: [usize; 2],
        /// Shape of the right-hand operand, `[rows, columns]`.
        rhs: [usize; 2],
    },

    /// Element access outside of a matrix.
    #[error("Values out of range, requested {row},{column}, but matrix is only {rows}x{columns}")]
    OutOfRange {
        /// Requested row.
        row: usize,
        /// Requested column.
        column: usize,
        /// Rows of the matrix.
        rows: usize,
        /// Columns of the matrix.
        columns: usize,
    },

    /// A matrix literal whose rows (or columns) differ in length.
    #[error("Ragged matrix literal: line {line} has {got} elements, expected {expected}")]
    RaggedLiteral {
        /// Index of the offending row or column.
        line: usize,
        /// Its length.
        got: usize,
        /// Length of the first row or column.
        expected: usize,
    },

    /// Action index not below the configured number of outputs.
    #[error("Action {action} out of range, learner has {num_outputs} outputs")]
    ActionOutOfRange {
        /// Requested action.
        action: usize,
        /// Configured number of outputs.
        num_outputs: usize,
    },

    /// Agent index not below the configured number of agents.
    #[error("Agent {agent} out of range, learner has {num_agents} agents")]
    AgentOutOfRange {
        /// Requested agent.
        agent: usize,
        /// Configured number of agents.
        num_agents: usize,
    },

    /// Input vector of the wrong width.
    #[error("Incorrect number of inputs (given {got}, expected {expected})")]
    InputWidth {
        /// Width of the given vector.
        got: usize,
        /// Expected width.
        expected: usize,
    },

    /// Hyperparameters that cannot be used to build a learner.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Key missing from a [`Record`](crate::record::Record).
    #[error("Record key error: {0}")]
    RecordKey(String),
}

/// Result type of the fallible operations of the library.
pub type Result<T> = std::result::Result<T, SarsaError>;
