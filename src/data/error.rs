use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a whole pipeline operation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The source could not be read or parsed. No partial table is produced.
    #[error("failed to load {}: {reason}", path.display())]
    Source { path: PathBuf, reason: String },

    /// An operation referenced a field that is not part of the table schema.
    #[error("{operation}: unknown field '{field}'")]
    Schema {
        field: String,
        operation: &'static str,
    },
}

/// Why a derived value could not be computed for one record.
///
/// Never escapes the pipeline: the affected cell is stored as `Null`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputationError {
    #[error("field '{0}' is missing")]
    Missing(String),
    #[error("field '{0}' is not numeric")]
    NotNumeric(String),
    #[error("division by zero")]
    DivideByZero,
    #[error("result is not finite")]
    NonFinite,
}
