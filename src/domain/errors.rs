use thiserror::Error;

/// Failures raised by the diff engine, the renderer and table construction.
///
/// Application entry points wrap these into `anyhow::Error` with context;
/// the core keeps them typed so callers can tell a skippable row apart from
/// a malformed snapshot.
#[derive(Debug, Error)]
pub enum DiffError {
    /// Mismatched schemas, keys or ordinals. Not recoverable locally.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A row violates its table's constraints (arity, type, duplicate key).
    /// Loaders log these and skip the row.
    #[error("cannot insert row into `{table}`: {reason}")]
    RowInsertion { table: String, reason: String },

    /// The markup writer underneath a sink failed.
    #[error("markup output failed: {0}")]
    Markup(String),
}

pub type Result<T> = std::result::Result<T, DiffError>;

impl DiffError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        DiffError::InvalidInput(msg.into())
    }

    pub(crate) fn row(table: &str, reason: impl Into<String>) -> Self {
        DiffError::RowInsertion {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}
