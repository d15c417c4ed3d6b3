//! Error types for order maintenance and relation parsing.

/// Errors returned by [`RelationGraph`](crate::RelationGraph) and [`Sequence`](crate::Sequence).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    /// Applying the relation would close a cycle. The graph is unchanged.
    #[error("relational conflict: cannot rank {greater:?} above {lesser:?}")]
    RelationalConflict { greater: String, lesser: String },

    /// A node or link could not be allocated.
    #[error("out of memory")]
    OutOfMemory,

    /// Reported by `check_consistency` when the structure is broken.
    #[error("inconsistent graph: {0}")]
    Inconsistent(String),
}

impl OrderError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, OrderError::RelationalConflict { .. })
    }
}

impl From<std::collections::TryReserveError> for OrderError {
    fn from(_: std::collections::TryReserveError) -> Self {
        OrderError::OutOfMemory
    }
}

/// A line of relation input that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected `<left> <op> <right>`, missing {0}")]
    MissingField(&'static str),

    #[error("unexpected trailing input {0:?}")]
    TrailingInput(String),

    #[error("{0:?} is not a valid comparison")]
    InvalidOperator(String),
}
