use arql_model::ModelError;
use thiserror::Error as ThisError;

///
/// CompileError
///
/// Compile-time failure taxonomy. Every variant is fatal to the current
/// compilation and surfaces to the caller with source-identifying
/// context; none is retried. Runtime errors embedded in the query (via
/// `RuntimeError` nodes) are not errors at compile time.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CompileError {
    /// A variable is referenced in a scope where it was not introduced.
    #[error("variable '{label}' used but not introduced")]
    UnboundVariable { label: String },

    /// `introduce_variable` was called twice for the same variable
    /// identity.
    #[error("variable '{label}' was introduced twice")]
    DoubleIntroduction { label: String },

    /// An operator has no lowering rule for the given operand shape.
    #[error("operator '{operator}' has no lowering rule: {reason}")]
    UnsupportedOperator { operator: String, reason: String },

    /// A collection, view, or field name fails the safety whitelist.
    #[error("identifier '{name}' is not safe to emit verbatim")]
    InvalidIdentifier { name: String },

    /// A node's structural invariants are violated.
    #[error("malformed query tree: {reason}")]
    MalformedIr { reason: String },

    /// The external cancellation token was set; all partial output has
    /// been discarded.
    #[error("compilation was cancelled")]
    Cancelled,

    /// Model metadata lookup or validation failed.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl CompileError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedIr {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_identifier(name: impl Into<String>) -> Self {
        Self::InvalidIdentifier { name: name.into() }
    }
}
