use crate::operation::OpKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unrecognized constraint type: {0}")]
    UnknownConstraintKind(String),

    #[error("malformed {kind} constraint: {reason}")]
    MalformedConstraint { kind: String, reason: String },

    #[error("no handler registered for {kind} (qualifier {qualifier})")]
    NoHandler { kind: OpKind, qualifier: String },

    #[error("handler already registered for {kind} (qualifier {qualifier})")]
    DuplicateHandler { kind: OpKind, qualifier: String },

    #[error("invalid schema object: {0}")]
    InvalidSchemaObject(String),

    #[error("operation is not reversible: {0}")]
    NotReversible(String),

    #[error("{backend} does not support {operation}")]
    Unsupported {
        backend: &'static str,
        operation: String,
    },

    #[error("handler for {expected} received {found}")]
    UnexpectedOperation { expected: OpKind, found: OpKind },

    #[error(transparent)]
    Query(#[from] sea_query::error::Error),
}
