use thiserror::Error as ThisError;

///
/// ModelError
///
/// Registration and lookup failures on the model surface. All variants
/// are fatal to the operation that raised them; none is retried.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ModelError {
    #[error("unknown root entity type '{name}'")]
    UnknownRootEntity { name: String },

    #[error("unknown relation '{name}'")]
    UnknownRelation { name: String },

    #[error("root entity type '{name}' is already registered")]
    DuplicateRootEntity { name: String },

    #[error("relation '{name}' is already registered")]
    DuplicateRelation { name: String },

    #[error("collection name '{name}' is not a safe identifier")]
    InvalidCollectionName { name: String },
}
