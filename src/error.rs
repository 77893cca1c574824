use thiserror::Error;

/// Compilation failures. All of these are raised before any SQL is handed to the executor: a
/// request either compiles to a complete statement or fails with one of these, never a
/// partially-correct statement.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CompilerError {
    #[error("can't find a relationship named {relationship} for type {entity}")]
    UnresolvableRelationship {
        entity: String,
        relationship: String,
    },

    #[error("root selection is neither a single entity nor a collection of a known type")]
    UnresolvableRootShape,

    #[error("unsupported ordering expression on relationship {relationship}: {expression}")]
    UnsupportedOrderingExpression {
        relationship: String,
        expression: String,
    },

    #[error("unknown relationship kind at {path}")]
    UnknownRelationshipKind { path: String },

    #[error("include path {path} traverses a relationship that cannot be side-loaded")]
    UnsupportedIncludePath { path: String },

    #[error("unknown entity type {name}")]
    UnknownEntityType { name: String },

    #[error("no serializer registered for type {name}")]
    UnknownSerializerType { name: String },
}
