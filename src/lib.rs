//! Compile JSON:API documents into single Postgres statements.
//!
//! Given a schema of entity types, a set of serializers describing what each type exposes,
//! and a request (a root selection plus includes, sparse fieldsets, and key styling), the
//! [`DocumentCompiler`] produces one SQL statement whose result is the complete document:
//! the `data` member, every `included` resource deduplicated across include paths, and all
//! relationship linkage, assembled by Postgres with `jsonb_build_object` and `jsonb_agg`.
//! No rows travel to the application to be serialized there.
//!
//! The generated statement has a fixed skeleton: a CTE `t` with the raw root rows, a CTE
//! `t2` serializing them, one hash-named CTE per include path, a `UNION` deduplicating the
//! side-loaded resources, and a final select building the envelope. Request values enter the
//! statement only as `$n` parameters.

#[macro_use]
mod sql;

mod compiler;
mod error;
mod graph;
mod request;
mod schema;
mod serializer;

pub use compiler::{CompiledQuery, DocumentCompiler};
pub use error::CompilerError;
pub use graph::node::{NodeArena, NodeId, ResourceNode};
pub use graph::reflection::ResolvedRelationship;
pub use request::{KeyTransform, Request, RootSource};
pub use schema::entity::{AttributeType, EntityType};
pub use schema::relationship::{
    DefaultOrdering, ParentRef, RelationSpec, RelationSupplier, RelationshipKind,
    RelationshipSchema, VirtualRelationship,
};
pub use schema::EntitySchema;
pub use serializer::config::{LinkFragment, LinkTemplate, RelationshipConfig};
pub use serializer::{IncludePredicate, SerializationContext, SerializerSchema, SerializerType};
pub use sql::{
    column::Column,
    order::{OrderBy, OrderByElement, Ordering},
    predicate::Predicate,
    table::Table,
    ExpressionBuilder, SQLBuilder, SQLParam, SQLParamContainer,
};
