use std::fmt;
use std::sync::Arc;

use crate::sql::{order::OrderBy, order::Ordering, predicate::Predicate, table::Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    BelongsTo,
    HasMany,
    HasOne,
}

/// The default ordering a has-many relationship inherits, either as column/direction pairs or
/// as a raw expression. Raw expressions must be re-targetable into the lateral scope the
/// compiler evaluates them in; see the compiler's ordering rewrite.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultOrdering {
    Columns(Vec<(String, Ordering)>),
    Raw(String),
}

/// A schema-declared relationship between two entity types.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipSchema {
    pub kind: RelationshipKind,
    pub target_type: String,
    /// The foreign key column: on the owning side's table for belongs-to, on the target's
    /// table for has-many/has-one.
    pub foreign_key: String,
    pub default_ordering: Option<DefaultOrdering>,
}

impl RelationshipSchema {
    pub fn belongs_to(target_type: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            kind: RelationshipKind::BelongsTo,
            target_type: target_type.into(),
            foreign_key: foreign_key.into(),
            default_ordering: None,
        }
    }

    pub fn has_many(target_type: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            kind: RelationshipKind::HasMany,
            target_type: target_type.into(),
            foreign_key: foreign_key.into(),
            default_ordering: None,
        }
    }

    pub fn has_one(target_type: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            kind: RelationshipKind::HasOne,
            target_type: target_type.into(),
            foreign_key: foreign_key.into(),
            default_ordering: None,
        }
    }

    pub fn ordered_by(mut self, columns: Vec<(&str, Ordering)>) -> Self {
        self.default_ordering = Some(DefaultOrdering::Columns(
            columns
                .into_iter()
                .map(|(name, ordering)| (name.to_string(), ordering))
                .collect(),
        ));
        self
    }

    pub fn ordered_by_raw(mut self, expression: impl Into<String>) -> Self {
        self.default_ordering = Some(DefaultOrdering::Raw(expression.into()));
        self
    }
}

/// The parent row a virtual relationship's query correlates against.
pub struct ParentRef<'a> {
    /// Correlation name under which the parent row's columns are addressable
    pub correlation: &'a str,
    pub primary_key: &'a str,
}

/// The relation a virtual relationship's supplier produces: a source to scan, the correlation
/// name under which the target rows are reachable, and a predicate tying them to the parent
/// row. The compiler wraps this in a lateral join and adds the JSON select list itself.
pub struct RelationSpec {
    pub source: Table,
    pub correlation: String,
    pub predicate: Predicate,
    pub order_by: Option<OrderBy>,
}

pub type RelationSupplier = Arc<dyn Fn(&ParentRef) -> RelationSpec + Send + Sync>;

/// A relationship backed by a composable query instead of a plain foreign-key join.
#[derive(Clone)]
pub struct VirtualRelationship {
    pub target_type: String,
    /// The declared cardinality. A virtual relationship without one cannot be compiled into a
    /// data shape and is reported as an unknown relationship kind.
    pub kind: Option<RelationshipKind>,
    pub query: RelationSupplier,
}

impl VirtualRelationship {
    pub fn new(
        target_type: impl Into<String>,
        kind: Option<RelationshipKind>,
        query: impl Fn(&ParentRef) -> RelationSpec + Send + Sync + 'static,
    ) -> Self {
        Self {
            target_type: target_type.into(),
            kind,
            query: Arc::new(query),
        }
    }
}

impl fmt::Debug for VirtualRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualRelationship")
            .field("target_type", &self.target_type)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
