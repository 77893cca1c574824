use indexmap::IndexMap;

use crate::serializer::SerializationContext;
use crate::sql::{order::OrderBy, predicate::Predicate, SQLParamContainer};

/// How member names and type names are rendered in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyTransform {
    /// Names pass through unchanged
    #[default]
    None,
    /// snake_case becomes dash-case, the style the JSON:API recommendations use
    Dash,
}

impl KeyTransform {
    pub fn apply(&self, name: &str) -> String {
        match self {
            KeyTransform::None => name.to_string(),
            KeyTransform::Dash => name.replace('_', "-"),
        }
    }
}

/// What the document's `data` member is compiled from.
#[derive(Debug, Clone)]
pub enum RootSource {
    /// A filtered collection of one entity type. The predicate, ordering, limit, and offset
    /// pass through to the root CTE unchanged; column references must be qualified with the
    /// entity's table name.
    Relation {
        entity: String,
        predicate: Predicate,
        order_by: Option<OrderBy>,
        limit: Option<i64>,
        offset: Option<i64>,
    },
    /// A single entity selected by primary key; `data` is one resource object or `null`
    Entity {
        entity: String,
        id: SQLParamContainer,
    },
    /// A collection selected by an explicit id list. `ids: None` compiles to an empty `data`
    /// array without touching the table. `entity: None` cannot be compiled and is rejected.
    Entities {
        entity: Option<String>,
        ids: Option<SQLParamContainer>,
    },
}

impl RootSource {
    /// Whether `data` is an array (as opposed to a single resource object)
    pub fn is_collection(&self) -> bool {
        !matches!(self, RootSource::Entity { .. })
    }

    pub(crate) fn entity_name(&self) -> Option<&str> {
        match self {
            RootSource::Relation { entity, .. } | RootSource::Entity { entity, .. } => {
                Some(entity)
            }
            RootSource::Entities { entity, .. } => entity.as_deref(),
        }
    }
}

/// One compilation request: the root selection plus the options that shape the document.
#[derive(Debug)]
pub struct Request {
    pub root: RootSource,
    /// Sparse fieldsets, keyed by public type name in its transformed spelling (plural or
    /// singular)
    pub fields: Option<IndexMap<String, Vec<String>>>,
    /// Dotted include paths, in the order the request gave them
    pub include: Vec<String>,
    pub key_transform: KeyTransform,
    pub context: SerializationContext,
}

impl Request {
    pub fn new(root: RootSource) -> Self {
        Self {
            root,
            fields: None,
            include: Vec::new(),
            key_transform: KeyTransform::default(),
            context: SerializationContext::new(),
        }
    }

    pub fn include(mut self, path: impl Into<String>) -> Self {
        self.include.push(path.into());
        self
    }

    pub fn fields(mut self, type_name: impl Into<String>, fields: Vec<&str>) -> Self {
        self.fields
            .get_or_insert_with(IndexMap::new)
            .insert(type_name.into(), fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn key_transform(mut self, key_transform: KeyTransform) -> Self {
        self.key_transform = key_transform;
        self
    }

    pub fn context(mut self, context: SerializationContext) -> Self {
        self.context = context;
        self
    }
}
