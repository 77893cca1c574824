use indexmap::IndexMap;

use super::relationship::{RelationshipSchema, VirtualRelationship};

/// The storage type of one attribute column.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    Plain,
    /// An enum-typed column: an ordered mapping from the stored integer to its label
    Enum(Vec<(i64, String)>),
}

/// The schema-level description of one kind of stored record: its table, primary key, typed
/// attribute columns, and relationships. Immutable once registered.
#[derive(Debug, Clone)]
pub struct EntityType {
    /// The singular, snake_case entity name, e.g. "note". The JSON:API type name is derived
    /// from it by pluralization.
    pub name: String,
    pub table_name: String,
    pub primary_key: String,
    pub attributes: IndexMap<String, AttributeType>,
    pub relationships: IndexMap<String, RelationshipSchema>,
    /// Computed columns: field name to a trusted raw SQL expression producing its value
    pub computed_columns: IndexMap<String, String>,
    /// Relationships backed by a supplied query instead of a foreign key
    pub virtual_relationships: IndexMap<String, VirtualRelationship>,
}

impl EntityType {
    pub fn new(
        name: impl Into<String>,
        table_name: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            primary_key: primary_key.into(),
            attributes: IndexMap::new(),
            relationships: IndexMap::new(),
            computed_columns: IndexMap::new(),
            virtual_relationships: IndexMap::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), AttributeType::Plain);
        self
    }

    pub fn enum_attribute(mut self, name: impl Into<String>, mapping: Vec<(i64, &str)>) -> Self {
        self.attributes.insert(
            name.into(),
            AttributeType::Enum(
                mapping
                    .into_iter()
                    .map(|(value, label)| (value, label.to_string()))
                    .collect(),
            ),
        );
        self
    }

    pub fn relationship(mut self, name: impl Into<String>, schema: RelationshipSchema) -> Self {
        self.relationships.insert(name.into(), schema);
        self
    }

    pub fn computed_column(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.computed_columns.insert(name.into(), sql.into());
        self
    }

    pub fn virtual_relationship(
        mut self,
        name: impl Into<String>,
        relationship: VirtualRelationship,
    ) -> Self {
        self.virtual_relationships.insert(name.into(), relationship);
        self
    }
}
