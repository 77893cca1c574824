pub mod config;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::CompilerError;
use config::RelationshipConfig;

/// Per-request ambient values that field include-predicates may consult (for example the
/// current actor). Evaluation happens once per (type, context) during compilation, never per
/// row, so predicates must not depend on row data.
#[derive(Debug, Clone, Default)]
pub struct SerializationContext {
    values: HashMap<String, serde_json::Value>,
}

impl SerializationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn value(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(serde_json::Value::Bool(true)))
    }
}

pub type IncludePredicate = Arc<dyn Fn(&SerializationContext) -> bool + Send + Sync>;

/// What a serializer exposes for one entity type: attributes and relationships in declaration
/// order, optional per-field include predicates, optional per-field SQL overrides, public
/// aliases for schema relationships, and per-relationship configuration.
#[derive(Clone, Default)]
pub struct SerializerType {
    pub attributes: Vec<String>,
    pub relationships: Vec<String>,
    include_predicates: HashMap<String, IncludePredicate>,
    pub sql_overrides: IndexMap<String, String>,
    /// Public relationship name to the schema-declared name it aliases
    pub aliases: HashMap<String, String>,
    pub relationship_configs: HashMap<String, RelationshipConfig>,
}

impl SerializerType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    /// An attribute exposed only when the predicate holds for the request's context
    pub fn attribute_if(
        mut self,
        name: impl Into<String>,
        predicate: impl Fn(&SerializationContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        self.include_predicates
            .insert(name.clone(), Arc::new(predicate));
        self.attributes.push(name);
        self
    }

    pub fn relationship(mut self, name: impl Into<String>) -> Self {
        self.relationships.push(name.into());
        self
    }

    pub fn relationship_if(
        mut self,
        name: impl Into<String>,
        predicate: impl Fn(&SerializationContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        self.include_predicates
            .insert(name.clone(), Arc::new(predicate));
        self.relationships.push(name);
        self
    }

    /// A relationship with an explicit [`RelationshipConfig`]
    pub fn relationship_with(
        mut self,
        name: impl Into<String>,
        config: RelationshipConfig,
    ) -> Self {
        let name = name.into();
        self.relationship_configs.insert(name.clone(), config);
        self.relationships.push(name);
        self
    }

    /// Expose a schema relationship under a different public name
    pub fn relationship_alias(
        mut self,
        public_name: impl Into<String>,
        schema_name: impl Into<String>,
    ) -> Self {
        let public_name = public_name.into();
        self.aliases.insert(public_name.clone(), schema_name.into());
        self.relationships.push(public_name);
        self
    }

    /// Override the SQL expression computing an attribute's value
    pub fn sql_override(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.sql_overrides.insert(name.into(), sql.into());
        self
    }

    /// Whether `field` is included for this context. Fields without a predicate are always
    /// included.
    pub fn include_field(&self, field: &str, context: &SerializationContext) -> bool {
        match self.include_predicates.get(field) {
            Some(predicate) => predicate(context),
            None => true,
        }
    }

    pub fn relationship_config(&self, name: &str) -> RelationshipConfig {
        self.relationship_configs
            .get(name)
            .cloned()
            .unwrap_or_default()
    }
}

impl fmt::Debug for SerializerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerType")
            .field("attributes", &self.attributes)
            .field("relationships", &self.relationships)
            .finish_non_exhaustive()
    }
}

/// The registry of serializers, keyed by entity name.
#[derive(Debug, Default)]
pub struct SerializerSchema {
    serializers: IndexMap<String, SerializerType>,
}

impl SerializerSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, entity_name: impl Into<String>, serializer: SerializerType) -> Self {
        self.serializers.insert(entity_name.into(), serializer);
        self
    }

    pub fn serializer(&self, entity_name: &str) -> Result<&SerializerType, CompilerError> {
        self.serializers
            .get(entity_name)
            .ok_or_else(|| CompilerError::UnknownSerializerType {
                name: entity_name.to_string(),
            })
    }
}
