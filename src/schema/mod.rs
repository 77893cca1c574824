pub mod entity;
pub mod relationship;

use indexmap::IndexMap;

use crate::error::CompilerError;
use entity::EntityType;

/// The registry of entity types, populated once at startup and then only read. Lookup is by
/// the singular entity name.
#[derive(Debug, Default)]
pub struct EntitySchema {
    entities: IndexMap<String, EntityType>,
}

impl EntitySchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, entity: EntityType) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    pub fn entity(&self, name: &str) -> Result<&EntityType, CompilerError> {
        self.entities
            .get(name)
            .ok_or_else(|| CompilerError::UnknownEntityType {
                name: name.to_string(),
            })
    }
}
