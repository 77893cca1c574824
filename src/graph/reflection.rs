use std::fmt;

use crate::error::CompilerError;
use crate::schema::entity::EntityType;
use crate::schema::relationship::{DefaultOrdering, RelationSupplier, RelationshipKind};
use crate::serializer::{config::RelationshipConfig, SerializerType};

/// A relationship resolved against both the schema and the serializer: everything the
/// compiler needs to shape the relationship's `data` member, its lateral sub-select, and its
/// include CTE.
#[derive(Clone)]
pub struct ResolvedRelationship {
    /// The public name the serializer exposes (the alias, when one is declared)
    pub name: String,
    /// `None` only for a virtual relationship declared without a cardinality
    pub kind: Option<RelationshipKind>,
    pub target_type: String,
    /// `None` for virtual relationships, which correlate through their supplied query
    pub foreign_key: Option<String>,
    pub default_ordering: Option<DefaultOrdering>,
    pub config: RelationshipConfig,
    pub custom_query: Option<RelationSupplier>,
}

impl fmt::Debug for ResolvedRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedRelationship")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("target_type", &self.target_type)
            .field("foreign_key", &self.foreign_key)
            .finish_non_exhaustive()
    }
}

/// Resolve a public relationship name for one entity: (1) a schema relationship under the
/// exact name, (2) a schema relationship under the name the serializer aliases it to, (3) a
/// virtual relationship (exact name, then alias). An alias never shadows a schema
/// relationship declared under the same name.
pub fn resolve(
    entity: &EntityType,
    serializer: &SerializerType,
    name: &str,
) -> Result<ResolvedRelationship, CompilerError> {
    let config = serializer.relationship_config(name);
    let aliased = serializer.aliases.get(name).map(String::as_str);

    let schema = entity
        .relationships
        .get(name)
        .or_else(|| aliased.and_then(|schema_name| entity.relationships.get(schema_name)));
    if let Some(schema) = schema {
        return Ok(ResolvedRelationship {
            name: name.to_string(),
            kind: Some(schema.kind),
            target_type: schema.target_type.clone(),
            foreign_key: Some(schema.foreign_key.clone()),
            default_ordering: schema.default_ordering.clone(),
            config,
            custom_query: None,
        });
    }

    let virtual_rel = entity.virtual_relationships.get(name).or_else(|| {
        aliased.and_then(|schema_name| entity.virtual_relationships.get(schema_name))
    });
    if let Some(virtual_rel) = virtual_rel {
        return Ok(ResolvedRelationship {
            name: name.to_string(),
            kind: virtual_rel.kind,
            target_type: virtual_rel.target_type.clone(),
            foreign_key: None,
            default_ordering: None,
            config,
            custom_query: Some(virtual_rel.query.clone()),
        });
    }

    Err(CompilerError::UnresolvableRelationship {
        entity: entity.name.clone(),
        relationship: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::relationship::{RelationSpec, RelationshipSchema, VirtualRelationship};
    use crate::sql::{predicate::Predicate, table::Table};

    fn note_entity() -> EntityType {
        EntityType::new("note", "notes", "id")
            .relationship("user", RelationshipSchema::belongs_to("user", "user_id"))
            .relationship(
                "reviewer",
                RelationshipSchema::belongs_to("user", "reviewer_id"),
            )
            .relationship("tags", RelationshipSchema::has_many("tag", "note_id"))
            .virtual_relationship(
                "recent_tags",
                VirtualRelationship::new("tag", Some(RelationshipKind::HasMany), |_parent| {
                    RelationSpec {
                        source: Table::physical("tags", Some("rel".to_string())),
                        correlation: "rel".to_string(),
                        predicate: Predicate::True,
                        order_by: None,
                    }
                }),
            )
    }

    #[test]
    fn schema_relationship() {
        let entity = note_entity();
        let serializer = SerializerType::new().relationship("tags");
        let resolved = resolve(&entity, &serializer, "tags").unwrap();
        assert_eq!(resolved.kind, Some(RelationshipKind::HasMany));
        assert_eq!(resolved.target_type, "tag");
        assert_eq!(resolved.foreign_key.as_deref(), Some("note_id"));
        assert!(resolved.custom_query.is_none());
    }

    #[test]
    fn exact_schema_name_wins_over_an_alias() {
        let entity = note_entity();
        // An alias colliding with a schema-declared name must not shadow it
        let serializer = SerializerType::new().relationship_alias("user", "reviewer");
        let resolved = resolve(&entity, &serializer, "user").unwrap();
        assert_eq!(resolved.foreign_key.as_deref(), Some("user_id"));

        let reviewer = resolve(&entity, &serializer, "reviewer").unwrap();
        assert_eq!(reviewer.foreign_key.as_deref(), Some("reviewer_id"));
    }

    #[test]
    fn aliased_relationship_keeps_public_name() {
        let entity = note_entity();
        let serializer = SerializerType::new().relationship_alias("author", "user");
        let resolved = resolve(&entity, &serializer, "author").unwrap();
        assert_eq!(resolved.name, "author");
        assert_eq!(resolved.kind, Some(RelationshipKind::BelongsTo));
        assert_eq!(resolved.foreign_key.as_deref(), Some("user_id"));
    }

    #[test]
    fn virtual_relationship() {
        let entity = note_entity();
        let serializer = SerializerType::new().relationship("recent_tags");
        let resolved = resolve(&entity, &serializer, "recent_tags").unwrap();
        assert_eq!(resolved.kind, Some(RelationshipKind::HasMany));
        assert!(resolved.foreign_key.is_none());
        assert!(resolved.custom_query.is_some());
    }

    #[test]
    fn unresolvable() {
        let entity = note_entity();
        let serializer = SerializerType::new();
        assert_eq!(
            resolve(&entity, &serializer, "owner").unwrap_err(),
            CompilerError::UnresolvableRelationship {
                entity: "note".to_string(),
                relationship: "owner".to_string(),
            }
        );
    }
}
