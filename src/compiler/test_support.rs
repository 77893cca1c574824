//! Shared fixtures for compiler tests: a small note-taking schema exercising every
//! relationship kind, enum attributes, default orderings, and a virtual relationship.

use crate::schema::{
    entity::EntityType,
    relationship::{RelationSpec, RelationshipKind, RelationshipSchema, VirtualRelationship},
    EntitySchema,
};
use crate::serializer::{SerializerSchema, SerializerType};
use crate::sql::{
    column::Column,
    order::{OrderBy, OrderByElement, Ordering},
    predicate::Predicate,
    table::Table,
};

pub(crate) fn test_schema() -> EntitySchema {
    EntitySchema::new()
        .register(
            EntityType::new("note", "notes", "id")
                .attribute("name")
                .attribute("content")
                .enum_attribute(
                    "status",
                    vec![(0, "draft"), (1, "published"), (2, "deleted")],
                )
                .relationship("user", RelationshipSchema::belongs_to("user", "user_id"))
                .relationship(
                    "reviewer",
                    RelationshipSchema::belongs_to("user", "reviewer_id"),
                )
                .relationship(
                    "tags",
                    RelationshipSchema::has_many("tag", "note_id")
                        .ordered_by(vec![("name", Ordering::Asc)]),
                )
                .relationship(
                    "comments",
                    RelationshipSchema::has_many("comment", "note_id")
                        .ordered_by_raw("created_at DESC"),
                )
                .virtual_relationship(
                    "recent_tags",
                    VirtualRelationship::new("tag", Some(RelationshipKind::HasMany), |parent| {
                        RelationSpec {
                            source: Table::physical("tags", Some("rel".to_string())),
                            correlation: "rel".to_string(),
                            predicate: Predicate::Eq(
                                Column::physical("rel", "note_id"),
                                Column::physical(parent.correlation, parent.primary_key),
                            ),
                            order_by: Some(OrderBy(vec![OrderByElement::column(
                                Some("rel".to_string()),
                                "created_at",
                                Ordering::Desc,
                            )])),
                        }
                    }),
                ),
        )
        .register(EntityType::new("tag", "tags", "id").attribute("name"))
        .register(
            EntityType::new("user", "users", "id")
                .attribute("email")
                .relationship("notes", RelationshipSchema::has_many("note", "user_id")),
        )
        .register(EntityType::new("comment", "comments", "id").attribute("body"))
}

pub(crate) fn test_serializers() -> SerializerSchema {
    SerializerSchema::new()
        .register(
            "note",
            SerializerType::new()
                .attribute("name")
                .attribute("content")
                .relationship("tags"),
        )
        .register("tag", SerializerType::new().attribute("name"))
        .register("user", SerializerType::new().attribute("email"))
        .register("comment", SerializerType::new().attribute("body"))
}

/// The fixtures with the note serializer replaced, for tests exercising serializer-level
/// behavior.
pub(crate) fn serializers_with_note(note: SerializerType) -> SerializerSchema {
    SerializerSchema::new()
        .register("note", note)
        .register("tag", SerializerType::new().attribute("name"))
        .register("user", SerializerType::new().attribute("email"))
        .register("comment", SerializerType::new().attribute("body"))
}
