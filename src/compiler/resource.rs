//! Serializing one resource: the `jsonb_build_object` expression producing a resource
//! object's `id`, `type`, `attributes`, and `relationships` members from a single row.

use super::{Compilation, NodePlan};
use crate::error::CompilerError;
use crate::graph::{node::NodeId, node::ResourceNode, reflection::ResolvedRelationship};
use crate::schema::{
    entity::{AttributeType, EntityType},
    relationship::RelationshipKind,
};
use crate::serializer::{
    config::{LinkFragment, LinkTemplate},
    SerializerType,
};
use crate::sql::{
    case::Case,
    column::Column,
    json_object::{JsonObject, JsonObjectElement},
    predicate::Predicate,
};

impl Compilation<'_> {
    /// The resource object for one node, with `qualifier` naming the correlation the row's
    /// columns are addressable under (the entity's table name, both in `t2` and in include
    /// CTEs).
    pub(crate) fn resource_object(
        &self,
        id: NodeId,
        qualifier: &str,
    ) -> Result<Column, CompilerError> {
        let node = self.arena.node(id);
        let entity = self.schema.entity(&node.entity)?;
        let serializer = self.serializers.serializer(&node.entity)?;
        let plan = &self.plans[&id];

        let mut members = vec![
            JsonObjectElement::new(
                "id",
                Column::text_cast(Column::physical(qualifier, entity.primary_key.clone())),
            ),
            JsonObjectElement::new("type", Column::Constant(self.json_type(&node.entity))),
        ];

        let attributes = plan
            .attributes
            .iter()
            .map(|name| {
                JsonObjectElement::new(
                    self.json_key(name),
                    attribute_value(entity, serializer, qualifier, name),
                )
            })
            .collect();
        members.push(JsonObjectElement::new(
            "attributes",
            Column::JsonObject(JsonObject(attributes)),
        ));

        let relationships = self.relationship_members(plan, entity, qualifier)?;
        if !relationships.is_empty() {
            members.push(JsonObjectElement::new(
                "relationships",
                Column::JsonObject(JsonObject(relationships)),
            ));
        }

        Ok(Column::JsonObject(JsonObject(members)))
    }

    fn relationship_members(
        &self,
        plan: &NodePlan,
        entity: &EntityType,
        qualifier: &str,
    ) -> Result<Vec<JsonObjectElement>, CompilerError> {
        let mut members = Vec::new();
        for child_id in &plan.children {
            let child = self.arena.node(*child_id);
            let reflection = match &child.reflection {
                Some(reflection) => reflection,
                // The root has no reflection and is never a relationship child
                None => continue,
            };

            let mut entries = Vec::new();
            if reflection.config.include_data {
                entries.push(JsonObjectElement::new(
                    "data",
                    self.relationship_data(child, reflection, qualifier)?,
                ));
            }
            if !reflection.config.links.is_empty() {
                entries.push(JsonObjectElement::new(
                    "links",
                    relationship_links(entity, reflection, qualifier),
                ));
            }
            if entries.is_empty() {
                continue;
            }
            members.push(JsonObjectElement::new(
                self.json_key(&child.name),
                Column::JsonObject(JsonObject(entries)),
            ));
        }
        Ok(members)
    }

    /// The `data` member of one relationship. Schema belongs-to relationships are answered
    /// from the foreign key column, null-safe and without touching the target table; every
    /// other kind reads the `j` column of its lateral sub-select.
    fn relationship_data(
        &self,
        child: &ResourceNode,
        reflection: &ResolvedRelationship,
        qualifier: &str,
    ) -> Result<Column, CompilerError> {
        let kind = reflection
            .kind
            .ok_or_else(|| CompilerError::UnknownRelationshipKind {
                path: child.full_path.clone(),
            })?;

        match (&reflection.custom_query, &reflection.foreign_key) {
            (None, Some(foreign_key)) if kind == RelationshipKind::BelongsTo => {
                let identifier = Column::JsonObject(JsonObject(vec![
                    JsonObjectElement::new(
                        "id",
                        Column::text_cast(Column::physical(qualifier, foreign_key.clone())),
                    ),
                    JsonObjectElement::new(
                        "type",
                        Column::Constant(self.json_type(&child.entity)),
                    ),
                ]));
                Ok(Column::Case(Case::new(
                    vec![(
                        Predicate::IsNull(Column::physical(qualifier, foreign_key.clone())),
                        Column::Null,
                    )],
                    Some(identifier),
                )))
            }
            _ => Ok(Column::physical(format!("rel_{}", child.cte_name), "j")),
        }
    }
}

/// The expression producing one attribute's value. Computed columns win over plain columns,
/// with a schema-level definition shadowing a serializer-level override; enum columns
/// translate their stored integer into the declared label.
fn attribute_value(
    entity: &EntityType,
    serializer: &SerializerType,
    qualifier: &str,
    name: &str,
) -> Column {
    if let Some(sql) = entity
        .computed_columns
        .get(name)
        .or_else(|| serializer.sql_overrides.get(name))
    {
        return Column::Raw(sql.clone());
    }

    match entity.attributes.get(name) {
        Some(AttributeType::Enum(mapping)) => Column::Case(Case::new(
            mapping
                .iter()
                .map(|(value, label)| {
                    (
                        Predicate::Eq(
                            Column::physical(qualifier, name),
                            Column::IntLiteral(*value),
                        ),
                        Column::Constant(label.clone()),
                    )
                })
                .collect(),
            None,
        )),
        _ => Column::physical(qualifier, name),
    }
}

fn relationship_links(
    entity: &EntityType,
    reflection: &ResolvedRelationship,
    qualifier: &str,
) -> Column {
    let entries = reflection
        .config
        .links
        .iter()
        .map(|(name, template)| {
            JsonObjectElement::new(name.clone(), link_value(entity, template, qualifier))
        })
        .collect();
    Column::JsonObject(JsonObject(entries))
}

fn link_value(entity: &EntityType, template: &LinkTemplate, qualifier: &str) -> Column {
    match template.fragments.as_slice() {
        [LinkFragment::Literal(value)] => Column::Constant(value.clone()),
        fragments => Column::Concat(
            fragments
                .iter()
                .map(|fragment| match fragment {
                    LinkFragment::Literal(value) => Column::Constant(value.clone()),
                    LinkFragment::ResourceId => {
                        Column::physical(qualifier, entity.primary_key.clone())
                    }
                })
                .collect(),
        ),
    }
}
