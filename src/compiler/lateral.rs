//! The lateral sub-selects a row's to-many and to-one relationship members read from. Each
//! renders as `LEFT JOIN LATERAL (SELECT ... AS "j" FROM ... "rel" WHERE ...) AS
//! "rel_<cte_name>" ON TRUE`, correlating against the enclosing row.

use super::Compilation;
use crate::error::CompilerError;
use crate::graph::{node::NodeId, node::ResourceNode, reflection::ResolvedRelationship};
use crate::schema::{
    entity::EntityType,
    relationship::{DefaultOrdering, ParentRef, RelationSupplier, RelationshipKind},
};
use crate::sql::{
    column::Column,
    json_agg::JsonAgg,
    json_object::{JsonObject, JsonObjectElement},
    order::{OrderBy, OrderByElement},
    predicate::Predicate,
    select::Select,
    table::Table,
};

impl Compilation<'_> {
    /// The (alias, sub-select) pairs for one node's relationships, in relationship order.
    /// Schema belongs-to relationships are inlined from the foreign key and need no lateral;
    /// neither do relationships that carry no `data` member.
    pub(crate) fn relationship_laterals(
        &self,
        id: NodeId,
        qualifier: &str,
    ) -> Result<Vec<(String, Select)>, CompilerError> {
        let node = self.arena.node(id);
        let entity = self.schema.entity(&node.entity)?;
        let plan = &self.plans[&id];

        let mut laterals = Vec::new();
        for child_id in &plan.children {
            let child = self.arena.node(*child_id);
            let reflection = match &child.reflection {
                Some(reflection) => reflection,
                None => continue,
            };
            if !reflection.config.include_data {
                continue;
            }
            let kind = match reflection.kind {
                Some(kind) => kind,
                None => {
                    return Err(CompilerError::UnknownRelationshipKind {
                        path: child.full_path.clone(),
                    })
                }
            };

            let select = match (&reflection.custom_query, &reflection.foreign_key) {
                (Some(supplier), _) => {
                    self.virtual_lateral(child, kind, supplier, entity, qualifier)?
                }
                (None, Some(foreign_key)) => match kind {
                    RelationshipKind::BelongsTo => continue,
                    RelationshipKind::HasMany => self.foreign_key_lateral(
                        child, reflection, foreign_key, entity, qualifier, true,
                    )?,
                    RelationshipKind::HasOne => self.foreign_key_lateral(
                        child, reflection, foreign_key, entity, qualifier, false,
                    )?,
                },
                (None, None) => {
                    return Err(CompilerError::UnknownRelationshipKind {
                        path: child.full_path.clone(),
                    })
                }
            };
            laterals.push((format!("rel_{}", child.cte_name), select));
        }
        Ok(laterals)
    }

    /// A lateral over a foreign-key relationship: the target rows whose foreign key points at
    /// the enclosing row, serialized as resource identifiers. Has-many aggregates them into
    /// an array; has-one yields the identifier itself.
    fn foreign_key_lateral(
        &self,
        child: &ResourceNode,
        reflection: &ResolvedRelationship,
        foreign_key: &str,
        parent: &EntityType,
        qualifier: &str,
        aggregate: bool,
    ) -> Result<Select, CompilerError> {
        let target = self.schema.entity(&child.entity)?;
        let identifier = self.resource_identifier(&child.entity, target);

        let value = if aggregate {
            let order_by = match &reflection.default_ordering {
                Some(ordering) => {
                    Some(lateral_order_by(&child.name, ordering, &target.table_name)?)
                }
                None => None,
            };
            Column::JsonAgg(JsonAgg::new(identifier, order_by))
        } else {
            identifier
        };

        Ok(Select::new(
            Table::physical(target.table_name.clone(), Some("rel".to_string())),
            vec![Column::aliased(value, "j")],
            Predicate::Eq(
                Column::physical("rel", foreign_key),
                Column::physical(qualifier, parent.primary_key.clone()),
            ),
        ))
    }

    /// A lateral over a virtual relationship: the supplied query provides the source, the
    /// correlation predicate, and any ordering; the select list is ours.
    fn virtual_lateral(
        &self,
        child: &ResourceNode,
        kind: RelationshipKind,
        supplier: &RelationSupplier,
        parent: &EntityType,
        qualifier: &str,
    ) -> Result<Select, CompilerError> {
        let target = self.schema.entity(&child.entity)?;
        let spec = supplier(&ParentRef {
            correlation: qualifier,
            primary_key: &parent.primary_key,
        });

        let mut identifier = self.resource_identifier(&child.entity, target);
        if spec.correlation != "rel" {
            identifier = retarget_identifier(identifier, &spec.correlation);
        }

        match kind {
            RelationshipKind::HasMany => Ok(Select::new(
                spec.source,
                vec![Column::aliased(
                    Column::JsonAgg(JsonAgg::new(identifier, spec.order_by)),
                    "j",
                )],
                spec.predicate,
            )),
            RelationshipKind::HasOne | RelationshipKind::BelongsTo => {
                let mut select = Select::new(
                    spec.source,
                    vec![Column::aliased(identifier, "j")],
                    spec.predicate,
                );
                select.order_by = spec.order_by;
                Ok(select)
            }
        }
    }

    /// `jsonb_build_object('id', "rel"."<pk>"::text, 'type', '<type>')`
    fn resource_identifier(&self, entity_name: &str, target: &EntityType) -> Column {
        Column::JsonObject(JsonObject(vec![
            JsonObjectElement::new(
                "id",
                Column::text_cast(Column::physical("rel", target.primary_key.clone())),
            ),
            JsonObjectElement::new("type", Column::Constant(self.json_type(entity_name))),
        ]))
    }
}

fn retarget_identifier(identifier: Column, correlation: &str) -> Column {
    match identifier {
        Column::JsonObject(JsonObject(members)) => Column::JsonObject(JsonObject(
            members
                .into_iter()
                .map(|member| JsonObjectElement {
                    key: member.key,
                    value: retarget_identifier(member.value, correlation),
                })
                .collect(),
        )),
        Column::TextCast(inner) => {
            Column::text_cast(retarget_identifier(*inner, correlation))
        }
        Column::Physical { name, .. } => Column::physical(correlation, name),
        other => other,
    }
}

/// Re-target a relationship's default ordering into the lateral scope, where the target table
/// is only visible under the `rel` correlation. Column lists re-qualify structurally; raw
/// expressions re-qualify textually when they mention the target table by its quoted name,
/// pass through when they reference nothing qualified or quoted, and are rejected otherwise.
fn lateral_order_by(
    relationship: &str,
    ordering: &DefaultOrdering,
    target_table: &str,
) -> Result<OrderBy, CompilerError> {
    match ordering {
        DefaultOrdering::Columns(columns) => Ok(OrderBy(
            columns
                .iter()
                .map(|(name, direction)| {
                    OrderByElement::column(Some("rel".to_string()), name.clone(), *direction)
                })
                .collect(),
        )),
        DefaultOrdering::Raw(expression) => {
            let quoted_table = format!("\"{target_table}\"");
            if expression.contains(&quoted_table) {
                Ok(OrderBy(vec![OrderByElement::Raw(
                    expression.replace(&quoted_table, "\"rel\""),
                )]))
            } else if !expression.contains('"') && !expression.contains('.') {
                Ok(OrderBy(vec![OrderByElement::Raw(expression.clone())]))
            } else {
                Err(CompilerError::UnsupportedOrderingExpression {
                    relationship: relationship.to_string(),
                    expression: expression.clone(),
                })
            }
        }
    }
}
