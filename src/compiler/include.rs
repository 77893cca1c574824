//! Side-loading: the CTE bodies producing the document's `included` resources. Each include
//! path compiles to one CTE selecting every target row reachable from its parent CTE, carrying
//! both the raw columns (so deeper CTEs can join against it) and the serialized resource as
//! `j`.

use super::Compilation;
use crate::error::CompilerError;
use crate::graph::node::NodeId;
use crate::schema::relationship::RelationshipKind;
use crate::sql::{
    column::Column,
    order::{OrderBy, OrderByElement, Ordering},
    predicate::Predicate,
    select::Select,
    table::Table,
};

impl Compilation<'_> {
    /// The select body of one include CTE. `DISTINCT ON` the primary key deduplicates rows
    /// reached through a fan-out parent (a collection parent referencing the same target row
    /// more than once).
    pub(crate) fn include_select(&self, id: NodeId) -> Result<Select, CompilerError> {
        let node = self.arena.node(id);
        let entity = self.schema.entity(&node.entity)?;
        let table_name = entity.table_name.clone();

        let (parent_id, reflection) = match (node.parent, &node.reflection) {
            (Some(parent), Some(reflection)) => (parent, reflection),
            _ => {
                return Err(CompilerError::UnsupportedIncludePath {
                    path: node.full_path.clone(),
                })
            }
        };
        let parent_node = self.arena.node(parent_id);
        let parent_entity = self.schema.entity(&parent_node.entity)?;

        // Both checked when the include was planned
        let (kind, foreign_key) = match (reflection.kind, &reflection.foreign_key) {
            (Some(kind), Some(foreign_key)) => (kind, foreign_key.clone()),
            _ => {
                return Err(CompilerError::UnsupportedIncludePath {
                    path: node.full_path.clone(),
                })
            }
        };

        let join_predicate = match kind {
            RelationshipKind::BelongsTo => Predicate::Eq(
                Column::physical(parent_node.cte_name.clone(), foreign_key),
                Column::physical(table_name.clone(), entity.primary_key.clone()),
            ),
            RelationshipKind::HasMany | RelationshipKind::HasOne => Predicate::Eq(
                Column::physical(
                    parent_node.cte_name.clone(),
                    parent_entity.primary_key.clone(),
                ),
                Column::physical(table_name.clone(), foreign_key),
            ),
        };

        let mut from = Table::physical(table_name.clone(), None).join(
            Table::cte(parent_node.cte_name.clone(), None),
            join_predicate,
        );
        for (alias, select) in self.relationship_laterals(id, &table_name)? {
            from = from.lateral_join(select, alias);
        }

        let resource = self.resource_object(id, &table_name)?;
        let mut select = Select::new(
            from,
            vec![
                Column::Star(Some(table_name.clone())),
                Column::aliased(resource, "j"),
            ],
            Predicate::True,
        );
        select.distinct_on = Some(Column::physical(
            table_name.clone(),
            entity.primary_key.clone(),
        ));
        select.order_by = Some(OrderBy(vec![OrderByElement::column(
            Some(table_name),
            entity.primary_key.clone(),
            Ordering::Asc,
        )]));
        Ok(select)
    }
}
