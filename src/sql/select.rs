use super::{
    column::Column, limit::Limit, offset::Offset, order::OrderBy, predicate::Predicate,
    table::Table, ExpressionBuilder, SQLBuilder,
};

/// A select statement
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// The relation to select from. `None` renders a FROM-less select, used for the constant
    /// seed row that keeps the included-resources union well-formed.
    pub table: Option<Table>,
    /// The columns to select
    pub columns: Vec<Column>,
    /// A `DISTINCT ON (<column>)` clause, used to deduplicate rows reached via fan-out joins
    pub distinct_on: Option<Column>,
    /// The predicate to filter the rows
    pub predicate: Predicate,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Limit>,
    pub offset: Option<Offset>,
}

impl Select {
    pub fn new(table: Table, columns: Vec<Column>, predicate: Predicate) -> Self {
        Self {
            table: Some(table),
            columns,
            distinct_on: None,
            predicate,
            order_by: None,
            limit: None,
            offset: None,
        }
    }
}

impl ExpressionBuilder for Select {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_str("SELECT ");

        if let Some(distinct_on) = &self.distinct_on {
            builder.push_str("DISTINCT ON (");
            distinct_on.build(builder);
            builder.push_str(") ");
        }

        builder.push_elems(&self.columns, ", ");

        if let Some(table) = &self.table {
            builder.push_str(" FROM ");
            table.build(builder);
        }

        // Avoid a correct, but inelegant "WHERE TRUE" clause
        if self.predicate != Predicate::True {
            builder.push_str(" WHERE ");
            self.predicate.build(builder);
        }
        if let Some(order_by) = &self.order_by {
            builder.push_space();
            order_by.build(builder);
        }
        if let Some(limit) = &self.limit {
            builder.push_space();
            limit.build(builder);
        }
        if let Some(offset) = &self.offset {
            builder.push_space();
            offset.build(builder);
        }
    }
}
