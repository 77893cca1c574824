use super::{column::Column, order::OrderBy, ExpressionBuilder, SQLBuilder};

/// A JSON array aggregation corresponding to Postgres' `jsonb_agg` function.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonAgg {
    pub column: Box<Column>,
    /// Ordering applied inside the aggregate, e.g. `jsonb_agg(x ORDER BY ...)`
    pub order_by: Option<OrderBy>,
}

impl JsonAgg {
    pub fn new(column: Column, order_by: Option<OrderBy>) -> Self {
        Self {
            column: Box::new(column),
            order_by,
        }
    }
}

impl ExpressionBuilder for JsonAgg {
    /// Build an expression of the form `COALESCE(jsonb_agg(<column> [ORDER BY ...]),
    /// '[]'::jsonb)`. The COALESCE wrapper ensures we return an empty array, never null, when
    /// there are no matching entities.
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_str("COALESCE(jsonb_agg(");
        self.column.build(builder);
        if let Some(order_by) = &self.order_by {
            builder.push_space();
            order_by.build(builder);
        }
        builder.push_str("), '[]'::jsonb)");
    }
}
