use super::{select::Select, union::Union, ExpressionBuilder, SQLBuilder};

/// A query with common table expressions of the form `WITH <expressions> <select>`.
#[derive(Debug, Clone, PartialEq)]
pub struct WithQuery {
    /// The "WITH" expressions
    pub expressions: Vec<CteExpression>,
    /// The select statement
    pub select: Select,
}

/// A common table expression of the form `<name> AS (<operation>)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CteExpression {
    pub name: String,
    pub operation: CteOperation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CteOperation {
    Select(Select),
    Union(Union),
}

impl CteExpression {
    pub fn new(name: impl Into<String>, operation: CteOperation) -> Self {
        Self {
            name: name.into(),
            operation,
        }
    }
}

impl ExpressionBuilder for WithQuery {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_str("WITH ");
        builder.push_elems(&self.expressions, ", ");
        builder.push_space();
        self.select.build(builder);
    }
}

impl ExpressionBuilder for CteExpression {
    /// Build a CTE expression for the `<name> AS (<operation>)` syntax.
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_identifier(&self.name);
        builder.push_str(" AS (");
        match &self.operation {
            CteOperation::Select(select) => select.build(builder),
            CteOperation::Union(union) => union.build(builder),
        }
        builder.push(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::{column::Column, predicate::Predicate, table::Table};

    #[test]
    fn with_query() {
        let with_query = WithQuery {
            expressions: vec![CteExpression::new(
                "t",
                CteOperation::Select(Select::new(
                    Table::physical("notes", None),
                    vec![Column::Star(Some("notes".to_string()))],
                    Predicate::True,
                )),
            )],
            select: Select::new(
                Table::cte("t", None),
                vec![Column::Star(None)],
                Predicate::True,
            ),
        };
        assert_binding!(
            with_query.to_sql(),
            r#"WITH "t" AS (SELECT "notes".* FROM "notes") SELECT * FROM "t""#
        );
    }
}
