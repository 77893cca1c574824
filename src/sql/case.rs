use super::{column::Column, predicate::Predicate, ExpressionBuilder, SQLBuilder};

/// A `CASE WHEN <predicate> THEN <value> ... [ELSE <value>] END` expression.
///
/// Carries no `ELSE` when none is supplied, so unmatched input yields SQL NULL. Enum
/// translation relies on that: a stored value outside the declared mapping renders as `null`
/// in the document instead of failing the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub whens: Vec<(Predicate, Column)>,
    pub else_value: Option<Box<Column>>,
}

impl Case {
    pub fn new(whens: Vec<(Predicate, Column)>, else_value: Option<Column>) -> Self {
        Self {
            whens,
            else_value: else_value.map(Box::new),
        }
    }
}

impl ExpressionBuilder for Case {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_str("CASE");
        for (predicate, value) in &self.whens {
            builder.push_str(" WHEN ");
            predicate.build(builder);
            builder.push_str(" THEN ");
            value.build(builder);
        }
        if let Some(else_value) = &self.else_value {
            builder.push_str(" ELSE ");
            else_value.build(builder);
        }
        builder.push_str(" END");
    }
}
