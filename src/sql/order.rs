use super::{ExpressionBuilder, SQLBuilder};

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum Ordering {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderByElement {
    Column {
        correlation: Option<String>,
        name: String,
        ordering: Ordering,
    },
    /// A raw ordering expression carried through verbatim (already validated and re-targeted
    /// by the compiler before it gets here)
    Raw(String),
}

impl OrderByElement {
    pub fn column(
        correlation: Option<String>,
        name: impl Into<String>,
        ordering: Ordering,
    ) -> Self {
        Self::Column {
            correlation,
            name: name.into(),
            ordering,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy(pub Vec<OrderByElement>);

impl ExpressionBuilder for OrderByElement {
    fn build(&self, builder: &mut SQLBuilder) {
        match self {
            OrderByElement::Column {
                correlation,
                name,
                ordering,
            } => {
                match correlation {
                    Some(correlation) => builder.push_column(correlation, name),
                    None => builder.push_identifier(name),
                }
                builder.push_space();
                if *ordering == Ordering::Asc {
                    builder.push_str("ASC");
                } else {
                    builder.push_str("DESC");
                }
            }
            OrderByElement::Raw(expr) => builder.push_str(expr),
        }
    }
}

impl ExpressionBuilder for OrderBy {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_str("ORDER BY ");
        builder.push_elems(&self.0, ", ");
    }
}
