use super::{predicate::Predicate, table::Table, ExpressionBuilder, SQLBuilder};

/// A join between two relations.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    left: Box<Table>,
    right: Box<Table>,
    kind: JoinKind,
    /// The join predicate. Ignored for lateral joins (which are `ON TRUE`, with the real
    /// correlation inside the sub-select) and for cross joins.
    predicate: Predicate,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum JoinKind {
    Inner,
    LeftLateral,
    Cross,
}

impl Join {
    pub fn new(left: Table, right: Table, kind: JoinKind, predicate: Predicate) -> Self {
        Join {
            left: Box::new(left),
            right: Box::new(right),
            kind,
            predicate,
        }
    }

    pub fn left(&self) -> &Table {
        &self.left
    }
}

impl ExpressionBuilder for Join {
    fn build(&self, builder: &mut SQLBuilder) {
        self.left.build(builder);
        match self.kind {
            JoinKind::Inner => {
                builder.push_str(" JOIN ");
                self.right.build(builder);
                builder.push_str(" ON ");
                self.predicate.build(builder);
            }
            JoinKind::LeftLateral => {
                builder.push_str(" LEFT JOIN LATERAL ");
                self.right.build(builder);
                builder.push_str(" ON TRUE");
            }
            JoinKind::Cross => {
                builder.push_str(" CROSS JOIN ");
                self.right.build(builder);
            }
        }
    }
}
