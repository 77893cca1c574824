use super::{column::Column, ExpressionBuilder, SQLBuilder};

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    True,
    False,
    Eq(Column, Column),
    Neq(Column, Column),
    IsNull(Column),
    IsNotNull(Column),
    // Prefer Predicate::and(), which simplifies the clause, to construct an And expression
    And(Box<Predicate>, Box<Predicate>),
    // Prefer Predicate::or(), which simplifies the clause, to construct an Or expression
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn and(lhs: Predicate, rhs: Predicate) -> Predicate {
        match (lhs, rhs) {
            (Predicate::False, _) | (_, Predicate::False) => Predicate::False,
            (Predicate::True, rhs) => rhs,
            (lhs, Predicate::True) => lhs,
            (lhs, rhs) => Predicate::And(Box::new(lhs), Box::new(rhs)),
        }
    }

    pub fn or(lhs: Predicate, rhs: Predicate) -> Predicate {
        match (lhs, rhs) {
            (Predicate::True, _) | (_, Predicate::True) => Predicate::True,
            (Predicate::False, rhs) => rhs,
            (lhs, Predicate::False) => lhs,
            (lhs, rhs) => Predicate::Or(Box::new(lhs), Box::new(rhs)),
        }
    }
}

impl From<bool> for Predicate {
    fn from(b: bool) -> Predicate {
        if b {
            Predicate::True
        } else {
            Predicate::False
        }
    }
}

impl std::ops::Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        match self {
            Predicate::True => Predicate::False,
            Predicate::False => Predicate::True,
            predicate => Predicate::Not(Box::new(predicate)),
        }
    }
}

impl ExpressionBuilder for Predicate {
    fn build(&self, builder: &mut SQLBuilder) {
        match self {
            Predicate::True => builder.push_str("TRUE"),
            Predicate::False => builder.push_str("FALSE"),
            Predicate::Eq(column1, column2) => {
                column1.build(builder);
                builder.push_str(" = ");
                column2.build(builder);
            }
            Predicate::Neq(column1, column2) => {
                column1.build(builder);
                builder.push_str(" <> ");
                column2.build(builder);
            }
            Predicate::IsNull(column) => {
                column.build(builder);
                builder.push_str(" IS NULL");
            }
            Predicate::IsNotNull(column) => {
                column.build(builder);
                builder.push_str(" IS NOT NULL");
            }
            Predicate::And(predicate1, predicate2) => {
                predicate1.build(builder);
                builder.push_str(" AND ");
                predicate2.build(builder);
            }
            Predicate::Or(predicate1, predicate2) => {
                builder.push('(');
                predicate1.build(builder);
                builder.push_str(" OR ");
                predicate2.build(builder);
                builder.push(')');
            }
            Predicate::Not(predicate) => {
                builder.push_str("NOT (");
                predicate.build(builder);
                builder.push(')');
            }
        }
    }
}
