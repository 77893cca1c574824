use super::{
    join::{Join, JoinKind},
    predicate::Predicate,
    select::Select,
    ExpressionBuilder, SQLBuilder,
};

/// A relation appearing in a `FROM` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    /// A physical table, optionally aliased
    Physical {
        name: String,
        alias: Option<String>,
    },
    /// A reference to a CTE bound earlier in the same statement
    Cte {
        name: String,
        alias: Option<String>,
    },
    Join(Box<Join>),
    /// A parenthesized sub-select with an alias
    SubSelect {
        select: Box<Select>,
        alias: String,
    },
}

impl Table {
    pub fn physical(name: impl Into<String>, alias: Option<String>) -> Self {
        Self::Physical {
            name: name.into(),
            alias,
        }
    }

    pub fn cte(name: impl Into<String>, alias: Option<String>) -> Self {
        Self::Cte {
            name: name.into(),
            alias,
        }
    }

    pub fn join(self, right: Table, predicate: Predicate) -> Table {
        Table::Join(Box::new(Join::new(self, right, JoinKind::Inner, predicate)))
    }

    /// `self LEFT JOIN LATERAL (<select>) AS "<alias>" ON TRUE`
    pub fn lateral_join(self, select: Select, alias: impl Into<String>) -> Table {
        let right = Table::SubSelect {
            select: Box::new(select),
            alias: alias.into(),
        };
        Table::Join(Box::new(Join::new(
            self,
            right,
            JoinKind::LeftLateral,
            Predicate::True,
        )))
    }

    pub fn cross_join(self, right: Table) -> Table {
        Table::Join(Box::new(Join::new(
            self,
            right,
            JoinKind::Cross,
            Predicate::True,
        )))
    }
}

impl ExpressionBuilder for Table {
    fn build(&self, builder: &mut SQLBuilder) {
        match self {
            Table::Physical { name, alias } | Table::Cte { name, alias } => {
                builder.push_identifier(name);
                if let Some(alias) = alias {
                    builder.push_str(" AS ");
                    builder.push_identifier(alias);
                }
            }
            Table::Join(join) => join.build(builder),
            Table::SubSelect { select, alias } => {
                builder.push('(');
                select.build(builder);
                builder.push_str(") AS ");
                builder.push_identifier(alias);
            }
        }
    }
}
