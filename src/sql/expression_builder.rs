use std::sync::Arc;

use super::{SQLBuilder, SQLParam};

/// A trait for types that can build themselves into an SQL expression.
///
/// Each constituent of an SQL expression (column, table, select, CTE, etc.) implements this
/// trait, which is then used to hierarchically build the SQL string and the list of parameters
/// to be supplied with it.
pub trait ExpressionBuilder {
    /// Build the SQL expression into the given SQL builder
    fn build(&self, builder: &mut SQLBuilder);

    /// Build the SQL expression into a string along with its parameters. Useful for
    /// testing/debugging, where we want to assert on the generated SQL without creating an
    /// `SQLBuilder` by hand.
    fn to_sql(&self) -> (String, Vec<Arc<dyn SQLParam>>)
    where
        Self: Sized,
    {
        let mut builder = SQLBuilder::new();
        self.build(&mut builder);
        builder.into_sql()
    }
}

impl<T> ExpressionBuilder for Box<T>
where
    T: ExpressionBuilder,
{
    fn build(&self, builder: &mut SQLBuilder) {
        self.as_ref().build(builder)
    }
}

impl<T> ExpressionBuilder for &T
where
    T: ExpressionBuilder,
{
    fn build(&self, builder: &mut SQLBuilder) {
        (**self).build(builder)
    }
}
