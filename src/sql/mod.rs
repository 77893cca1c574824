use std::{
    any::Any,
    fmt::{Debug, Display},
    sync::Arc,
};

use tokio_postgres::types::ToSql;

#[macro_use]
#[cfg(test)]
mod test_util;

pub mod case;
pub mod column;
pub mod cte;
mod expression_builder;
pub mod join;
pub mod json_agg;
pub mod json_object;
pub mod limit;
pub mod offset;
pub mod order;
pub mod predicate;
pub mod select;
mod sql_builder;
pub mod table;
pub mod union;

pub use expression_builder::ExpressionBuilder;
pub use sql_builder::SQLBuilder;

/// A value that can be bound to a `$n` placeholder in the generated statement.
pub trait SQLParam: ToSql + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq(&self, other: &dyn SQLParam) -> bool;

    fn as_pg(&self) -> &(dyn ToSql + Sync);
}

impl<T: ToSql + Send + Sync + Any + PartialEq> SQLParam for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq(&self, other: &dyn SQLParam) -> bool {
        if let Some(other) = other.as_any().downcast_ref::<T>() {
            self == other
        } else {
            false
        }
    }

    fn as_pg(&self) -> &(dyn ToSql + Sync) {
        self
    }
}

impl PartialEq for dyn SQLParam {
    fn eq(&self, other: &Self) -> bool {
        SQLParam::eq(self, other)
    }
}

/// A shareable wrapper for SQL parameters. `Arc` rather than `Box` so that a request value
/// (such as the root id constraint) can appear in the AST and in the final parameter list
/// without cloning the underlying value.
#[derive(Clone)]
pub struct SQLParamContainer(Arc<dyn SQLParam>);

impl SQLParamContainer {
    pub fn new<T: SQLParam + 'static>(param: T) -> Self {
        Self(Arc::new(param))
    }

    pub fn param(&self) -> Arc<dyn SQLParam> {
        self.0.clone()
    }
}

impl PartialEq for SQLParamContainer {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl AsRef<dyn SQLParam> for SQLParamContainer {
    fn as_ref(&self) -> &(dyn SQLParam + 'static) {
        self.0.as_ref()
    }
}

impl Debug for SQLParamContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Display for SQLParamContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
