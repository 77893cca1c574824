use super::{
    case::Case, json_agg::JsonAgg, json_object::JsonObject, select::Select, ExpressionBuilder,
    SQLBuilder, SQLParamContainer,
};

/// A column-like concept covering any usage where a value expression could appear: an item in
/// a `SELECT` list, one side of a predicate, an element of a JSON object, and so on. The
/// variants encode the exact semantics of each kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// A column reference, optionally qualified with a correlation name (a table name, table
    /// alias, or CTE name).
    Physical {
        correlation: Option<String>,
        name: String,
    },
    /// A literal value. This is mapped to a `$n` placeholder to avoid SQL injection.
    Param(SQLParamContainer),
    /// An array parameter with a wrapping such as `ANY(...)` or `ALL(...)`
    ArrayParam {
        param: SQLParamContainer,
        wrapper: ArrayParamWrapper,
    },
    /// A `jsonb_build_object(...)` invocation
    JsonObject(JsonObject),
    /// A `jsonb_agg(...)` aggregation
    JsonAgg(JsonAgg),
    /// A `CASE WHEN ... THEN ... END` expression
    Case(Case),
    /// A sub-select query
    SubSelect(Box<Select>),
    /// A constant string such as `'notes'`, quoted and escaped. Needed to have a query return
    /// the JSON:API `type` member set to a fixed value.
    Constant(String),
    /// An integer literal rendered inline (used for trusted schema-level values such as enum
    /// discriminants, never for request data)
    IntLiteral(i64),
    /// All columns of a relation: `*` or `"correlation".*`
    Star(Option<String>),
    /// A null value
    Null,
    /// A trusted raw SQL fragment supplied by the schema or serializer descriptor (a computed
    /// column definition). Never derived from request parameters.
    Raw(String),
    /// `<column>::text`, used to render ids as JSON strings
    TextCast(Box<Column>),
    /// `<column> AS "<alias>"`, for naming a select-list item
    Alias {
        column: Box<Column>,
        alias: String,
    },
    /// `CONCAT(<column>, ...)`, used to splice a row's primary key into link templates
    Concat(Vec<Column>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayParamWrapper {
    Any,
    All,
    None,
}

impl Column {
    pub fn physical(correlation: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Physical {
            correlation: Some(correlation.into()),
            name: name.into(),
        }
    }

    /// An unqualified column reference
    pub fn unqualified(name: impl Into<String>) -> Self {
        Self::Physical {
            correlation: None,
            name: name.into(),
        }
    }

    pub fn aliased(column: Column, alias: impl Into<String>) -> Self {
        Self::Alias {
            column: Box::new(column),
            alias: alias.into(),
        }
    }

    pub fn text_cast(column: Column) -> Self {
        Self::TextCast(Box::new(column))
    }
}

impl ExpressionBuilder for Column {
    fn build(&self, builder: &mut SQLBuilder) {
        match self {
            Column::Physical { correlation, name } => match correlation {
                Some(correlation) => builder.push_column(correlation, name),
                None => builder.push_identifier(name),
            },
            Column::Param(param) => builder.push_param(param.param()),
            Column::ArrayParam { param, wrapper } => {
                let wrapper_string = match wrapper {
                    ArrayParamWrapper::Any => "ANY",
                    ArrayParamWrapper::All => "ALL",
                    ArrayParamWrapper::None => "",
                };

                if wrapper_string.is_empty() {
                    builder.push_param(param.param());
                } else {
                    builder.push_str(wrapper_string);
                    builder.push('(');
                    builder.push_param(param.param());
                    builder.push(')');
                }
            }
            Column::JsonObject(obj) => obj.build(builder),
            Column::JsonAgg(agg) => agg.build(builder),
            Column::Case(case) => case.build(builder),
            Column::SubSelect(select) => {
                builder.push('(');
                select.build(builder);
                builder.push(')');
            }
            Column::Constant(value) => builder.push_quoted(value),
            Column::IntLiteral(value) => builder.push_str(value.to_string()),
            Column::Star(correlation) => {
                if let Some(correlation) = correlation {
                    builder.push_identifier(correlation);
                    builder.push('.');
                }
                builder.push('*');
            }
            Column::Null => builder.push_str("NULL"),
            Column::Raw(fragment) => builder.push_str(fragment),
            Column::TextCast(column) => {
                column.build(builder);
                builder.push_str("::text");
            }
            Column::Alias { column, alias } => {
                column.build(builder);
                builder.push_str(" AS ");
                builder.push_identifier(alias);
            }
            Column::Concat(columns) => {
                builder.push_str("CONCAT(");
                builder.push_elems(columns, ", ");
                builder.push(')');
            }
        }
    }
}
