use super::{column::Column, ExpressionBuilder, SQLBuilder};

/// A JSON object constructor corresponding to Postgres' `jsonb_build_object` function.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonObject(pub Vec<JsonObjectElement>);

#[derive(Debug, Clone, PartialEq)]
pub struct JsonObjectElement {
    pub key: String,
    pub value: Column,
}

impl JsonObjectElement {
    pub fn new(key: impl Into<String>, value: Column) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

impl ExpressionBuilder for JsonObject {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_str("jsonb_build_object(");
        builder.push_elems(&self.0, ", ");
        builder.push(')');
    }
}

/// Build one `'<key>', <value>` pair of a JSON object.
impl ExpressionBuilder for JsonObjectElement {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_quoted(&self.key);
        builder.push_str(", ");
        self.value.build(builder);
    }
}
