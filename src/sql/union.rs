use super::{select::Select, ExpressionBuilder, SQLBuilder};

/// `<select> UNION <select> ...`. Deliberately not `UNION ALL`: the union is what
/// deduplicates a resource reached via more than one include path.
#[derive(Debug, Clone, PartialEq)]
pub struct Union(pub Vec<Select>);

impl ExpressionBuilder for Union {
    fn build(&self, builder: &mut SQLBuilder) {
        builder.push_iter(self.0.iter(), " UNION ", |builder, select| {
            select.build(builder);
        });
    }
}
