use std::sync::Arc;

use super::{ExpressionBuilder, SQLParam};

pub struct SQLBuilder {
    /// The SQL being built, with placeholders for each parameter
    sql: String,
    /// The list of parameters
    params: Vec<Arc<dyn SQLParam>>,
}

impl SQLBuilder {
    pub fn new() -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a string
    pub fn push_str<T: AsRef<str>>(&mut self, s: T) {
        self.sql.push_str(s.as_ref());
    }

    /// Push a character
    pub fn push(&mut self, c: char) {
        self.sql.push(c);
    }

    /// Push a string surrounded by double quotes. Used for identifiers such as table names,
    /// column names, and CTE names. Without the quotes, an identifier with uppercase letters
    /// would be interpreted the same as its lowercase spelling.
    pub fn push_identifier<T: AsRef<str>>(&mut self, s: T) {
        self.sql.push('"');
        self.sql.push_str(s.as_ref());
        self.sql.push('"');
    }

    /// Push a column reference of the form `"<correlation>"."<column>"`.
    pub fn push_column<T: AsRef<str>>(&mut self, correlation: T, column_name: T) {
        self.push_identifier(correlation);
        self.push('.');
        self.push_identifier(column_name);
    }

    /// Push a single-quoted SQL string literal, doubling any embedded single quotes. This is
    /// the only place literal text enters the statement unparameterized, so all quoting lives
    /// here.
    pub fn push_quoted<T: AsRef<str>>(&mut self, s: T) {
        self.sql.push('\'');
        for c in s.as_ref().chars() {
            if c == '\'' {
                self.sql.push('\'');
            }
            self.sql.push(c);
        }
        self.sql.push('\'');
    }

    /// Push a space. This is a common operation, so it is provided as a separate method.
    pub fn push_space(&mut self) {
        self.sql.push(' ');
    }

    /// Push a parameter, which is rendered as a `$n` placeholder, and add it to the list of
    /// parameters.
    pub fn push_param(&mut self, param: Arc<dyn SQLParam>) {
        self.params.push(param);
        self.push('$');
        self.push_str(self.params.len().to_string());
    }

    /// Push elements of an iterator, separated by `sep`. The `push_elem` function provides the
    /// flexibility to map the elements (compared to [`SQLBuilder::push_elems`], which assumes
    /// that the elements implement [`ExpressionBuilder`]).
    pub fn push_iter<T>(
        &mut self,
        iter: impl ExactSizeIterator<Item = T>,
        sep: &str,
        push_elem: impl Fn(&mut Self, T),
    ) {
        let len = iter.len();
        for (i, item) in iter.enumerate() {
            push_elem(self, item);

            if i < len - 1 {
                self.sql.push_str(sep);
            }
        }
    }

    /// Push elements of a slice, separated by `sep`. The elements must themselves implement
    /// `ExpressionBuilder`.
    pub fn push_elems<T: ExpressionBuilder>(&mut self, elems: &[T], sep: &str) {
        self.push_iter(elems.iter(), sep, |builder, elem| {
            elem.build(builder);
        });
    }

    /// Get the SQL string and the list of parameters. This is the final step in building an
    /// SQL expression, and consumes the builder.
    pub fn into_sql(self) -> (String, Vec<Arc<dyn SQLParam>>) {
        (self.sql, self.params)
    }
}

impl Default for SQLBuilder {
    fn default() -> Self {
        Self::new()
    }
}
