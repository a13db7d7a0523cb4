//! Select-list entries.

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A column reference, optionally aliased.
    Column {
        column: String,
        alias: Option<String>,
    },
    /// A raw expression such as `COUNT(*)`, optionally aliased.
    Raw {
        expression: String,
        alias: Option<String>,
    },
}

impl Selection {
    pub fn column(column: impl Into<String>) -> Self {
        Selection::Column {
            column: column.into(),
            alias: None,
        }
    }

    pub fn raw(expression: impl Into<String>) -> Self {
        Selection::Raw {
            expression: expression.into(),
            alias: None,
        }
    }

    /// Sets the output name of this entry.
    pub fn alias(self, name: impl Into<String>) -> Self {
        let name = Some(name.into());
        match self {
            Selection::Column { column, .. } => Selection::Column {
                column,
                alias: name,
            },
            Selection::Raw { expression, .. } => Selection::Raw {
                expression,
                alias: name,
            },
        }
    }

    /// Name of the result column this entry produces.
    pub fn output_name(&self) -> &str {
        match self {
            Selection::Column { column, alias } => alias.as_deref().unwrap_or(column),
            Selection::Raw { expression, alias } => alias.as_deref().unwrap_or(expression),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names() {
        assert_eq!(Selection::column("a.b").output_name(), "a.b");
        assert_eq!(Selection::column("a.b").alias("id").output_name(), "id");
        assert_eq!(Selection::raw("COUNT(*)").alias("count").output_name(), "count");
        assert_eq!(Selection::raw("COUNT(*)").output_name(), "COUNT(*)");
    }
}
