use std::fmt;

use serde::{Deserialize, Serialize};

use super::identifier::Identifier;

/// A table name with optional schema and catalog qualifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Identifier>,
    pub table: Identifier,
}

impl TableName {
    pub fn new(catalog: Option<Identifier>, schema: Option<Identifier>, table: Identifier) -> Self {
        TableName {
            catalog,
            schema,
            table,
        }
    }

    /// Unqualified, undelimited table name.
    pub fn unqualified(table: &str) -> Self {
        TableName::new(None, None, Identifier::undelimited(table))
    }

    /// Builds a name from one to three parsed segments, last segment first
    /// filling the table slot.
    pub fn from_parts(parts: &[Identifier]) -> Option<Self> {
        match parts {
            [table] => Some(TableName::new(None, None, table.clone())),
            [schema, table] => Some(TableName::new(None, Some(schema.clone()), table.clone())),
            [catalog, schema, table] => Some(TableName::new(
                Some(catalog.clone()),
                Some(schema.clone()),
                table.clone(),
            )),
            _ => None,
        }
    }

    pub fn parts(&self) -> Vec<&Identifier> {
        self.catalog
            .iter()
            .chain(self.schema.iter())
            .chain(std::iter::once(&self.table))
            .collect()
    }

    pub fn qualifier_count(&self) -> usize {
        self.parts().len() - 1
    }

    pub fn with_unqualified(&self) -> TableName {
        TableName::new(None, None, self.table.clone())
    }

    /// Flattens the name into a single segment prefixed with `T<n>_`, used to
    /// tell apart several occurrences of one table in a self-join.
    pub fn with_prefix(&self, n: usize) -> TableName {
        let joined: Vec<&str> = self.parts().iter().map(|id| id.name()).collect();
        let name = format!("T{}_{}", n, joined.join("_"));
        let delimited = self.parts().iter().any(|id| id.is_delimited());
        TableName::new(None, None, Identifier::new(name, delimited))
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.parts().iter().map(|id| id.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// A column name, optionally qualified by a table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<TableName>,
    pub column: Identifier,
}

impl ColumnName {
    pub fn new(qualifier: Option<TableName>, column: Identifier) -> Self {
        ColumnName { qualifier, column }
    }

    pub fn qualified(table: &TableName, column: Identifier) -> Self {
        ColumnName::new(Some(table.clone()), column)
    }

    /// Shorthand for `table.column` with undelimited parts.
    pub fn of(table: &str, column: &str) -> Self {
        ColumnName::new(
            Some(TableName::unqualified(table)),
            Identifier::undelimited(column),
        )
    }

    pub fn unqualified_name(column: Identifier) -> Self {
        ColumnName::new(None, column)
    }

    /// One to four segments; the last is the column, the rest its table.
    pub fn from_parts(parts: &[Identifier]) -> Option<Self> {
        let (column, table_parts) = parts.split_last()?;
        if table_parts.is_empty() {
            return Some(ColumnName::unqualified_name(column.clone()));
        }
        let table = TableName::from_parts(table_parts)?;
        Some(ColumnName::qualified(&table, column.clone()))
    }

    pub fn is_qualified(&self) -> bool {
        self.qualifier.is_some()
    }

    pub fn unqualified(&self) -> ColumnName {
        ColumnName::unqualified_name(self.column.clone())
    }

    pub fn requalify(&self, table: &TableName) -> ColumnName {
        ColumnName::qualified(table, self.column.clone())
    }

    /// True when both names denote the same column, treating a missing
    /// qualifier on either side as a wildcard.
    pub fn matches(&self, other: &ColumnName) -> bool {
        match (&self.qualifier, &other.qualifier) {
            (Some(a), Some(b)) => a == b && self.column == other.column,
            _ => self.column == other.column,
        }
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(table) => write!(f, "{}.{}", table, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}
