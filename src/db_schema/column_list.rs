use std::fmt;

use serde::{Deserialize, Serialize};

use super::names::{ColumnName, TableName};

/// Ordered, duplicate-free list of column names.
///
/// Lookups accept unqualified names: `a` matches `t.a` as long as only one
/// column in the list is called `a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ColumnList(Vec<ColumnName>);

impl ColumnList {
    pub fn new(columns: Vec<ColumnName>) -> Self {
        columns.into_iter().collect()
    }

    pub fn empty() -> Self {
        ColumnList(Vec::new())
    }

    /// Appends unless an identical name is already present.
    pub fn push(&mut self, column: ColumnName) {
        if !self.0.contains(&column) {
            self.0.push(column);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnName> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ColumnName] {
        &self.0
    }

    pub fn contains(&self, column: &ColumnName) -> bool {
        self.0.iter().any(|c| c.matches(column))
    }

    /// Resolves `column` to the member it denotes. `None` if it is missing or
    /// ambiguous.
    pub fn get(&self, column: &ColumnName) -> Option<&ColumnName> {
        let mut found = self.0.iter().filter(|c| c.matches(column));
        let first = found.next()?;
        if found.next().is_some() {
            return None;
        }
        Some(first)
    }

    pub fn is_ambiguous(&self, column: &ColumnName) -> bool {
        !column.is_qualified() && self.0.iter().filter(|c| c.matches(column)).count() > 1
    }

    pub fn index_of(&self, column: &ColumnName) -> Option<usize> {
        let resolved = self.get(column)?;
        self.0.iter().position(|c| c == resolved)
    }

    /// Members of `self` that `other` contains, in `self`'s order.
    pub fn intersect_ordered(&self, other: &ColumnList) -> ColumnList {
        self.0
            .iter()
            .filter(|c| other.contains(c))
            .cloned()
            .collect()
    }

    pub fn union(&self, other: &ColumnList) -> ColumnList {
        self.0.iter().chain(other.0.iter()).cloned().collect()
    }

    pub fn requalify(&self, table: &TableName) -> ColumnList {
        self.0.iter().map(|c| c.requalify(table)).collect()
    }
}

impl FromIterator<ColumnName> for ColumnList {
    fn from_iter<I: IntoIterator<Item = ColumnName>>(iter: I) -> Self {
        let mut list = ColumnList::empty();
        for column in iter {
            list.push(column);
        }
        list
    }
}

impl<'a> IntoIterator for &'a ColumnList {
    type Item = &'a ColumnName;
    type IntoIter = std::slice::Iter<'a, ColumnName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ColumnList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
