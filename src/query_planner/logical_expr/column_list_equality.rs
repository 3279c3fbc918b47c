use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use super::Expression;
use crate::{db_schema::names::ColumnName, query_planner::renamer::Renamer};

/// Equi-join condition between two equally long column lists, e.g. a
/// composite foreign key and the key it references.
///
/// Pairs are stored in canonical order so `a = b` and `b = a` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnListEquality {
    pairs: Vec<(ColumnName, ColumnName)>,
}

impl ColumnListEquality {
    /// `None` when the lists are empty or differ in length.
    pub fn new(left: &[ColumnName], right: &[ColumnName]) -> Option<Self> {
        if left.is_empty() || left.len() != right.len() {
            return None;
        }
        Some(Self::from_pairs(left.iter().cloned().zip(right.iter().cloned())))
    }

    fn from_pairs<I: IntoIterator<Item = (ColumnName, ColumnName)>>(pairs: I) -> Self {
        let mut pairs: Vec<(ColumnName, ColumnName)> = pairs
            .into_iter()
            .map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
            .collect();
        pairs.sort();
        pairs.dedup();
        ColumnListEquality { pairs }
    }

    pub fn pairs(&self) -> &[(ColumnName, ColumnName)] {
        &self.pairs
    }

    pub fn columns(&self) -> BTreeSet<ColumnName> {
        self.pairs
            .iter()
            .flat_map(|(a, b)| [a.clone(), b.clone()])
            .collect()
    }

    pub fn rename(&self, renamer: &Renamer) -> ColumnListEquality {
        Self::from_pairs(
            self.pairs
                .iter()
                .map(|(a, b)| (renamer.apply_to_column(a), renamer.apply_to_column(b))),
        )
    }

    pub fn to_expression(&self) -> Expression {
        Expression::conjunction(self.pairs.iter().map(|(a, b)| {
            Expression::equal(Expression::column(a.clone()), Expression::column(b.clone()))
        }))
    }
}

impl fmt::Display for ColumnListEquality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .pairs
            .iter()
            .map(|(a, b)| format!("{} = {}", a, b))
            .collect();
        write!(f, "{}", parts.join(" AND "))
    }
}
