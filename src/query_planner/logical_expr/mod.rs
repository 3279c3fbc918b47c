use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    db_schema::{data_type::DataType, names::ColumnName},
    query_planner::renamer::Renamer,
    vendor::{Sql92, Vendor},
};

mod column_list_equality;

pub use column_list_equality::ColumnListEquality;

/// A literal value, encoded through its datatype when one is known and as a
/// string literal otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Constant {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
}

/// Piece of a raw SQL escape: literal text interleaved with column
/// references the renamer still has to see.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SqlFragment {
    Text(String),
    Column(ColumnName),
    Nested(Box<Expression>),
}

/// Boolean and scalar expressions over columns.
///
/// Constructors keep expressions normalised: conjunctions are flat sets that
/// never contain `True` or `False`, and equalities order their operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Expression {
    True,
    False,
    Column(ColumnName),
    Constant(Constant),
    Equality(Box<Expression>, Box<Expression>),
    Conjunction(BTreeSet<Expression>),
    Concatenation(Vec<Expression>),
    Sql(Vec<SqlFragment>),
}

impl Expression {
    pub fn column(column: ColumnName) -> Self {
        Expression::Column(column)
    }

    pub fn constant(value: impl Into<String>, data_type: Option<DataType>) -> Self {
        Expression::Constant(Constant {
            value: value.into(),
            data_type,
        })
    }

    /// Raw SQL text without column references.
    pub fn raw(text: impl Into<String>) -> Self {
        Expression::Sql(vec![SqlFragment::Text(text.into())])
    }

    /// Raw SQL with embedded columns; `"1"` and `"0"` collapse to the boolean
    /// constants.
    pub fn sql(fragments: Vec<SqlFragment>) -> Self {
        if let [SqlFragment::Text(text)] = fragments.as_slice() {
            match text.trim() {
                "1" => return Expression::True,
                "0" => return Expression::False,
                _ => {}
            }
        }
        Expression::Sql(fragments)
    }

    pub fn equal(left: Expression, right: Expression) -> Self {
        if left <= right {
            Expression::Equality(Box::new(left), Box::new(right))
        } else {
            Expression::Equality(Box::new(right), Box::new(left))
        }
    }

    pub fn concatenation(parts: Vec<Expression>) -> Self {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Expression::Concatenation(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            if let Some(only) = flat.pop() {
                return only;
            }
        }
        Expression::Concatenation(flat)
    }

    /// `AND` with `True` as identity and `False` absorbing.
    pub fn and(self, other: Expression) -> Expression {
        match (self, other) {
            (Expression::False, _) | (_, Expression::False) => Expression::False,
            (Expression::True, e) | (e, Expression::True) => e,
            (a, b) => {
                let mut members = BTreeSet::new();
                a.flatten_into(&mut members);
                b.flatten_into(&mut members);
                Expression::from_members(members)
            }
        }
    }

    pub fn conjunction<I: IntoIterator<Item = Expression>>(expressions: I) -> Expression {
        expressions
            .into_iter()
            .fold(Expression::True, |acc, e| acc.and(e))
    }

    fn flatten_into(self, members: &mut BTreeSet<Expression>) {
        match self {
            Expression::Conjunction(inner) => members.extend(inner),
            other => {
                members.insert(other);
            }
        }
    }

    fn from_members(mut members: BTreeSet<Expression>) -> Expression {
        if members.len() == 1 {
            if let Some(only) = members.pop_first() {
                return only;
            }
        }
        Expression::Conjunction(members)
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Expression::True)
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Expression::False)
    }

    /// True when the value does not depend on the row.
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::True | Expression::False | Expression::Constant(_) => true,
            Expression::Column(_) | Expression::Sql(_) => false,
            Expression::Equality(a, b) => a.is_constant() && b.is_constant(),
            Expression::Conjunction(members) => members.iter().all(|m| m.is_constant()),
            Expression::Concatenation(parts) => parts.iter().all(|p| p.is_constant()),
        }
    }

    /// True when every row satisfying this condition has the same value in
    /// `column`.
    pub fn forces_constant(&self, column: &ColumnName) -> bool {
        match self {
            Expression::False => true,
            Expression::Equality(a, b) => {
                let pins = |side: &Expression, other: &Expression| {
                    matches!(side, Expression::Column(c) if c.matches(column)) && other.is_constant()
                };
                pins(a, b) || pins(b, a)
            }
            Expression::Conjunction(members) => members.iter().any(|m| m.forces_constant(column)),
            _ => false,
        }
    }

    pub fn columns(&self) -> BTreeSet<ColumnName> {
        let mut columns = BTreeSet::new();
        self.collect_columns(&mut columns);
        columns
    }

    fn collect_columns(&self, columns: &mut BTreeSet<ColumnName>) {
        match self {
            Expression::True | Expression::False | Expression::Constant(_) => {}
            Expression::Column(c) => {
                columns.insert(c.clone());
            }
            Expression::Equality(a, b) => {
                a.collect_columns(columns);
                b.collect_columns(columns);
            }
            Expression::Conjunction(members) => {
                members.iter().for_each(|m| m.collect_columns(columns))
            }
            Expression::Concatenation(parts) => {
                parts.iter().for_each(|p| p.collect_columns(columns))
            }
            Expression::Sql(fragments) => {
                for fragment in fragments {
                    match fragment {
                        SqlFragment::Text(_) => {}
                        SqlFragment::Column(c) => {
                            columns.insert(c.clone());
                        }
                        SqlFragment::Nested(e) => e.collect_columns(columns),
                    }
                }
            }
        }
    }

    pub fn rename(&self, renamer: &Renamer) -> Expression {
        match self {
            Expression::True | Expression::False | Expression::Constant(_) => self.clone(),
            Expression::Column(c) => Expression::Column(renamer.apply_to_column(c)),
            Expression::Equality(a, b) => Expression::equal(a.rename(renamer), b.rename(renamer)),
            Expression::Conjunction(members) => {
                Expression::conjunction(members.iter().map(|m| m.rename(renamer)))
            }
            Expression::Concatenation(parts) => {
                Expression::concatenation(parts.iter().map(|p| p.rename(renamer)).collect())
            }
            Expression::Sql(fragments) => Expression::Sql(
                fragments
                    .iter()
                    .map(|fragment| match fragment {
                        SqlFragment::Text(t) => SqlFragment::Text(t.clone()),
                        SqlFragment::Column(c) => SqlFragment::Column(renamer.apply_to_column(c)),
                        SqlFragment::Nested(e) => SqlFragment::Nested(Box::new(e.rename(renamer))),
                    })
                    .collect(),
            ),
        }
    }

    pub fn to_sql(&self, vendor: &dyn Vendor) -> String {
        match self {
            Expression::True => "1=1".to_string(),
            Expression::False => "1=0".to_string(),
            Expression::Column(c) => vendor.column_sql(c),
            Expression::Constant(constant) => match &constant.data_type {
                Some(data_type) => data_type.to_sql_literal(&constant.value, vendor),
                None => vendor.quote_string_literal(&constant.value),
            },
            Expression::Equality(a, b) => format!("{} = {}", a.to_sql(vendor), b.to_sql(vendor)),
            Expression::Conjunction(_) => format!("({})", self.to_sql_fragments(vendor).join(" AND ")),
            Expression::Concatenation(parts) => {
                let rendered: Vec<String> = parts.iter().map(|p| p.to_sql(vendor)).collect();
                vendor.concatenation(&rendered)
            }
            Expression::Sql(fragments) => {
                let mut sql = String::from("(");
                for fragment in fragments {
                    match fragment {
                        SqlFragment::Text(t) => sql.push_str(t),
                        SqlFragment::Column(c) => sql.push_str(&vendor.column_sql(c)),
                        SqlFragment::Nested(e) => sql.push_str(&e.to_sql(vendor)),
                    }
                }
                sql.push(')');
                sql
            }
        }
    }

    /// The rendered conjuncts in sorted order; a single entry for anything
    /// that is not a conjunction.
    pub fn to_sql_fragments(&self, vendor: &dyn Vendor) -> Vec<String> {
        match self {
            Expression::Conjunction(members) => {
                let mut fragments: Vec<String> = members.iter().map(|m| m.to_sql(vendor)).collect();
                fragments.sort();
                fragments
            }
            other => vec![other.to_sql(vendor)],
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sql(&Sql92))
    }
}

#[cfg(test)]
mod expression_tests {
    use super::*;
    use crate::db_schema::{data_type::DataType, names::TableName};
    use crate::vendor::{vendor_for, VendorKind};

    fn col(table: &str, column: &str) -> Expression {
        Expression::column(ColumnName::of(table, column))
    }

    fn int(value: &str) -> Expression {
        Expression::constant(value, Some(DataType::exact_numeric("INTEGER")))
    }

    #[test]
    fn test_true_is_identity_false_absorbs() {
        let e = Expression::equal(col("t", "a"), int("1"));
        assert_eq!(Expression::True.and(e.clone()), e);
        assert_eq!(e.clone().and(Expression::True), e);
        assert_eq!(e.clone().and(Expression::False), Expression::False);
    }

    #[test]
    fn test_conjunction_flattens_and_dedups() {
        let a = Expression::equal(col("t", "a"), int("1"));
        let b = Expression::equal(col("t", "b"), int("2"));
        let left = a.clone().and(b.clone()).and(a.clone());
        let right = b.clone().and(a.clone());
        assert_eq!(left, right);
        assert_eq!(left.to_sql(&Sql92), "(t.a = 1 AND t.b = 2)");
    }

    #[test]
    fn test_equality_is_symmetric() {
        assert_eq!(
            Expression::equal(col("t", "a"), col("u", "b")),
            Expression::equal(col("u", "b"), col("t", "a"))
        );
    }

    #[test]
    fn test_constant_without_type_is_string() {
        let e = Expression::equal(col("t", "name"), Expression::constant("O'Hara", None));
        assert_eq!(e.to_sql(&Sql92), "t.name = 'O''Hara'");
    }

    #[test]
    fn test_raw_sql_booleans_collapse() {
        assert!(Expression::sql(vec![SqlFragment::Text("1".to_string())]).is_true());
        assert!(Expression::sql(vec![SqlFragment::Text(" 0 ".to_string())]).is_false());
    }

    #[test]
    fn test_raw_sql_renders_columns_per_vendor() {
        let e = Expression::sql(vec![
            SqlFragment::Text("LOWER(".to_string()),
            SqlFragment::Column(ColumnName::qualified(
                &TableName::unqualified("t"),
                crate::db_schema::identifier::Identifier::delimited("Name"),
            )),
            SqlFragment::Text(")".to_string()),
        ]);
        assert_eq!(e.to_sql(&Sql92), "(LOWER(t.\"Name\"))");
        assert_eq!(e.to_sql(vendor_for(VendorKind::MySql)), "(LOWER(t.`Name`))");
    }

    #[test]
    fn test_concatenation_per_vendor() {
        let e = Expression::concatenation(vec![col("t", "a"), Expression::constant("-", None), col("t", "b")]);
        assert_eq!(e.to_sql(&Sql92), "(t.a || '-' || t.b)");
        assert_eq!(e.to_sql(vendor_for(VendorKind::MySql)), "CONCAT(t.a, '-', t.b)");
        assert_eq!(e.to_sql(vendor_for(VendorKind::SqlServer)), "(t.a + '-' + t.b)");
    }

    #[test]
    fn test_forces_constant() {
        let cond = Expression::equal(col("t", "b"), int("3")).and(Expression::equal(col("t", "a"), col("t", "c")));
        assert!(cond.forces_constant(&ColumnName::of("t", "b")));
        assert!(!cond.forces_constant(&ColumnName::of("t", "a")));
        assert!(Expression::False.forces_constant(&ColumnName::of("t", "a")));
    }

    #[test]
    fn test_rename_with_alias_renamer() {
        let e = Expression::equal(col("t", "a"), int("1"));
        let renamer = Renamer::to_alias(TableName::unqualified("x"));
        assert_eq!(e.rename(&renamer).to_sql(&Sql92), "x.a = 1");
        assert_eq!(e.rename(&Renamer::identity()), e);
    }
}
