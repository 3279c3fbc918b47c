//! The operator tree: an algebraic form of SQL queries.
//!
//! Trees are immutable and share subtrees through `Arc`. Rewrites build new
//! trees; nothing mutates a node once it is constructed. The `Operator`
//! constructors normalise as they build (nested aliases collapse, joins sort
//! their children, one-child joins disappear), so structurally different
//! inputs describing the same query end up as the same tree.

use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use crate::{
    db_schema::{
        column_list::ColumnList,
        data_type::DataType,
        identifier::{Identifier, IdentifierList},
        names::{ColumnName, TableName},
        schema_description::TableDef,
    },
    query_planner::logical_expr::{ColumnListEquality, Expression},
    utils::serde_arc,
};

pub mod op_util;
pub mod visitor;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanColumn {
    pub name: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableScan {
    pub table: TableName,
    pub columns: Vec<ScanColumn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_keys: Vec<IdentifierList>,
}

/// A literal SQL query used as a relation. Its text is emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawSql {
    pub sql: String,
    pub columns: ColumnList,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Alias {
    #[serde(with = "serde_arc")]
    pub input: Arc<Operator>,
    pub alias: TableName,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Select {
    #[serde(with = "serde_arc")]
    pub input: Arc<Operator>,
    pub condition: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    #[serde(with = "serde_arc")]
    pub input: Arc<Operator>,
    pub columns: ColumnList,
}

/// Adds one computed, unqualified column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extend {
    #[serde(with = "serde_arc")]
    pub input: Arc<Operator>,
    pub column: Identifier,
    pub expression: Expression,
}

impl Extend {
    /// Name for a computed column, stable for equal expressions.
    pub fn unique_name_for(expression: &Expression) -> Identifier {
        Identifier::undelimited(format!("EXPR{}", unique_suffix(expression)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InnerJoin {
    #[serde(with = "serde_arc::list")]
    pub inputs: Vec<Arc<Operator>>,
    #[serde(default)]
    pub conditions: Vec<ColumnListEquality>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderSpec {
    pub expression: Expression,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    #[serde(with = "serde_arc")]
    pub input: Arc<Operator>,
    pub specs: Vec<OrderSpec>,
}

/// Row cap. A cap counted from the end of the relation is kept in the tree
/// but not applied until
/// [`swap_limits`](crate::query_planner::optimizer::limit_insertion::swap_limits)
/// turns it into a from-start cap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Limit {
    #[serde(with = "serde_arc")]
    pub input: Arc<Operator>,
    pub limit: u64,
    #[serde(default)]
    pub from_end: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Distinct {
    #[serde(with = "serde_arc")]
    pub input: Arc<Operator>,
}

/// Declares a key unique without changing the rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssertUniqueKey {
    #[serde(with = "serde_arc")]
    pub input: Arc<Operator>,
    pub key: ColumnList,
}

/// No rows, with the columns of its input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Empty {
    #[serde(with = "serde_arc")]
    pub input: Arc<Operator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operator {
    Table(TableScan),
    Sql(RawSql),
    Alias(Alias),
    Select(Select),
    Project(Project),
    Extend(Extend),
    InnerJoin(InnerJoin),
    Order(Order),
    Limit(Limit),
    Distinct(Distinct),
    AssertUniqueKey(AssertUniqueKey),
    Empty(Empty),
    /// One row, no columns.
    True,
}

/// Hex suffix derived from a value's hash; stable for equal values.
pub fn unique_suffix<T: Hash + ?Sized>(value: &T) -> String {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    format!("{:08X}", hasher.finish() as u32)
}

impl Operator {
    pub fn table(table: TableName, columns: Vec<ScanColumn>) -> Arc<Operator> {
        Arc::new(Operator::Table(TableScan {
            table,
            columns,
            unique_keys: Vec::new(),
        }))
    }

    /// Table scan carrying the datatypes, nullability and keys of `def`.
    pub fn table_from_def(def: &TableDef) -> Arc<Operator> {
        let columns = def
            .columns
            .iter()
            .map(|c| ScanColumn {
                name: c.name.clone(),
                data_type: Some(c.data_type.clone()),
                nullable: c.nullable,
            })
            .collect();
        Arc::new(Operator::Table(TableScan {
            table: def.name.clone(),
            columns,
            unique_keys: def.all_unique_keys(),
        }))
    }

    pub fn raw_sql(sql: impl Into<String>, columns: ColumnList) -> Arc<Operator> {
        Arc::new(Operator::Sql(RawSql {
            sql: sql.into(),
            columns,
        }))
    }

    /// Wraps `input` under a new name. An alias of an alias keeps only the
    /// outer name.
    pub fn alias(input: Arc<Operator>, alias: TableName) -> Arc<Operator> {
        let input = match input.as_ref() {
            Operator::Alias(inner) => Arc::clone(&inner.input),
            _ => input,
        };
        Arc::new(Operator::Alias(Alias { input, alias }))
    }

    /// Alias named `<prefix><hash of input>`.
    pub fn alias_with_unique_name(input: Arc<Operator>, prefix: &str) -> Arc<Operator> {
        let name = format!("{}{}", prefix, unique_suffix(input.as_ref()));
        Operator::alias(input, TableName::unqualified(&name))
    }

    pub fn select(input: Arc<Operator>, condition: Expression) -> Arc<Operator> {
        Arc::new(Operator::Select(Select { input, condition }))
    }

    /// Projection onto `columns`, each resolved to the input's own
    /// (qualified) name where the input has it.
    pub fn project(input: Arc<Operator>, columns: &ColumnList) -> Arc<Operator> {
        let available = input.columns();
        let columns = columns
            .iter()
            .map(|c| available.get(c).unwrap_or(c).clone())
            .collect();
        Arc::new(Operator::Project(Project { input, columns }))
    }

    pub fn extend(input: Arc<Operator>, column: Identifier, expression: Expression) -> Arc<Operator> {
        Arc::new(Operator::Extend(Extend {
            input,
            column,
            expression,
        }))
    }

    /// Joins `inputs` on `conditions`. No inputs give the unit relation and a
    /// single input is returned as is, under a selection if conditions remain.
    pub fn inner_join(
        inputs: Vec<Arc<Operator>>,
        conditions: Vec<ColumnListEquality>,
    ) -> Arc<Operator> {
        let mut inputs = inputs;
        let mut conditions = conditions;
        conditions.sort();
        conditions.dedup();
        match inputs.len() {
            0 => Arc::new(Operator::True),
            1 => {
                let only = inputs.remove(0);
                if conditions.is_empty() {
                    only
                } else {
                    let condition =
                        Expression::conjunction(conditions.iter().map(|c| c.to_expression()));
                    Operator::select(only, condition)
                }
            }
            _ => {
                inputs.sort_by(|a, b| match (a.table_name(), b.table_name()) {
                    (Some(x), Some(y)) => x.cmp(y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                });
                Arc::new(Operator::InnerJoin(InnerJoin { inputs, conditions }))
            }
        }
    }

    pub fn order(input: Arc<Operator>, specs: Vec<OrderSpec>) -> Arc<Operator> {
        Arc::new(Operator::Order(Order { input, specs }))
    }

    pub fn limit(input: Arc<Operator>, limit: u64, from_end: bool) -> Arc<Operator> {
        Arc::new(Operator::Limit(Limit {
            input,
            limit,
            from_end,
        }))
    }

    pub fn distinct(input: Arc<Operator>) -> Arc<Operator> {
        Arc::new(Operator::Distinct(Distinct { input }))
    }

    pub fn assert_unique_key(input: Arc<Operator>, key: ColumnList) -> Arc<Operator> {
        Arc::new(Operator::AssertUniqueKey(AssertUniqueKey { input, key }))
    }

    pub fn empty(input: Arc<Operator>) -> Arc<Operator> {
        Arc::new(Operator::Empty(Empty { input }))
    }

    /// The name rows of this relation are qualified with, if it has one.
    pub fn table_name(&self) -> Option<&TableName> {
        match self {
            Operator::Table(t) => Some(&t.table),
            Operator::Alias(a) => Some(&a.alias),
            _ => None,
        }
    }

    /// Direct children in traversal order.
    pub fn children(&self) -> Vec<&Arc<Operator>> {
        match self {
            Operator::Table(_) | Operator::Sql(_) | Operator::True => Vec::new(),
            Operator::Alias(op) => vec![&op.input],
            Operator::Select(op) => vec![&op.input],
            Operator::Project(op) => vec![&op.input],
            Operator::Extend(op) => vec![&op.input],
            Operator::InnerJoin(op) => op.inputs.iter().collect(),
            Operator::Order(op) => vec![&op.input],
            Operator::Limit(op) => vec![&op.input],
            Operator::Distinct(op) => vec![&op.input],
            Operator::AssertUniqueKey(op) => vec![&op.input],
            Operator::Empty(op) => vec![&op.input],
        }
    }

    /// The ordered columns this operator produces. The compiler emits its
    /// select list in exactly this order.
    pub fn columns(&self) -> ColumnList {
        match self {
            Operator::Table(t) => t
                .columns
                .iter()
                .map(|c| ColumnName::qualified(&t.table, c.name.clone()))
                .collect(),
            Operator::Sql(s) => s.columns.clone(),
            Operator::Alias(a) => a.input.columns().requalify(&a.alias),
            Operator::Project(p) => p.columns.clone(),
            Operator::Extend(e) => {
                let mut columns = e.input.columns();
                columns.push(ColumnName::unqualified_name(e.column.clone()));
                columns
            }
            Operator::InnerJoin(j) => j
                .inputs
                .iter()
                .flat_map(|input| input.columns().as_slice().to_vec())
                .collect(),
            Operator::Select(op) => op.input.columns(),
            Operator::Order(op) => op.input.columns(),
            Operator::Limit(op) => op.input.columns(),
            Operator::Distinct(op) => op.input.columns(),
            Operator::AssertUniqueKey(op) => op.input.columns(),
            Operator::Empty(op) => op.input.columns(),
            Operator::True => ColumnList::empty(),
        }
    }

    /// Datatype of `column` as declared by the scan that produces it.
    pub fn column_type(&self, column: &ColumnName) -> Option<DataType> {
        match self {
            Operator::Table(t) => {
                if column.qualifier.as_ref().is_some_and(|q| q != &t.table) {
                    return None;
                }
                t.columns
                    .iter()
                    .find(|c| c.name == column.column)
                    .and_then(|c| c.data_type.clone())
            }
            Operator::Sql(_) | Operator::True => None,
            Operator::Alias(a) => {
                if column.qualifier.as_ref().is_some_and(|q| q != &a.alias) {
                    return None;
                }
                let inner = a.input.columns();
                let original = inner.get(&column.unqualified())?;
                a.input.column_type(original)
            }
            Operator::Extend(e) if column.column == e.column && !column.is_qualified() => None,
            Operator::InnerJoin(j) => j.inputs.iter().find_map(|input| input.column_type(column)),
            _ => self.children().first().and_then(|c| c.column_type(column)),
        }
    }

    fn label(&self) -> String {
        match self {
            Operator::Table(t) => format!("Table({})", t.table),
            Operator::Sql(s) => format!("Sql({})", s.sql),
            Operator::Alias(a) => format!("Alias({})", a.alias),
            Operator::Select(s) => format!("Select({})", s.condition),
            Operator::Project(p) => format!("Project({})", p.columns),
            Operator::Extend(e) => format!("Extend({} := {})", e.column, e.expression),
            Operator::InnerJoin(j) => {
                let conditions: Vec<String> = j.conditions.iter().map(|c| c.to_string()).collect();
                format!("InnerJoin({})", conditions.join(", "))
            }
            Operator::Order(o) => {
                let specs: Vec<String> = o
                    .specs
                    .iter()
                    .map(|s| {
                        if s.ascending {
                            s.expression.to_string()
                        } else {
                            format!("DESC({})", s.expression)
                        }
                    })
                    .collect();
                format!("Order({})", specs.join(", "))
            }
            Operator::Limit(l) if l.from_end => format!("Limit(last {})", l.limit),
            Operator::Limit(l) => format!("Limit({})", l.limit),
            Operator::Distinct(_) => "Distinct".to_string(),
            Operator::AssertUniqueKey(a) => format!("AssertUniqueKey({})", a.key),
            Operator::Empty(_) => "Empty".to_string(),
            Operator::True => "True".to_string(),
        }
    }

    fn fmt_with_tree(
        &self,
        f: &mut fmt::Formatter<'_>,
        prefix: &str,
        is_last: bool,
        is_root: bool,
    ) -> fmt::Result {
        let (branch, next_prefix) = if is_last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };

        if is_root {
            writeln!(f, "{}", self.label())?;
        } else {
            writeln!(f, "{}{}{}", prefix, branch, self.label())?;
        }

        let children = self.children();
        let child_prefix = if is_root {
            String::new()
        } else {
            format!("{}{}", prefix, next_prefix)
        };
        for (i, child) in children.iter().enumerate() {
            child.fmt_with_tree(f, &child_prefix, i + 1 == children.len(), false)?;
        }
        Ok(())
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_with_tree(f, "", true, true)
    }
}

#[cfg(test)]
mod logical_plan_tests {
    use super::*;

    pub(crate) fn scan(table: &str, columns: &[&str]) -> Arc<Operator> {
        Operator::table(
            TableName::unqualified(table),
            columns
                .iter()
                .map(|c| ScanColumn {
                    name: Identifier::undelimited(*c),
                    data_type: None,
                    nullable: true,
                })
                .collect(),
        )
    }

    #[test]
    fn test_alias_of_alias_keeps_outer_name() {
        let inner = Operator::alias(scan("t", &["a"]), TableName::unqualified("x"));
        let outer = Operator::alias(inner, TableName::unqualified("y"));
        match outer.as_ref() {
            Operator::Alias(a) => {
                assert_eq!(a.alias, TableName::unqualified("y"));
                assert!(matches!(a.input.as_ref(), Operator::Table(_)));
            }
            other => panic!("expected alias, got {:?}", other),
        }
        assert_eq!(outer.columns(), ColumnList::new(vec![ColumnName::of("y", "a")]));
    }

    #[test]
    fn test_join_normalisation() {
        assert!(matches!(Operator::inner_join(vec![], vec![]).as_ref(), Operator::True));
        let single = scan("t", &["a"]);
        assert_eq!(Operator::inner_join(vec![Arc::clone(&single)], vec![]), single);

        let join = Operator::inner_join(vec![scan("u", &["b"]), scan("t", &["a"])], vec![]);
        assert_eq!(
            join.columns(),
            ColumnList::new(vec![ColumnName::of("t", "a"), ColumnName::of("u", "b")])
        );
    }

    #[test]
    fn test_extend_adds_unqualified_column() {
        let expr = Expression::column(ColumnName::of("t", "a"));
        let name = Extend::unique_name_for(&expr);
        assert!(name.name().starts_with("EXPR"));
        assert_eq!(name, Extend::unique_name_for(&expr));
        let extended = Operator::extend(scan("t", &["a"]), name.clone(), expr);
        let columns = extended.columns();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns.as_slice()[1], ColumnName::unqualified_name(name));
    }

    #[test]
    fn test_project_resolves_against_input() {
        let a = ColumnName::unqualified_name(Identifier::undelimited("a"));
        let project = Operator::project(scan("t", &["a", "b"]), &ColumnList::new(vec![a]));
        assert_eq!(project.columns(), ColumnList::new(vec![ColumnName::of("t", "a")]));
    }

    #[test]
    fn test_column_type_through_alias() {
        let table = Operator::table(
            TableName::unqualified("t"),
            vec![ScanColumn {
                name: Identifier::undelimited("n"),
                data_type: Some(DataType::exact_numeric("INTEGER")),
                nullable: false,
            }],
        );
        let aliased = Operator::alias(table, TableName::unqualified("x"));
        let data_type = aliased.column_type(&ColumnName::of("x", "n")).unwrap();
        assert_eq!(data_type.name, "INTEGER");
        assert!(aliased.column_type(&ColumnName::of("t", "n")).is_none());
    }

    #[test]
    fn test_display_tree() {
        let plan = Operator::limit(Operator::distinct(scan("t", &["a"])), 5, false);
        let rendered = plan.to_string();
        assert_eq!(rendered, "Limit(5)\n└── Distinct\n    └── Table(t)\n");
    }

    #[test]
    fn test_json_round_trip_keeps_structure() {
        let plan = Operator::select(
            scan("t", &["a"]),
            Expression::equal(
                Expression::column(ColumnName::of("t", "a")),
                Expression::constant("x", None),
            ),
        );
        let json = serde_json::to_string(plan.as_ref()).unwrap();
        assert!(json.contains("\"op\":\"select\""), "{}", json);
        let back: Operator = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, plan.as_ref());
    }
}
