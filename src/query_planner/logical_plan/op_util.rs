//! Structural facts about operator trees used by the rewrite passes.

use crate::db_schema::names::ColumnName;

use super::Operator;

/// True when the relation is known to have no rows.
pub fn is_empty(op: &Operator) -> bool {
    match op {
        Operator::Empty(_) => true,
        Operator::Limit(limit) if limit.limit == 0 && !limit.from_end => true,
        Operator::Select(select) if select.condition.is_false() => true,
        Operator::InnerJoin(join) => join.inputs.iter().any(|input| is_empty(input)),
        Operator::Table(_) | Operator::Sql(_) | Operator::True => false,
        other => other.children().iter().any(|child| is_empty(child)),
    }
}

/// True when the relation is exactly one row with no columns.
pub fn is_trivial(op: &Operator) -> bool {
    match op {
        Operator::True => true,
        Operator::Table(_) | Operator::Sql(_) | Operator::Empty(_) => false,
        Operator::Select(select) => select.condition.is_true() && is_trivial(&select.input),
        Operator::Project(project) => project.columns.is_empty() && is_trivial(&project.input),
        Operator::Extend(_) => false,
        Operator::InnerJoin(join) => join.inputs.iter().all(|input| is_trivial(input)),
        other => other.children().iter().all(|child| is_trivial(child)),
    }
}

/// True when `column` is known to hold the same value in every row.
///
/// Columns the relation does not have count as constant (always `NULL`).
/// Ambiguous references and anything else not provably constant are
/// reported as varying.
pub fn is_constant_column(op: &Operator, column: &ColumnName) -> bool {
    let columns = op.columns();
    if columns.is_ambiguous(column) {
        return false;
    }
    if !columns.contains(column) {
        return true;
    }
    match op {
        Operator::Empty(_) => true,
        Operator::Table(_) | Operator::Sql(_) | Operator::True => false,
        Operator::Limit(limit) if limit.limit <= 1 && !limit.from_end => true,
        Operator::Select(select) => {
            select.condition.forces_constant(column) || is_constant_column(&select.input, column)
        }
        Operator::Extend(extend) if !column.is_qualified() && column.column == extend.column => {
            extend.expression.is_constant()
                || extend
                    .expression
                    .columns()
                    .iter()
                    .all(|c| is_constant_column(&extend.input, c))
        }
        Operator::Alias(alias) => {
            let inner = alias.input.columns();
            match inner.get(&column.unqualified()) {
                Some(original) => is_constant_column(&alias.input, original),
                None => false,
            }
        }
        Operator::InnerJoin(join) => join
            .inputs
            .iter()
            .find(|input| input.columns().get(column).is_some())
            .is_some_and(|input| is_constant_column(input, column)),
        other => other
            .children()
            .first()
            .is_some_and(|child| is_constant_column(child, column)),
    }
}
