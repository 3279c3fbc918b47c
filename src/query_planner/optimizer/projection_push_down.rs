//! Restricts a tree to a required column list.
//!
//! The projection is pushed through computed-column extensions, limits and
//! empty relations, merged into an existing projection, and pushed inside a
//! `DISTINCT` when every column it drops is constant. Joins, selections,
//! orderings and aliases are wrapped as they are.
//!
//! A `DISTINCT` that would lose a varying column cannot be narrowed in place:
//! it becomes an aliased subquery with the projection on top, and the pass
//! returns a [`Renamer`] from the old column names to the alias.

use std::sync::Arc;

use crate::{
    db_schema::{
        column_list::ColumnList,
        names::{ColumnName, TableName},
    },
    query_planner::{
        logical_plan::{
            op_util, unique_suffix, Alias, AssertUniqueKey, Distinct, Extend, InnerJoin, Operator,
            Order, Project, RawSql, Select, TableScan,
        },
        mutator::{mutate, OpMutator},
        optimizer::{
            errors::{OptimizerError, Pass},
            optimizer_pass::{OptimizerPass, OptimizerResult, Rewrite},
        },
        renamer::Renamer,
    },
};

pub const DEFAULT_ALIAS_PREFIX: &str = "PROJECT";

pub struct ProjectionPushDown {
    columns: ColumnList,
    alias_prefix: String,
}

impl ProjectionPushDown {
    pub fn new(columns: ColumnList) -> Self {
        ProjectionPushDown {
            columns,
            alias_prefix: DEFAULT_ALIAS_PREFIX.to_string(),
        }
    }

    /// Prefix for the subquery alias created around a `DISTINCT`.
    pub fn with_alias_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.alias_prefix = prefix.into();
        self
    }
}

impl OptimizerPass for ProjectionPushDown {
    fn optimize(&self, plan: Arc<Operator>) -> OptimizerResult<Rewrite> {
        log::debug!("ProjectionPushDown: projecting onto {}", self.columns);
        let mut projecter = Projecter {
            base: self.columns.clone(),
            required: Vec::new(),
            alias_prefix: &self.alias_prefix,
            renamer: Renamer::identity(),
            distinct_descended: Vec::new(),
        };
        let result = mutate(&mut projecter, &plan)
            .map_err(OptimizerError::mutator(Pass::ProjectionPushDown))?;
        Ok(Rewrite::compare(&plan, result, projecter.renamer))
    }
}

/// `plan` restricted to `columns`, plus the renaming the caller has to apply
/// to anything referring to `plan`'s columns.
pub fn apply(
    plan: Arc<Operator>,
    columns: &ColumnList,
) -> OptimizerResult<(Arc<Operator>, Renamer)> {
    Ok(ProjectionPushDown::new(columns.clone())
        .optimize(plan)?
        .into_parts())
}

struct Projecter<'a> {
    base: ColumnList,
    /// Columns required below each extension currently being descended.
    required: Vec<ColumnList>,
    alias_prefix: &'a str,
    renamer: Renamer,
    distinct_descended: Vec<bool>,
}

fn is_extension_column(column: &ColumnName, extend: &Extend) -> bool {
    !column.is_qualified() && column.column == extend.column
}

impl Projecter<'_> {
    fn required(&self) -> &ColumnList {
        self.required.last().unwrap_or(&self.base)
    }

    fn wrap(&self, original: &Arc<Operator>) -> Arc<Operator> {
        Operator::project(Arc::clone(original), self.required())
    }

    fn keeps(&self, extend: &Extend) -> bool {
        self.required()
            .iter()
            .any(|column| is_extension_column(column, extend))
    }
}

impl OpMutator for Projecter<'_> {
    fn visit_table(&mut self, original: &Arc<Operator>, _op: &TableScan) -> Arc<Operator> {
        self.wrap(original)
    }

    fn visit_sql(&mut self, original: &Arc<Operator>, _op: &RawSql) -> Arc<Operator> {
        self.wrap(original)
    }

    fn visit_true(&mut self, original: &Arc<Operator>) -> Arc<Operator> {
        self.wrap(original)
    }

    fn enter_inner_join(&mut self, _op: &InnerJoin) -> bool {
        false
    }

    fn leave_inner_join(
        &mut self,
        original: &Arc<Operator>,
        _op: &InnerJoin,
        _children: Vec<Arc<Operator>>,
    ) -> Arc<Operator> {
        self.wrap(original)
    }

    fn enter_select(&mut self, _op: &Select) -> bool {
        false
    }

    fn leave_select(
        &mut self,
        original: &Arc<Operator>,
        _op: &Select,
        _child: Arc<Operator>,
    ) -> Arc<Operator> {
        self.wrap(original)
    }

    fn enter_order(&mut self, _op: &Order) -> bool {
        false
    }

    fn leave_order(
        &mut self,
        original: &Arc<Operator>,
        _op: &Order,
        _child: Arc<Operator>,
    ) -> Arc<Operator> {
        self.wrap(original)
    }

    fn enter_alias(&mut self, _op: &Alias) -> bool {
        false
    }

    fn leave_alias(
        &mut self,
        original: &Arc<Operator>,
        _op: &Alias,
        _child: Arc<Operator>,
    ) -> Arc<Operator> {
        self.wrap(original)
    }

    fn enter_project(&mut self, _op: &Project) -> bool {
        false
    }

    fn leave_project(
        &mut self,
        _original: &Arc<Operator>,
        op: &Project,
        _child: Arc<Operator>,
    ) -> Arc<Operator> {
        let columns = op.columns.intersect_ordered(self.required());
        Operator::project(Arc::clone(&op.input), &columns)
    }

    fn enter_extend(&mut self, op: &Extend) -> bool {
        let keep = self.keeps(op);
        let mut below: ColumnList = self
            .required()
            .iter()
            .filter(|column| !is_extension_column(column, op))
            .cloned()
            .collect();
        if keep {
            for column in op.expression.columns() {
                if !below.contains(&column) {
                    below.push(column);
                }
            }
        }
        self.required.push(below);
        true
    }

    fn leave_extend(
        &mut self,
        _original: &Arc<Operator>,
        op: &Extend,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        self.required.pop();
        if self.keeps(op) {
            Operator::extend(child, op.column.clone(), op.expression.clone())
        } else {
            log::trace!("ProjectionPushDown: dropping unused extension {}", op.column);
            child
        }
    }

    fn enter_distinct(&mut self, op: &Distinct) -> bool {
        let required = self.required();
        let descend = op
            .input
            .columns()
            .iter()
            .filter(|column| !required.contains(column))
            .all(|column| op_util::is_constant_column(&op.input, column));
        self.distinct_descended.push(descend);
        descend
    }

    fn leave_distinct(
        &mut self,
        original: &Arc<Operator>,
        _op: &Distinct,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        if self.distinct_descended.pop().unwrap_or(false) {
            return Operator::distinct(child);
        }
        let name = format!("{}{}", self.alias_prefix, unique_suffix(original.as_ref()));
        let alias_name = TableName::unqualified(&name);
        log::debug!(
            "ProjectionPushDown: DISTINCT drops varying columns, projecting over subquery {}",
            alias_name
        );
        let alias = Operator::alias(Arc::clone(original), alias_name.clone());
        self.renamer = Renamer::to_alias(alias_name);
        let columns = self.renamer.apply_to_columns(self.required());
        Operator::project(alias, &columns)
    }

    fn leave_assert_unique_key(
        &mut self,
        _original: &Arc<Operator>,
        op: &AssertUniqueKey,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        let available = child.columns();
        if op.key.iter().all(|column| available.contains(column)) {
            Operator::assert_unique_key(child, op.key.clone())
        } else {
            child
        }
    }
}
