use std::sync::Arc;

use crate::query_planner::{
    logical_expr::Expression,
    logical_plan::{
        Alias, AssertUniqueKey, Distinct, Empty, Extend, InnerJoin, Limit, Operator, Order,
        Project, RawSql, Select, TableScan,
    },
    mutator::{mutate, OpMutator},
    optimizer::{
        errors::{OptimizerError, Pass},
        optimizer_pass::{OptimizerPass, OptimizerResult, Rewrite},
    },
    renamer::Renamer,
};

/// Filters a tree by a condition. The condition is merged into a selection
/// already at the top of the tree; anything else is wrapped. An unsatisfiable
/// condition turns the tree into an empty relation.
pub struct SelectionInsertion {
    condition: Expression,
}

impl SelectionInsertion {
    pub fn new(condition: Expression) -> Self {
        SelectionInsertion { condition }
    }
}

impl OptimizerPass for SelectionInsertion {
    fn optimize(&self, plan: Arc<Operator>) -> OptimizerResult<Rewrite> {
        if self.condition.is_true() {
            return Ok(Rewrite::unchanged(plan));
        }
        log::debug!("SelectionInsertion: inserting {}", self.condition);
        let mut inserter = Inserter {
            condition: &self.condition,
        };
        let result =
            mutate(&mut inserter, &plan).map_err(OptimizerError::mutator(Pass::SelectionInsertion))?;
        Ok(Rewrite::compare(&plan, result, Renamer::identity()))
    }
}

pub fn apply(
    plan: Arc<Operator>,
    condition: &Expression,
) -> OptimizerResult<(Arc<Operator>, Renamer)> {
    Ok(SelectionInsertion::new(condition.clone())
        .optimize(plan)?
        .into_parts())
}

/// Every `enter_*` hook refuses to descend: only the root is ever rewritten.
struct Inserter<'a> {
    condition: &'a Expression,
}

impl Inserter<'_> {
    fn wrap(&self, original: &Arc<Operator>) -> Arc<Operator> {
        if self.condition.is_false() {
            Operator::empty(Arc::clone(original))
        } else {
            Operator::select(Arc::clone(original), self.condition.clone())
        }
    }
}

impl OpMutator for Inserter<'_> {
    fn visit_table(&mut self, original: &Arc<Operator>, _op: &TableScan) -> Arc<Operator> {
        self.wrap(original)
    }

    fn visit_sql(&mut self, original: &Arc<Operator>, _op: &RawSql) -> Arc<Operator> {
        self.wrap(original)
    }

    fn visit_true(&mut self, original: &Arc<Operator>) -> Arc<Operator> {
        self.wrap(original)
    }

    fn enter_select(&mut self, _op: &Select) -> bool {
        false
    }

    fn leave_select(
        &mut self,
        _original: &Arc<Operator>,
        op: &Select,
        _child: Arc<Operator>,
    ) -> Arc<Operator> {
        let merged = op.condition.clone().and(self.condition.clone());
        if merged.is_false() {
            Operator::empty(Arc::clone(&op.input))
        } else {
            Operator::select(Arc::clone(&op.input), merged)
        }
    }

    fn enter_empty(&mut self, _op: &Empty) -> bool {
        false
    }

    fn leave_empty(
        &mut self,
        original: &Arc<Operator>,
        _op: &Empty,
        _child: Arc<Operator>,
    ) -> Arc<Operator> {
        Arc::clone(original)
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
        original: &Arc<Operator>,
        _op: &Project,
        _child: Arc<Operator>,
    ) -> Arc<Operator> {
        self.wrap(original)
    }

    fn enter_extend(&mut self, _op: &Extend) -> bool {
        false
    }

    fn leave_extend(
        &mut self,
        original: &Arc<Operator>,
        _op: &Extend,
        _child: Arc<Operator>,
    ) -> Arc<Operator> {
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

    fn enter_limit(&mut self, _op: &Limit) -> bool {
        false
    }

    fn leave_limit(
        &mut self,
        original: &Arc<Operator>,
        _op: &Limit,
        _child: Arc<Operator>,
    ) -> Arc<Operator> {
        self.wrap(original)
    }

    fn enter_distinct(&mut self, _op: &Distinct) -> bool {
        false
    }

    fn leave_distinct(
        &mut self,
        original: &Arc<Operator>,
        _op: &Distinct,
        _child: Arc<Operator>,
    ) -> Arc<Operator> {
        self.wrap(original)
    }

    fn enter_assert_unique_key(&mut self, _op: &AssertUniqueKey) -> bool {
        false
    }

    fn leave_assert_unique_key(
        &mut self,
        original: &Arc<Operator>,
        _op: &AssertUniqueKey,
        _child: Arc<Operator>,
    ) -> Arc<Operator> {
        self.wrap(original)
    }
}
