use std::sync::Arc;

use crate::query_planner::{
    logical_plan::{
        Alias, Empty, InnerJoin, Limit, Operator, Order, Project, RawSql, Select, TableScan,
    },
    mutator::{mutate, OpMutator},
    optimizer::{
        errors::{OptimizerError, Pass},
        optimizer_pass::{OptimizerPass, OptimizerResult, Rewrite},
    },
    renamer::Renamer,
};

/// Caps the number of rows of a tree.
///
/// Descends through `DISTINCT`, extensions and key assertions, merges with a
/// limit of the same direction by taking the smaller cap, and leaves empty
/// relations alone. Everything else is wrapped.
pub struct LimitInsertion {
    limit: u64,
    from_end: bool,
}

impl LimitInsertion {
    pub fn new(limit: u64) -> Self {
        LimitInsertion {
            limit,
            from_end: false,
        }
    }

    /// Cap counted from the end of the relation.
    pub fn from_end(limit: u64) -> Self {
        LimitInsertion {
            limit,
            from_end: true,
        }
    }
}

impl OptimizerPass for LimitInsertion {
    fn optimize(&self, plan: Arc<Operator>) -> OptimizerResult<Rewrite> {
        log::debug!(
            "LimitInsertion: limit {} (from end: {})",
            self.limit,
            self.from_end
        );
        let mut limiter = Limiter {
            limit: self.limit,
            from_end: self.from_end,
        };
        let result =
            mutate(&mut limiter, &plan).map_err(OptimizerError::mutator(Pass::LimitInsertion))?;
        Ok(Rewrite::compare(&plan, result, Renamer::identity()))
    }
}

pub fn apply(plan: Arc<Operator>, limit: u64) -> OptimizerResult<Arc<Operator>> {
    Ok(LimitInsertion::new(limit).optimize(plan)?.plan)
}

/// Turns the outermost limits on every path into limits of the opposite
/// direction, so a cap counted from the end can be applied to a reversed
/// ordering.
pub fn swap_limits(plan: Arc<Operator>) -> OptimizerResult<Arc<Operator>> {
    mutate(&mut LimitSwapper, &plan).map_err(OptimizerError::mutator(Pass::LimitInsertion))
}

struct Limiter {
    limit: u64,
    from_end: bool,
}

impl Limiter {
    fn wrap(&self, original: &Arc<Operator>) -> Arc<Operator> {
        Operator::limit(Arc::clone(original), self.limit, self.from_end)
    }
}

impl OpMutator for Limiter {
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
        op: &Limit,
        _child: Arc<Operator>,
    ) -> Arc<Operator> {
        if op.from_end != self.from_end {
            return self.wrap(original);
        }
        if op.limit <= self.limit {
            return Arc::clone(original);
        }
        Operator::limit(Arc::clone(&op.input), self.limit, self.from_end)
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
}

struct LimitSwapper;

impl OpMutator for LimitSwapper {
    fn enter_limit(&mut self, _op: &Limit) -> bool {
        false
    }

    fn leave_limit(
        &mut self,
        _original: &Arc<Operator>,
        op: &Limit,
        _child: Arc<Operator>,
    ) -> Arc<Operator> {
        Operator::limit(Arc::clone(&op.input), op.limit, !op.from_end)
    }
}
