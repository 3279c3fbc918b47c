//! Generic tree-to-tree rewriting.
//!
//! An [`OpMutator`] gets one `enter_*`/`leave_*` pair per composite operator
//! and one `visit_*` hook per leaf. The defaults rebuild every node from its
//! rewritten children, so an implementation overrides only the shapes it
//! cares about. Returning `false` from `enter_*` skips the subtree: the
//! matching `leave_*` then receives the *original* children.
//!
//! [`mutate`] drives the traversal with an explicit result stack. Each leaf
//! pushes one node, each `leave_*` pops exactly its own children and pushes
//! the rebuilt node. A traversal that does not end with exactly one result is
//! reported as [`MutatorError::UnbalancedStack`].

use std::sync::Arc;

use super::{
    errors::MutatorError,
    logical_plan::{
        visitor::{walk, OperatorVisitor},
        Alias, AssertUniqueKey, Distinct, Empty, Extend, InnerJoin, Limit, Operator, Order,
        Project, RawSql, Select, TableScan,
    },
};

/// Returns `original` when the rewritten child is the same node, so untouched
/// subtrees keep sharing memory with the input tree.
fn rebuild_or_clone(
    original: &Arc<Operator>,
    old_child: &Arc<Operator>,
    new_child: Arc<Operator>,
    rebuild: impl FnOnce(Arc<Operator>) -> Arc<Operator>,
) -> Arc<Operator> {
    if Arc::ptr_eq(old_child, &new_child) {
        Arc::clone(original)
    } else {
        rebuild(new_child)
    }
}

pub trait OpMutator {
    fn visit_table(&mut self, original: &Arc<Operator>, _op: &TableScan) -> Arc<Operator> {
        Arc::clone(original)
    }

    fn visit_sql(&mut self, original: &Arc<Operator>, _op: &RawSql) -> Arc<Operator> {
        Arc::clone(original)
    }

    fn visit_true(&mut self, original: &Arc<Operator>) -> Arc<Operator> {
        Arc::clone(original)
    }

    fn enter_alias(&mut self, _op: &Alias) -> bool {
        true
    }

    fn leave_alias(
        &mut self,
        original: &Arc<Operator>,
        op: &Alias,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        rebuild_or_clone(original, &op.input, child, |c| {
            Operator::alias(c, op.alias.clone())
        })
    }

    fn enter_select(&mut self, _op: &Select) -> bool {
        true
    }

    fn leave_select(
        &mut self,
        original: &Arc<Operator>,
        op: &Select,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        rebuild_or_clone(original, &op.input, child, |c| {
            Operator::select(c, op.condition.clone())
        })
    }

    fn enter_project(&mut self, _op: &Project) -> bool {
        true
    }

    fn leave_project(
        &mut self,
        original: &Arc<Operator>,
        op: &Project,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        rebuild_or_clone(original, &op.input, child, |c| {
            Operator::project(c, &op.columns)
        })
    }

    fn enter_extend(&mut self, _op: &Extend) -> bool {
        true
    }

    fn leave_extend(
        &mut self,
        original: &Arc<Operator>,
        op: &Extend,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        rebuild_or_clone(original, &op.input, child, |c| {
            Operator::extend(c, op.column.clone(), op.expression.clone())
        })
    }

    fn enter_inner_join(&mut self, _op: &InnerJoin) -> bool {
        true
    }

    fn leave_inner_join(
        &mut self,
        original: &Arc<Operator>,
        op: &InnerJoin,
        children: Vec<Arc<Operator>>,
    ) -> Arc<Operator> {
        let unchanged = children.len() == op.inputs.len()
            && children
                .iter()
                .zip(op.inputs.iter())
                .all(|(new, old)| Arc::ptr_eq(new, old));
        if unchanged {
            Arc::clone(original)
        } else {
            Operator::inner_join(children, op.conditions.clone())
        }
    }

    fn enter_order(&mut self, _op: &Order) -> bool {
        true
    }

    fn leave_order(
        &mut self,
        original: &Arc<Operator>,
        op: &Order,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        rebuild_or_clone(original, &op.input, child, |c| {
            Operator::order(c, op.specs.clone())
        })
    }

    fn enter_limit(&mut self, _op: &Limit) -> bool {
        true
    }

    fn leave_limit(
        &mut self,
        original: &Arc<Operator>,
        op: &Limit,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        rebuild_or_clone(original, &op.input, child, |c| {
            Operator::limit(c, op.limit, op.from_end)
        })
    }

    fn enter_distinct(&mut self, _op: &Distinct) -> bool {
        true
    }

    fn leave_distinct(
        &mut self,
        original: &Arc<Operator>,
        op: &Distinct,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        rebuild_or_clone(original, &op.input, child, Operator::distinct)
    }

    fn enter_assert_unique_key(&mut self, _op: &AssertUniqueKey) -> bool {
        true
    }

    fn leave_assert_unique_key(
        &mut self,
        original: &Arc<Operator>,
        op: &AssertUniqueKey,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        rebuild_or_clone(original, &op.input, child, |c| {
            Operator::assert_unique_key(c, op.key.clone())
        })
    }

    fn enter_empty(&mut self, _op: &Empty) -> bool {
        true
    }

    fn leave_empty(
        &mut self,
        original: &Arc<Operator>,
        op: &Empty,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        rebuild_or_clone(original, &op.input, child, Operator::empty)
    }
}

/// Stack bookkeeping around an [`OpMutator`].
struct Driver<'m, M: OpMutator + ?Sized> {
    mutator: &'m mut M,
    results: Vec<Arc<Operator>>,
}

impl<M: OpMutator + ?Sized> Driver<'_, M> {
    fn unbalanced(&self, expected: usize, during: &'static str) -> MutatorError {
        let found = self.results.len();
        log::error!(
            "Rewrite stack unbalanced while leaving {}: expected {}, found {}",
            during,
            expected,
            found
        );
        MutatorError::UnbalancedStack {
            expected,
            found,
            during,
        }
    }

    fn pop(&mut self, during: &'static str) -> Result<Arc<Operator>, MutatorError> {
        match self.results.pop() {
            Some(result) => Ok(result),
            None => Err(self.unbalanced(1, during)),
        }
    }

    fn pop_many(
        &mut self,
        count: usize,
        during: &'static str,
    ) -> Result<Vec<Arc<Operator>>, MutatorError> {
        if self.results.len() < count {
            return Err(self.unbalanced(count, during));
        }
        let at = self.results.len() - count;
        Ok(self.results.split_off(at))
    }

    /// Shared `enter_*` handling for single-input operators.
    fn enter_unary(&mut self, descend: bool, input: &Arc<Operator>) -> bool {
        if !descend {
            self.results.push(Arc::clone(input));
        }
        descend
    }
}

impl<M: OpMutator + ?Sized> OperatorVisitor for Driver<'_, M> {
    type Error = MutatorError;

    fn visit_table(&mut self, node: &Arc<Operator>, op: &TableScan) -> Result<(), MutatorError> {
        let result = self.mutator.visit_table(node, op);
        self.results.push(result);
        Ok(())
    }

    fn visit_sql(&mut self, node: &Arc<Operator>, op: &RawSql) -> Result<(), MutatorError> {
        let result = self.mutator.visit_sql(node, op);
        self.results.push(result);
        Ok(())
    }

    fn visit_true(&mut self, node: &Arc<Operator>) -> Result<(), MutatorError> {
        let result = self.mutator.visit_true(node);
        self.results.push(result);
        Ok(())
    }

    fn enter_alias(&mut self, _node: &Arc<Operator>, op: &Alias) -> Result<bool, MutatorError> {
        let descend = self.mutator.enter_alias(op);
        Ok(self.enter_unary(descend, &op.input))
    }

    fn leave_alias(&mut self, node: &Arc<Operator>, op: &Alias) -> Result<(), MutatorError> {
        let child = self.pop("Alias")?;
        let result = self.mutator.leave_alias(node, op, child);
        self.results.push(result);
        Ok(())
    }

    fn enter_select(&mut self, _node: &Arc<Operator>, op: &Select) -> Result<bool, MutatorError> {
        let descend = self.mutator.enter_select(op);
        Ok(self.enter_unary(descend, &op.input))
    }

    fn leave_select(&mut self, node: &Arc<Operator>, op: &Select) -> Result<(), MutatorError> {
        let child = self.pop("Select")?;
        let result = self.mutator.leave_select(node, op, child);
        self.results.push(result);
        Ok(())
    }

    fn enter_project(&mut self, _node: &Arc<Operator>, op: &Project) -> Result<bool, MutatorError> {
        let descend = self.mutator.enter_project(op);
        Ok(self.enter_unary(descend, &op.input))
    }

    fn leave_project(&mut self, node: &Arc<Operator>, op: &Project) -> Result<(), MutatorError> {
        let child = self.pop("Project")?;
        let result = self.mutator.leave_project(node, op, child);
        self.results.push(result);
        Ok(())
    }

    fn enter_extend(&mut self, _node: &Arc<Operator>, op: &Extend) -> Result<bool, MutatorError> {
        let descend = self.mutator.enter_extend(op);
        Ok(self.enter_unary(descend, &op.input))
    }

    fn leave_extend(&mut self, node: &Arc<Operator>, op: &Extend) -> Result<(), MutatorError> {
        let child = self.pop("Extend")?;
        let result = self.mutator.leave_extend(node, op, child);
        self.results.push(result);
        Ok(())
    }

    fn enter_inner_join(
        &mut self,
        _node: &Arc<Operator>,
        op: &InnerJoin,
    ) -> Result<bool, MutatorError> {
        let descend = self.mutator.enter_inner_join(op);
        if !descend {
            self.results.extend(op.inputs.iter().cloned());
        }
        Ok(descend)
    }

    fn leave_inner_join(&mut self, node: &Arc<Operator>, op: &InnerJoin) -> Result<(), MutatorError> {
        let children = self.pop_many(op.inputs.len(), "InnerJoin")?;
        let result = self.mutator.leave_inner_join(node, op, children);
        self.results.push(result);
        Ok(())
    }

    fn enter_order(&mut self, _node: &Arc<Operator>, op: &Order) -> Result<bool, MutatorError> {
        let descend = self.mutator.enter_order(op);
        Ok(self.enter_unary(descend, &op.input))
    }

    fn leave_order(&mut self, node: &Arc<Operator>, op: &Order) -> Result<(), MutatorError> {
        let child = self.pop("Order")?;
        let result = self.mutator.leave_order(node, op, child);
        self.results.push(result);
        Ok(())
    }

    fn enter_limit(&mut self, _node: &Arc<Operator>, op: &Limit) -> Result<bool, MutatorError> {
        let descend = self.mutator.enter_limit(op);
        Ok(self.enter_unary(descend, &op.input))
    }

    fn leave_limit(&mut self, node: &Arc<Operator>, op: &Limit) -> Result<(), MutatorError> {
        let child = self.pop("Limit")?;
        let result = self.mutator.leave_limit(node, op, child);
        self.results.push(result);
        Ok(())
    }

    fn enter_distinct(&mut self, _node: &Arc<Operator>, op: &Distinct) -> Result<bool, MutatorError> {
        let descend = self.mutator.enter_distinct(op);
        Ok(self.enter_unary(descend, &op.input))
    }

    fn leave_distinct(&mut self, node: &Arc<Operator>, op: &Distinct) -> Result<(), MutatorError> {
        let child = self.pop("Distinct")?;
        let result = self.mutator.leave_distinct(node, op, child);
        self.results.push(result);
        Ok(())
    }

    fn enter_assert_unique_key(
        &mut self,
        _node: &Arc<Operator>,
        op: &AssertUniqueKey,
    ) -> Result<bool, MutatorError> {
        let descend = self.mutator.enter_assert_unique_key(op);
        Ok(self.enter_unary(descend, &op.input))
    }

    fn leave_assert_unique_key(
        &mut self,
        node: &Arc<Operator>,
        op: &AssertUniqueKey,
    ) -> Result<(), MutatorError> {
        let child = self.pop("AssertUniqueKey")?;
        let result = self.mutator.leave_assert_unique_key(node, op, child);
        self.results.push(result);
        Ok(())
    }

    fn enter_empty(&mut self, _node: &Arc<Operator>, op: &Empty) -> Result<bool, MutatorError> {
        let descend = self.mutator.enter_empty(op);
        Ok(self.enter_unary(descend, &op.input))
    }

    fn leave_empty(&mut self, node: &Arc<Operator>, op: &Empty) -> Result<(), MutatorError> {
        let child = self.pop("Empty")?;
        let result = self.mutator.leave_empty(node, op, child);
        self.results.push(result);
        Ok(())
    }
}

/// Runs `mutator` over `plan` and returns the rewritten tree.
pub fn mutate<M: OpMutator + ?Sized>(
    mutator: &mut M,
    plan: &Arc<Operator>,
) -> Result<Arc<Operator>, MutatorError> {
    let mut driver = Driver {
        mutator,
        results: Vec::new(),
    };
    walk(plan, &mut driver)?;
    if driver.results.len() != 1 {
        return Err(driver.unbalanced(1, "root"));
    }
    driver.pop("root")
}
