//! Two-phase traversal over operator trees.
//!
//! Composite operators are *entered* before their children and *left* after
//! them; leaves are visited once. An `enter_*` hook returning `false` skips
//! the children, but the matching `leave_*` hook is still called so visitors
//! that keep a stack stay balanced.
//!
//! # Example
//!
//! ```ignore
//! struct TableCounter(usize);
//!
//! impl OperatorVisitor for TableCounter {
//!     type Error = std::convert::Infallible;
//!
//!     fn visit_table(&mut self, _: &Arc<Operator>, _: &TableScan) -> Result<(), Self::Error> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//! }
//!
//! let mut counter = TableCounter(0);
//! walk(&plan, &mut counter)?;
//! ```

use std::sync::Arc;

use super::{
    Alias, AssertUniqueKey, Distinct, Empty, Extend, InnerJoin, Limit, Operator, Order, Project,
    RawSql, Select, TableScan,
};

pub trait OperatorVisitor {
    type Error;

    fn visit_table(&mut self, _node: &Arc<Operator>, _op: &TableScan) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_sql(&mut self, _node: &Arc<Operator>, _op: &RawSql) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_true(&mut self, _node: &Arc<Operator>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_alias(&mut self, _node: &Arc<Operator>, _op: &Alias) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn leave_alias(&mut self, _node: &Arc<Operator>, _op: &Alias) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_select(&mut self, _node: &Arc<Operator>, _op: &Select) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn leave_select(&mut self, _node: &Arc<Operator>, _op: &Select) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_project(&mut self, _node: &Arc<Operator>, _op: &Project) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn leave_project(&mut self, _node: &Arc<Operator>, _op: &Project) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_extend(&mut self, _node: &Arc<Operator>, _op: &Extend) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn leave_extend(&mut self, _node: &Arc<Operator>, _op: &Extend) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_inner_join(
        &mut self,
        _node: &Arc<Operator>,
        _op: &InnerJoin,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn leave_inner_join(&mut self, _node: &Arc<Operator>, _op: &InnerJoin) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_order(&mut self, _node: &Arc<Operator>, _op: &Order) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn leave_order(&mut self, _node: &Arc<Operator>, _op: &Order) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_limit(&mut self, _node: &Arc<Operator>, _op: &Limit) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn leave_limit(&mut self, _node: &Arc<Operator>, _op: &Limit) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_distinct(&mut self, _node: &Arc<Operator>, _op: &Distinct) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn leave_distinct(&mut self, _node: &Arc<Operator>, _op: &Distinct) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_assert_unique_key(
        &mut self,
        _node: &Arc<Operator>,
        _op: &AssertUniqueKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn leave_assert_unique_key(
        &mut self,
        _node: &Arc<Operator>,
        _op: &AssertUniqueKey,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_empty(&mut self, _node: &Arc<Operator>, _op: &Empty) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn leave_empty(&mut self, _node: &Arc<Operator>, _op: &Empty) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Depth-first traversal, children in declaration order.
pub fn walk<V: OperatorVisitor + ?Sized>(
    node: &Arc<Operator>,
    visitor: &mut V,
) -> Result<(), V::Error> {
    match node.as_ref() {
        Operator::Table(op) => visitor.visit_table(node, op),
        Operator::Sql(op) => visitor.visit_sql(node, op),
        Operator::True => visitor.visit_true(node),
        Operator::Alias(op) => {
            if visitor.enter_alias(node, op)? {
                walk(&op.input, visitor)?;
            }
            visitor.leave_alias(node, op)
        }
        Operator::Select(op) => {
            if visitor.enter_select(node, op)? {
                walk(&op.input, visitor)?;
            }
            visitor.leave_select(node, op)
        }
        Operator::Project(op) => {
            if visitor.enter_project(node, op)? {
                walk(&op.input, visitor)?;
            }
            visitor.leave_project(node, op)
        }
        Operator::Extend(op) => {
            if visitor.enter_extend(node, op)? {
                walk(&op.input, visitor)?;
            }
            visitor.leave_extend(node, op)
        }
        Operator::InnerJoin(op) => {
            if visitor.enter_inner_join(node, op)? {
                for input in &op.inputs {
                    walk(input, visitor)?;
                }
            }
            visitor.leave_inner_join(node, op)
        }
        Operator::Order(op) => {
            if visitor.enter_order(node, op)? {
                walk(&op.input, visitor)?;
            }
            visitor.leave_order(node, op)
        }
        Operator::Limit(op) => {
            if visitor.enter_limit(node, op)? {
                walk(&op.input, visitor)?;
            }
            visitor.leave_limit(node, op)
        }
        Operator::Distinct(op) => {
            if visitor.enter_distinct(node, op)? {
                walk(&op.input, visitor)?;
            }
            visitor.leave_distinct(node, op)
        }
        Operator::AssertUniqueKey(op) => {
            if visitor.enter_assert_unique_key(node, op)? {
                walk(&op.input, visitor)?;
            }
            visitor.leave_assert_unique_key(node, op)
        }
        Operator::Empty(op) => {
            if visitor.enter_empty(node, op)? {
                walk(&op.input, visitor)?;
            }
            visitor.leave_empty(node, op)
        }
    }
}
