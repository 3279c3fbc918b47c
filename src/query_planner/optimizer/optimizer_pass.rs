//! Optimizer pass trait and result types.
//!
//! Every rewrite pass is a pure function from a tree (plus the parameters the
//! pass was built with) to a new tree and the [`Renamer`] callers must apply
//! to anything else that refers to the old tree's columns.
//!
//! # Implementing a Pass
//!
//! ```ignore
//! impl OptimizerPass for MyPass {
//!     fn optimize(&self, plan: Arc<Operator>) -> OptimizerResult<Rewrite> {
//!         // Transform plan here
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::query_planner::{
    logical_plan::Operator, optimizer::errors::OptimizerError, renamer::Renamer,
};

pub type OptimizerResult<T> = Result<T, OptimizerError>;

/// Outcome of one pass over a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    pub plan: Arc<Operator>,
    /// False when `plan` is the input tree or equal to it.
    pub changed: bool,
    pub renamer: Renamer,
}

impl Rewrite {
    pub fn unchanged(plan: Arc<Operator>) -> Self {
        Rewrite {
            plan,
            changed: false,
            renamer: Renamer::identity(),
        }
    }

    pub fn compare(original: &Arc<Operator>, plan: Arc<Operator>, renamer: Renamer) -> Self {
        let changed = !Arc::ptr_eq(original, &plan) && original != &plan;
        Rewrite {
            plan,
            changed,
            renamer,
        }
    }

    pub fn into_parts(self) -> (Arc<Operator>, Renamer) {
        (self.plan, self.renamer)
    }
}

pub trait OptimizerPass {
    fn optimize(&self, plan: Arc<Operator>) -> OptimizerResult<Rewrite>;
}
