use std::sync::Arc;

use crate::{
    db_schema::column_list::ColumnList,
    query_planner::{
        logical_expr::Expression,
        logical_plan::Operator,
        optimizer::{
            limit_insertion::LimitInsertion,
            optimizer_pass::{OptimizerPass, OptimizerResult},
            projection_push_down::{ProjectionPushDown, DEFAULT_ALIAS_PREFIX},
            selection_insertion::SelectionInsertion,
        },
        renamer::Renamer,
    },
};

pub mod errors;
pub mod limit_insertion;
pub mod optimizer_pass;
pub mod projection_push_down;
pub mod renaming;
pub mod selection_insertion;

// Dumps the plan tree at TRACE level
fn log_plan_structure(label: &str, plan: &Operator) {
    if !log::log_enabled!(log::Level::Trace) {
        return;
    }
    log::trace!("{}:", label);
    for line in plan.to_string().lines() {
        log::trace!("  {}", line);
    }
}

/// What one query needs from a shared tree: a filter, a row cap and the
/// columns it reads.
#[derive(Debug, Clone)]
pub struct Specialization {
    pub condition: Expression,
    pub limit: Option<u64>,
    pub projection: Option<ColumnList>,
    pub alias_prefix: String,
}

impl Default for Specialization {
    fn default() -> Self {
        Specialization {
            condition: Expression::True,
            limit: None,
            projection: None,
            alias_prefix: DEFAULT_ALIAS_PREFIX.to_string(),
        }
    }
}

/// Applies selection insertion, then limit insertion, then projection
/// pushdown. The returned renamer comes from the projection step.
pub fn specialize(
    plan: Arc<Operator>,
    specialization: &Specialization,
) -> OptimizerResult<(Arc<Operator>, Renamer)> {
    log_plan_structure("Plan before specialization", &plan);

    let mut plan = SelectionInsertion::new(specialization.condition.clone())
        .optimize(plan)?
        .plan;

    if let Some(limit) = specialization.limit {
        plan = LimitInsertion::new(limit).optimize(plan)?.plan;
    }

    let mut renamer = Renamer::identity();
    if let Some(columns) = &specialization.projection {
        (plan, renamer) = ProjectionPushDown::new(columns.clone())
            .with_alias_prefix(specialization.alias_prefix.clone())
            .optimize(plan)?
            .into_parts();
    }

    log_plan_structure("Plan after specialization", &plan);
    Ok((plan, renamer))
}
