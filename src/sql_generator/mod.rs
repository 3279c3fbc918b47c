//! Flattens operator trees into SQL text for one vendor.

use std::sync::Arc;

use crate::{query_planner::logical_plan::Operator, vendor::Vendor};

mod errors;
mod simple_query;
mod to_sql_query;

pub use errors::SqlGeneratorError;

/// Compiles `plan` to one complete `SELECT` statement. The select list
/// follows `plan.columns()` exactly, so rows can be decoded by position.
pub fn compile(plan: &Arc<Operator>, vendor: &dyn Vendor) -> Result<String, SqlGeneratorError> {
    let sql = to_sql_query::render_operator_to_sql(plan, vendor)?;
    log::debug!("Generated {} SQL: {}", vendor.kind(), sql);
    Ok(sql)
}
