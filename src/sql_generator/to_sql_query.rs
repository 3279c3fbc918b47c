use std::sync::Arc;

use super::{errors::SqlGeneratorError, simple_query::SimpleQuery};
use crate::{
    db_schema::names::ColumnName,
    query_planner::{
        logical_expr::Expression,
        logical_plan::{
            visitor::{walk, OperatorVisitor},
            Alias, Distinct, Empty, Extend, InnerJoin, Limit, Operator, Order, Project, RawSql,
            Select, TableScan,
        },
    },
    vendor::Vendor,
};

/// Folds a tree into [`SimpleQuery`] accumulators. The top of the stack is
/// the statement being assembled; every alias opens a new one.
struct StatementBuilder<'v> {
    vendor: &'v dyn Vendor,
    queries: Vec<SimpleQuery>,
}

impl StatementBuilder<'_> {
    fn current(&mut self, during: &'static str) -> Result<&mut SimpleQuery, SqlGeneratorError> {
        self.queries
            .last_mut()
            .ok_or(SqlGeneratorError::UnbalancedStack { during })
    }
}

impl OperatorVisitor for StatementBuilder<'_> {
    type Error = SqlGeneratorError;

    fn visit_table(&mut self, _node: &Arc<Operator>, op: &TableScan) -> Result<(), Self::Error> {
        self.current("Table")?.tables.insert(op.table.clone(), None);
        Ok(())
    }

    fn visit_sql(&mut self, _node: &Arc<Operator>, op: &RawSql) -> Result<(), Self::Error> {
        self.current("Sql")?.raw_sql = Some(op.sql.clone());
        Ok(())
    }

    fn leave_select(&mut self, _node: &Arc<Operator>, op: &Select) -> Result<(), Self::Error> {
        self.current("Select")?.and_condition(op.condition.clone());
        Ok(())
    }

    // The select list is computed from the outermost operator's columns, so
    // a projection only has to refer to columns its input really produces.
    fn leave_project(&mut self, _node: &Arc<Operator>, op: &Project) -> Result<(), Self::Error> {
        let available = op.input.columns();
        for column in op.columns.iter() {
            if available.is_ambiguous(column) {
                return Err(SqlGeneratorError::AmbiguousColumn {
                    column: column.to_string(),
                    operator: "Project",
                });
            }
            if !available.contains(column) {
                return Err(SqlGeneratorError::ColumnNotFound {
                    column: column.to_string(),
                    operator: "Project",
                });
            }
        }
        Ok(())
    }

    fn leave_extend(&mut self, _node: &Arc<Operator>, op: &Extend) -> Result<(), Self::Error> {
        self.current("Extend")?.extensions.insert(
            ColumnName::unqualified_name(op.column.clone()),
            op.expression.clone(),
        );
        Ok(())
    }

    fn leave_inner_join(&mut self, _node: &Arc<Operator>, op: &InnerJoin) -> Result<(), Self::Error> {
        let query = self.current("InnerJoin")?;
        for condition in &op.conditions {
            query.and_condition(condition.to_expression());
        }
        Ok(())
    }

    fn leave_order(&mut self, _node: &Arc<Operator>, op: &Order) -> Result<(), Self::Error> {
        self.current("Order")?.prepend_order(&op.specs);
        Ok(())
    }

    fn leave_limit(&mut self, _node: &Arc<Operator>, op: &Limit) -> Result<(), Self::Error> {
        let query = self.current("Limit")?;
        if op.from_end {
            log::trace!("Leaving limit of {} from the end to the caller", op.limit);
        } else if op.limit == 0 {
            query.condition = Expression::False;
        } else {
            query.add_limit(op.limit);
        }
        Ok(())
    }

    fn leave_distinct(&mut self, _node: &Arc<Operator>, _op: &Distinct) -> Result<(), Self::Error> {
        self.current("Distinct")?.distinct = true;
        Ok(())
    }

    fn leave_empty(&mut self, _node: &Arc<Operator>, _op: &Empty) -> Result<(), Self::Error> {
        self.current("Empty")?.condition = Expression::False;
        Ok(())
    }

    fn enter_alias(&mut self, _node: &Arc<Operator>, _op: &Alias) -> Result<bool, Self::Error> {
        self.queries.push(SimpleQuery::default());
        Ok(true)
    }

    fn leave_alias(&mut self, _node: &Arc<Operator>, op: &Alias) -> Result<(), Self::Error> {
        let finished = self
            .queries
            .pop()
            .ok_or(SqlGeneratorError::UnbalancedStack { during: "Alias" })?;
        let wrapped = match finished.simple_table() {
            Some(table) => self.vendor.table_sql(table),
            None => format!("({})", finished.render(&op.input.columns(), self.vendor)),
        };
        self.current("Alias")?
            .tables
            .insert(op.alias.clone(), Some(wrapped));
        Ok(())
    }
}

pub(crate) fn render_operator_to_sql(
    plan: &Arc<Operator>,
    vendor: &dyn Vendor,
) -> Result<String, SqlGeneratorError> {
    let mut builder = StatementBuilder {
        vendor,
        queries: vec![SimpleQuery::default()],
    };
    walk(plan, &mut builder)?;
    if builder.queries.len() != 1 {
        return Err(SqlGeneratorError::UnfinishedQueries {
            found: builder.queries.len(),
        });
    }
    let query = builder.current("root")?;
    Ok(query.render(&plan.columns(), vendor))
}
