use std::sync::Arc;

use crate::query_planner::{
    logical_plan::{Alias, AssertUniqueKey, Extend, InnerJoin, Operator, Order, Project, Select},
    mutator::{mutate, OpMutator},
    optimizer::{
        errors::{OptimizerError, Pass},
        optimizer_pass::{OptimizerPass, OptimizerResult, Rewrite},
    },
    renamer::Renamer,
};

/// Applies a [`Renamer`] to every column reference in a tree.
///
/// Table scans and raw SQL keep their physical names. An alias has its own
/// name renamed but is not descended into: names below it are local to the
/// subquery.
pub struct Renaming {
    renamer: Renamer,
}

impl Renaming {
    pub fn new(renamer: Renamer) -> Self {
        Renaming { renamer }
    }
}

impl OptimizerPass for Renaming {
    fn optimize(&self, plan: Arc<Operator>) -> OptimizerResult<Rewrite> {
        if self.renamer.is_identity() {
            return Ok(Rewrite::unchanged(plan));
        }
        log::debug!("Renaming: applying {:?}", self.renamer);
        let mut applier = RenameApplier {
            renamer: &self.renamer,
        };
        let result = mutate(&mut applier, &plan).map_err(OptimizerError::mutator(Pass::Renaming))?;
        Ok(Rewrite::compare(&plan, result, self.renamer.clone()))
    }
}

struct RenameApplier<'a> {
    renamer: &'a Renamer,
}

impl OpMutator for RenameApplier<'_> {
    fn enter_alias(&mut self, _op: &Alias) -> bool {
        false
    }

    fn leave_alias(
        &mut self,
        original: &Arc<Operator>,
        op: &Alias,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        let renamed = self.renamer.apply_to_table(&op.alias);
        if renamed == op.alias {
            Arc::clone(original)
        } else {
            Operator::alias(child, renamed)
        }
    }

    fn leave_select(
        &mut self,
        _original: &Arc<Operator>,
        op: &Select,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        Operator::select(child, self.renamer.apply_to_expression(&op.condition))
    }

    fn leave_project(
        &mut self,
        _original: &Arc<Operator>,
        op: &Project,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        Operator::project(child, &self.renamer.apply_to_columns(&op.columns))
    }

    fn leave_extend(
        &mut self,
        _original: &Arc<Operator>,
        op: &Extend,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        Operator::extend(
            child,
            op.column.clone(),
            self.renamer.apply_to_expression(&op.expression),
        )
    }

    fn leave_inner_join(
        &mut self,
        _original: &Arc<Operator>,
        op: &InnerJoin,
        children: Vec<Arc<Operator>>,
    ) -> Arc<Operator> {
        Operator::inner_join(
            children,
            self.renamer.apply_to_join_conditions(&op.conditions),
        )
    }

    fn leave_order(
        &mut self,
        _original: &Arc<Operator>,
        op: &Order,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        Operator::order(child, self.renamer.apply_to_order_specs(&op.specs))
    }

    fn leave_assert_unique_key(
        &mut self,
        _original: &Arc<Operator>,
        op: &AssertUniqueKey,
        child: Arc<Operator>,
    ) -> Arc<Operator> {
        Operator::assert_unique_key(child, self.renamer.apply_to_columns(&op.key))
    }
}

#[cfg(test)]
mod renaming_tests {
    use super::*;
    use crate::db_schema::{
        identifier::Identifier,
        names::{ColumnName, TableName},
    };
    use crate::query_planner::logical_expr::{ColumnListEquality, Expression};
    use crate::query_planner::logical_plan::{OrderSpec, ScanColumn};

    fn scan(table: &str) -> Arc<Operator> {
        Operator::table(
            TableName::unqualified(table),
            vec![ScanColumn {
                name: Identifier::undelimited("a"),
                data_type: None,
                nullable: true,
            }],
        )
    }

    fn x_to_y() -> Renamer {
        Renamer::identity().with_table(TableName::unqualified("x"), TableName::unqualified("y"))
    }

    #[test]
    fn test_identity_is_a_no_op() {
        let plan = Operator::select(scan("t"), Expression::column(ColumnName::of("t", "a")));
        let rewrite = Renaming::new(Renamer::identity())
            .optimize(Arc::clone(&plan))
            .unwrap();
        assert!(!rewrite.changed);
        assert!(rewrite.renamer.is_identity());
        assert!(Arc::ptr_eq(&rewrite.plan, &plan));
    }

    #[test]
    fn test_alias_name_is_renamed_but_not_entered() {
        let inner = Operator::select(scan("x"), Expression::column(ColumnName::of("x", "a")));
        let plan = Operator::alias(Arc::clone(&inner), TableName::unqualified("x"));
        let rewrite = Renaming::new(x_to_y()).optimize(plan).unwrap();
        assert!(rewrite.changed);
        match rewrite.plan.as_ref() {
            Operator::Alias(a) => {
                assert_eq!(a.alias, TableName::unqualified("y"));
                assert_eq!(a.input, inner);
            }
            other => panic!("expected alias, got {:?}", other),
        }
    }

    #[test]
    fn test_conditions_and_orderings_follow_the_renamer() {
        let join = Operator::inner_join(
            vec![scan("t"), Operator::alias(scan("u"), TableName::unqualified("x"))],
            ColumnListEquality::new(&[ColumnName::of("t", "a")], &[ColumnName::of("x", "a")])
                .into_iter()
                .collect(),
        );
        let ordered = Operator::order(
            join,
            vec![OrderSpec {
                expression: Expression::column(ColumnName::of("x", "a")),
                ascending: false,
            }],
        );
        let plan = Renamer::apply_to_tree(&x_to_y(), ordered).unwrap();
        let rendered = plan.to_string();
        assert!(rendered.contains("Order(DESC(y.a))"), "{}", rendered);
        assert!(rendered.contains("InnerJoin(t.a = y.a)"), "{}", rendered);
        assert!(rendered.contains("Alias(y)"), "{}", rendered);
        assert!(rendered.contains("Table(u)"), "{}", rendered);
    }
}
