//! Algebraic properties of the rewrite passes.

#[cfg(test)]
mod rewrite_tests {
    use std::sync::Arc;

    use relgraph::db_schema::{ColumnList, ColumnName, DataType, Identifier, TableName};
    use relgraph::query_planner::{
        logical_expr::{ColumnListEquality, Expression},
        logical_plan::{op_util, Extend, Operator, ScanColumn},
        optimizer::{projection_push_down, selection_insertion, specialize, Specialization},
        renamer::Renamer,
    };
    use relgraph::sql_generator::compile;
    use relgraph::vendor::Sql92;

    fn scan(table: &str, columns: &[&str]) -> Arc<Operator> {
        Operator::table(
            TableName::unqualified(table),
            columns
                .iter()
                .map(|c| ScanColumn {
                    name: Identifier::undelimited(*c),
                    data_type: Some(DataType::exact_numeric("INTEGER")),
                    nullable: true,
                })
                .collect(),
        )
    }

    fn eq(table: &str, column: &str, value: &str) -> Expression {
        Expression::equal(
            Expression::column(ColumnName::of(table, column)),
            Expression::constant(value, Some(DataType::exact_numeric("INTEGER"))),
        )
    }

    fn cols(names: &[(&str, &str)]) -> ColumnList {
        ColumnList::new(names.iter().map(|(t, c)| ColumnName::of(t, c)).collect())
    }

    fn joined() -> Arc<Operator> {
        Operator::inner_join(
            vec![scan("orders", &["id", "customer"]), scan("customers", &["id", "name"])],
            ColumnListEquality::new(
                &[ColumnName::of("orders", "customer")],
                &[ColumnName::of("customers", "id")],
            )
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn test_identity_renaming_shares_the_tree() {
        let plan = Operator::select(joined(), eq("orders", "id", "7"));
        let renamed = Renamer::identity().apply_to_tree(Arc::clone(&plan)).unwrap();
        assert!(Arc::ptr_eq(&plan, &renamed));
    }

    #[test]
    fn test_alias_renaming_is_idempotent() {
        let plan = Operator::select(scan("t", &["a"]), eq("t", "a", "1"));
        let renamer = Renamer::to_alias(TableName::unqualified("x"));
        let once = renamer.apply_to_tree(plan).unwrap();
        let twice = renamer.apply_to_tree(Arc::clone(&once)).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.to_string(), "Select(x.a = 1)\n└── Table(t)\n");
    }

    #[test]
    fn test_projections_compose_to_their_intersection() {
        let plan = joined();
        let first = cols(&[("orders", "id"), ("customers", "name"), ("orders", "customer")]);
        let second = cols(&[("orders", "customer"), ("customers", "name")]);

        let (once, _) = projection_push_down::apply(Arc::clone(&plan), &first).unwrap();
        let (twice, _) = projection_push_down::apply(once, &second).unwrap();
        let (direct, _) = projection_push_down::apply(plan, &first.intersect_ordered(&second)).unwrap();

        assert_eq!(twice.columns(), direct.columns());
        assert_eq!(
            compile(&twice, &Sql92).unwrap(),
            compile(&direct, &Sql92).unwrap()
        );
    }

    #[test]
    fn test_selections_compose_to_their_conjunction() {
        let plan = scan("t", &["a", "b"]);
        let (once, _) = selection_insertion::apply(Arc::clone(&plan), &eq("t", "a", "1")).unwrap();
        let (twice, _) = selection_insertion::apply(once, &eq("t", "b", "2")).unwrap();
        let (direct, _) =
            selection_insertion::apply(plan, &eq("t", "a", "1").and(eq("t", "b", "2"))).unwrap();
        assert_eq!(twice, direct);
        assert_eq!(
            compile(&twice, &Sql92).unwrap(),
            "SELECT t.a, t.b FROM t WHERE t.a = 1 AND t.b = 2"
        );
    }

    #[test]
    fn test_contradiction_yields_empty_relation() {
        let (plan, _) = selection_insertion::apply(scan("t", &["a"]), &Expression::False).unwrap();
        assert!(op_util::is_empty(&plan));
        assert_eq!(plan.columns(), cols(&[("t", "a")]));
    }

    #[test]
    fn test_constant_columns() {
        let selected = Operator::select(scan("t", &["a", "b"]), eq("t", "a", "1"));
        assert!(op_util::is_constant_column(&selected, &ColumnName::of("t", "a")));
        assert!(!op_util::is_constant_column(&selected, &ColumnName::of("t", "b")));
        assert!(op_util::is_constant_column(&selected, &ColumnName::of("t", "missing")));

        let aliased = Operator::alias(selected, TableName::unqualified("x"));
        assert!(op_util::is_constant_column(&aliased, &ColumnName::of("x", "a")));
    }

    #[test]
    fn test_distinct_over_constant_column_needs_no_subquery() {
        let plan = Operator::distinct(Operator::select(scan("t", &["a", "b"]), eq("t", "b", "3")));
        let (projected, renamer) = projection_push_down::apply(plan, &cols(&[("t", "a")])).unwrap();
        assert!(renamer.is_identity());
        assert_eq!(
            compile(&projected, &Sql92).unwrap(),
            "SELECT DISTINCT t.a FROM t WHERE t.b = 3"
        );
    }

    #[test]
    fn test_generated_names_are_stable() {
        let expression = Expression::concatenation(vec![
            Expression::column(ColumnName::of("t", "a")),
            Expression::column(ColumnName::of("t", "b")),
        ]);
        let name = Extend::unique_name_for(&expression);
        assert_eq!(name, Extend::unique_name_for(&expression.clone()));
        assert!(name.name().starts_with("EXPR"));
        assert_eq!(name.name().len(), "EXPR".len() + 8);
    }

    #[test]
    fn test_join_normalisation() {
        assert!(op_util::is_trivial(&Operator::inner_join(Vec::new(), Vec::new())));

        let single = Operator::inner_join(vec![scan("t", &["a"])], Vec::new());
        assert!(matches!(single.as_ref(), Operator::Table(_)));

        let join = joined();
        assert_eq!(
            join.to_string(),
            "InnerJoin(customers.id = orders.customer)\n├── Table(customers)\n└── Table(orders)\n"
        );
    }

    #[test]
    fn test_specialize_then_compile() {
        let spec = Specialization {
            condition: eq("customers", "name", "5"),
            limit: Some(20),
            projection: Some(cols(&[("orders", "id")])),
            ..Default::default()
        };
        let (plan, renamer) = specialize(joined(), &spec).unwrap();
        assert!(renamer.is_identity());
        assert_eq!(
            compile(&plan, &Sql92).unwrap(),
            "SELECT orders.id FROM customers, orders \
             WHERE customers.id = orders.customer AND customers.name = 5 LIMIT 20"
        );
    }

    #[test]
    fn test_plan_loads_from_json() {
        let json = r#"{
            "op": "limit",
            "limit": 2,
            "input": {
                "op": "alias",
                "alias": { "table": { "name": "x" } },
                "input": {
                    "op": "table",
                    "table": { "table": { "name": "t" } },
                    "columns": [ { "name": { "name": "a" } } ]
                }
            }
        }"#;
        let plan: Operator = serde_json::from_str(json).unwrap();
        assert_eq!(
            compile(&Arc::new(plan), &Sql92).unwrap(),
            "SELECT x.a FROM t AS x LIMIT 2"
        );
    }
}
