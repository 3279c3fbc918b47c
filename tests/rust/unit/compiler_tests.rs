//! SQL generation across vendors, including trees produced by the rewrite
//! passes.

#[cfg(test)]
mod compiler_tests {
    use std::sync::Arc;

    use relgraph::db_schema::{ColumnList, ColumnName, DataType, Identifier, TableName};
    use relgraph::query_planner::{
        logical_expr::Expression,
        logical_plan::{Operator, ScanColumn},
        optimizer::{limit_insertion, projection_push_down, selection_insertion},
        renamer::Renamer,
    };
    use relgraph::sql_generator::compile;
    use relgraph::vendor::{vendor_for, VendorKind};
    use test_case::test_case;

    fn scan(table: &str, columns: &[&str]) -> Arc<Operator> {
        Operator::table(
            TableName::unqualified(table),
            columns
                .iter()
                .map(|c| ScanColumn {
                    name: Identifier::undelimited(*c),
                    data_type: Some(DataType::exact_numeric("INTEGER")),
                    nullable: false,
                })
                .collect(),
        )
    }

    fn int(value: &str) -> Expression {
        Expression::constant(value, Some(DataType::exact_numeric("INTEGER")))
    }

    #[test_case(VendorKind::Sql92, "SELECT t.a FROM t LIMIT 5" ; "sql92 appends")]
    #[test_case(VendorKind::MySql, "SELECT t.a FROM t LIMIT 5" ; "mysql appends")]
    #[test_case(VendorKind::PostgreSql, "SELECT t.a FROM t LIMIT 5" ; "postgresql appends")]
    #[test_case(VendorKind::Oracle, "SELECT t.a FROM t WHERE (ROWNUM <= 5)" ; "oracle filters")]
    #[test_case(VendorKind::SqlServer, "SELECT TOP 5 t.a FROM t" ; "sql server modifies")]
    #[test_case(VendorKind::InterbaseOrFirebird, "SELECT FIRST 5 t.a FROM t" ; "firebird modifies")]
    fn test_limit_dispatch(kind: VendorKind, expected: &str) {
        let plan = limit_insertion::apply(scan("t", &["a"]), 5).unwrap();
        assert_eq!(compile(&plan, vendor_for(kind)).unwrap(), expected);
    }

    #[test]
    fn test_oracle_limit_joins_other_conditions() {
        let (selected, _) = selection_insertion::apply(
            scan("t", &["a", "b"]),
            &Expression::equal(Expression::column(ColumnName::of("t", "b")), int("1")),
        )
        .unwrap();
        let plan = limit_insertion::apply(selected, 5).unwrap();
        assert_eq!(
            compile(&plan, vendor_for(VendorKind::Oracle)).unwrap(),
            "SELECT t.a, t.b FROM t WHERE (ROWNUM <= 5) AND t.b = 1"
        );
    }

    #[test_case(VendorKind::Sql92 ; "sql92")]
    #[test_case(VendorKind::MySql ; "mysql")]
    #[test_case(VendorKind::PostgreSql ; "postgresql")]
    #[test_case(VendorKind::Oracle ; "oracle")]
    #[test_case(VendorKind::SqlServer ; "sql server")]
    #[test_case(VendorKind::Hsqldb ; "hsqldb")]
    fn test_zero_row_limit_is_false_condition(kind: VendorKind) {
        let plan = limit_insertion::apply(scan("t", &["a"]), 0).unwrap();
        let sql = compile(&plan, vendor_for(kind)).unwrap();
        assert_eq!(sql, "SELECT t.a FROM t WHERE 1=0");
    }

    #[test]
    fn test_limits_merge_before_compilation() {
        let plan = limit_insertion::apply(scan("t", &["a"]), 10).unwrap();
        let plan = limit_insertion::apply(plan, 4).unwrap();
        let plan = limit_insertion::apply(plan, 7).unwrap();
        assert_eq!(
            compile(&plan, vendor_for(VendorKind::MySql)).unwrap(),
            "SELECT t.a FROM t LIMIT 4"
        );
    }

    #[test]
    fn test_forced_alias_around_distinct() {
        let plan = Operator::distinct(scan("t", &["a", "b"]));
        let (projected, renamer) =
            projection_push_down::apply(plan, &ColumnList::new(vec![ColumnName::of("t", "a")]))
                .unwrap();
        let alias = match &renamer {
            Renamer::ToAlias(alias) => alias.to_string(),
            other => panic!("expected an alias renamer, got {:?}", other),
        };
        assert!(alias.starts_with("PROJECT"), "{}", alias);
        assert_eq!(
            renamer.apply_to_column(&ColumnName::of("t", "a")),
            ColumnName::of(&alias, "a")
        );
        assert_eq!(
            compile(&projected, vendor_for(VendorKind::Sql92)).unwrap(),
            format!(
                "SELECT {alias}.a FROM (SELECT DISTINCT t.a, t.b FROM t) AS {alias}",
                alias = alias
            )
        );
    }

    #[test]
    fn test_simple_table_skips_subquery_after_projection() {
        let plan = Operator::alias(scan("t", &["a", "b"]), TableName::unqualified("x"));
        let (projected, renamer) =
            projection_push_down::apply(plan, &ColumnList::new(vec![ColumnName::of("x", "b")]))
                .unwrap();
        assert!(renamer.is_identity());
        assert_eq!(
            compile(&projected, vendor_for(VendorKind::PostgreSql)).unwrap(),
            "SELECT x.b FROM t AS x"
        );
    }

    #[test]
    fn test_delimited_names_are_quoted_per_vendor() {
        let table = TableName::new(
            None,
            Some(Identifier::delimited("My Schema")),
            Identifier::delimited("Order"),
        );
        let plan = Operator::table(
            table,
            vec![ScanColumn {
                name: Identifier::delimited("Total"),
                data_type: None,
                nullable: true,
            }],
        );
        assert_eq!(
            compile(&plan, vendor_for(VendorKind::Sql92)).unwrap(),
            "SELECT \"My Schema\".\"Order\".\"Total\" FROM \"My Schema\".\"Order\""
        );
        assert_eq!(
            compile(&plan, vendor_for(VendorKind::MySql)).unwrap(),
            "SELECT `My Schema`.`Order`.`Total` FROM `My Schema`.`Order`"
        );
        assert_eq!(
            compile(&plan, vendor_for(VendorKind::SqlServer)).unwrap(),
            "SELECT [My Schema].[Order].[Total] FROM [My Schema].[Order]"
        );
    }

    #[test_case(VendorKind::Sql92, "DATE '2024-02-29'" ; "sql92 date")]
    #[test_case(VendorKind::SqlServer, "'2024-02-29'" ; "sql server date")]
    #[test_case(VendorKind::MsAccess, "#2024-02-29#" ; "access date")]
    fn test_date_literals(kind: VendorKind, expected: &str) {
        let literal = DataType::date("DATE").to_sql_literal("2024-02-29", vendor_for(kind));
        assert_eq!(literal, expected);
    }

    #[test_case(VendorKind::Sql92, "X'0AFF'" ; "sql92 binary")]
    #[test_case(VendorKind::SqlServer, "0x0AFF" ; "sql server binary")]
    fn test_binary_literals(kind: VendorKind, expected: &str) {
        let literal = DataType::binary("VARBINARY").to_sql_literal("0aff", vendor_for(kind));
        assert_eq!(literal, expected);
    }

    #[test]
    fn test_string_literals_are_escaped() {
        let varchar = DataType::character("VARCHAR");
        assert_eq!(
            varchar.to_sql_literal("it's", vendor_for(VendorKind::Sql92)),
            "'it''s'"
        );
        assert_eq!(
            varchar.to_sql_literal("a\\b", vendor_for(VendorKind::MySql)),
            "'a\\\\b'"
        );
    }

    /// Text between the outermost quote marks of a literal.
    fn unquote(literal: &str) -> &str {
        let start = literal.find(['\'', '#']).map_or(0, |i| i + 1);
        let end = literal.rfind(['\'', '#']).filter(|&i| i >= start).unwrap_or(literal.len());
        &literal[start..end]
    }

    #[test_case(VendorKind::Sql92 ; "sql92")]
    #[test_case(VendorKind::MySql ; "mysql")]
    #[test_case(VendorKind::PostgreSql ; "postgresql")]
    #[test_case(VendorKind::Oracle ; "oracle")]
    #[test_case(VendorKind::SqlServer ; "sql server")]
    #[test_case(VendorKind::MsAccess ; "access")]
    #[test_case(VendorKind::Hsqldb ; "hsqldb")]
    #[test_case(VendorKind::InterbaseOrFirebird ; "firebird")]
    fn test_literal_round_trip(kind: VendorKind) {
        let vendor = vendor_for(kind);

        let number = DataType::exact_numeric("DECIMAL").to_sql_literal("-12.50", vendor);
        assert_eq!(number.parse::<f64>().unwrap(), -12.5);

        let date = DataType::date("DATE").to_sql_literal("2024-02-29", vendor);
        let parsed = chrono::NaiveDate::parse_from_str(unquote(&date), "%Y-%m-%d").unwrap();
        assert_eq!(parsed, chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let time = DataType::time("TIME").to_sql_literal("23:59:01", vendor);
        let parsed = chrono::NaiveTime::parse_from_str(unquote(&time), "%H:%M:%S%.f").unwrap();
        assert_eq!(parsed, chrono::NaiveTime::from_hms_opt(23, 59, 1).unwrap());

        let yes = DataType::boolean("BOOLEAN").to_sql_literal("true", vendor);
        let no = DataType::boolean("BOOLEAN").to_sql_literal("false", vendor);
        assert!(matches!(yes.as_str(), "TRUE" | "1"), "{}", yes);
        assert!(matches!(no.as_str(), "FALSE" | "0"), "{}", no);
    }

    #[test]
    fn test_invalid_values_become_null() {
        let sql92 = vendor_for(VendorKind::Sql92);
        assert_eq!(DataType::date("DATE").to_sql_literal("2023-02-30", sql92), "NULL");
        assert_eq!(DataType::exact_numeric("INTEGER").to_sql_literal("12abc", sql92), "NULL");
        assert_eq!(DataType::binary("BLOB").to_sql_literal("xyz", sql92), "NULL");
    }

    #[test]
    fn test_constant_condition_renders_per_vendor() {
        let (plan, _) = selection_insertion::apply(
            scan("t", &["a"]),
            &Expression::equal(
                Expression::column(ColumnName::of("t", "a")),
                Expression::constant("O'Hara", Some(DataType::character("VARCHAR"))),
            ),
        )
        .unwrap();
        assert_eq!(
            compile(&plan, vendor_for(VendorKind::PostgreSql)).unwrap(),
            "SELECT t.a FROM t WHERE t.a = 'O''Hara'"
        );
    }
}
