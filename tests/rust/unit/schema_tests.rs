//! Schema descriptions loaded from YAML files and compiled table by table.

#[cfg(test)]
mod schema_tests {
    use std::io::Write;

    use relgraph::db_schema::{
        ColumnName, GenericType, Identifier, InMemorySchema, SchemaError, SchemaInspector,
        TableName, ViolationType,
    };
    use relgraph::query_planner::{
        logical_expr::{ColumnListEquality, Expression},
        logical_plan::Operator,
    };
    use relgraph::sql_generator::compile;
    use relgraph::vendor::{vendor_for, VendorKind};

    const SHOP: &str = r#"
tables:
  - name: orders
    columns:
      - { name: id, type: INTEGER, nullable: false }
      - { name: customer, type: VARCHAR, size: 64 }
      - { name: paid, type: BIT, size: 1 }
    primary_key: id
    foreign_keys:
      - { columns: customer, references: customers, referenced_columns: name }
  - name: customers
    columns:
      - { name: name, type: VARCHAR, nullable: false }
    primary_key: name
"#;

    fn write_schema(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn load(kind: VendorKind) -> InMemorySchema {
        let file = write_schema(SHOP);
        InMemorySchema::from_yaml_file(file.path(), vendor_for(kind)).unwrap()
    }

    #[test]
    fn test_table_statements() {
        let schema = load(VendorKind::Sql92);
        let statements: Vec<String> = schema
            .table_names()
            .iter()
            .filter_map(|name| schema.table(name))
            .map(|def| compile(&Operator::table_from_def(def), vendor_for(VendorKind::Sql92)).unwrap())
            .collect();
        assert_eq!(
            statements,
            vec![
                "SELECT customers.name FROM customers".to_string(),
                "SELECT orders.id, orders.customer, orders.paid FROM orders".to_string(),
            ]
        );
    }

    #[test]
    fn test_scan_carries_types_and_keys() {
        let schema = load(VendorKind::Sql92);
        let orders = schema.table(&TableName::unqualified("orders")).unwrap();
        let scan = Operator::table_from_def(orders);
        match scan.as_ref() {
            Operator::Table(t) => {
                assert_eq!(t.unique_keys.len(), 1);
                assert!(!t.columns[0].nullable);
            }
            other => panic!("expected a table scan, got {:?}", other),
        }
        let id_type = scan.column_type(&ColumnName::of("orders", "id")).unwrap();
        assert_eq!(id_type.generic, GenericType::ExactNumeric);
    }

    #[test]
    fn test_foreign_key_join() {
        let schema = load(VendorKind::Sql92);
        let orders = schema.table(&TableName::unqualified("orders")).unwrap();
        let customers = schema.table(&TableName::unqualified("customers")).unwrap();
        let fk = &orders.foreign_keys[0];

        let left: Vec<ColumnName> = fk
            .columns
            .iter()
            .map(|c| ColumnName::qualified(&orders.name, c.clone()))
            .collect();
        let right: Vec<ColumnName> = fk
            .referenced_columns
            .iter()
            .map(|c| ColumnName::qualified(&fk.referenced_table, c.clone()))
            .collect();
        let join = Operator::inner_join(
            vec![
                Operator::table_from_def(orders),
                Operator::table_from_def(customers),
            ],
            ColumnListEquality::new(&left, &right).into_iter().collect(),
        );
        assert_eq!(
            compile(&join, vendor_for(VendorKind::Sql92)).unwrap(),
            "SELECT customers.name, orders.id, orders.customer, orders.paid \
             FROM customers, orders WHERE customers.name = orders.customer"
        );
    }

    #[test]
    fn test_bit_column_literal_depends_on_vendor() {
        let true_literal = |kind: VendorKind| {
            let schema = load(kind);
            let orders = schema.table(&TableName::unqualified("orders")).unwrap();
            let paid = orders.column(&Identifier::undelimited("paid")).unwrap();
            paid.data_type.to_sql_literal("true", vendor_for(kind))
        };
        assert_eq!(true_literal(VendorKind::SqlServer), "1");
    }

    #[test]
    fn test_selection_on_typed_column() {
        let schema = load(VendorKind::MySql);
        let orders = schema.table(&TableName::unqualified("orders")).unwrap();
        let scan = Operator::table_from_def(orders);
        let customer = ColumnName::of("orders", "customer");
        let condition = Expression::equal(
            Expression::column(customer.clone()),
            Expression::constant("O\\Brien", scan.column_type(&customer)),
        );
        assert_eq!(
            compile(&Operator::select(scan, condition), vendor_for(VendorKind::MySql)).unwrap(),
            "SELECT orders.id, orders.customer, orders.paid FROM orders \
             WHERE orders.customer = 'O\\\\Brien'"
        );
    }

    #[test]
    fn test_missing_file() {
        let err = InMemorySchema::from_yaml_file("/nonexistent/schema.yaml", vendor_for(VendorKind::Sql92))
            .unwrap_err();
        assert!(matches!(err, SchemaError::ReadError { .. }), "{:?}", err);
    }

    #[test]
    fn test_overqualified_table_name() {
        let file = write_schema(
            r#"
tables:
  - name: a.b.c.d
    columns:
      - { name: x, type: INTEGER }
"#,
        );
        let err = InMemorySchema::from_yaml_file(file.path(), vendor_for(VendorKind::Sql92)).unwrap_err();
        match err {
            SchemaError::Identifier { source, .. } => {
                assert_eq!(source.violation, ViolationType::TooManyIdentifiers)
            }
            other => panic!("expected identifier error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_tables_are_rejected() {
        let file = write_schema(
            r#"
tables:
  - name: t
    columns:
      - { name: x, type: INTEGER }
  - name: T
    columns:
      - { name: y, type: INTEGER }
"#,
        );
        let err = InMemorySchema::from_yaml_file(file.path(), vendor_for(VendorKind::Sql92)).unwrap_err();
        assert!(matches!(err, SchemaError::Duplicate { kind: "table", .. }), "{:?}", err);
    }
}
