//! Identifier parsing through the vendor rules and the name types built
//! from the parts.

#[cfg(test)]
mod identifier_tests {
    use relgraph::db_schema::{ColumnName, Identifier, TableName, ViolationType};
    use relgraph::vendor::{driver_registry, vendor_for, VendorKind};
    use serial_test::serial;
    use test_case::test_case;

    #[test]
    fn test_mixed_parts_build_a_table_name() {
        let parts = vendor_for(VendorKind::Sql92)
            .parse_identifiers("\"Foo\".\"Bar\".baz", 1, 3)
            .unwrap();
        let table = TableName::from_parts(&parts).unwrap();
        assert_eq!(table.catalog, Some(Identifier::delimited("Foo")));
        assert_eq!(table.schema, Some(Identifier::delimited("Bar")));
        assert_eq!(table.table, Identifier::undelimited("baz"));
        assert_eq!(table.to_string(), "\"Foo\".\"Bar\".baz");
    }

    #[test]
    fn test_four_parts_are_too_many_for_a_table() {
        let err = vendor_for(VendorKind::Sql92)
            .parse_identifiers("a.b.c.d", 1, 3)
            .unwrap_err();
        assert_eq!(err.violation, ViolationType::TooManyIdentifiers);
    }

    #[test]
    fn test_four_parts_make_a_column_name() {
        let parts = vendor_for(VendorKind::Sql92)
            .parse_identifiers("cat.sch.tbl.col", 1, 4)
            .unwrap();
        let column = ColumnName::from_parts(&parts).unwrap();
        assert_eq!(column.column, Identifier::undelimited("col"));
        assert_eq!(column.qualifier.map(|t| t.qualifier_count()), Some(2));
    }

    #[test]
    fn test_undelimited_names_fold_case() {
        assert_eq!(Identifier::undelimited("orders"), Identifier::undelimited("ORDERS"));
        assert_eq!(Identifier::undelimited("orders"), Identifier::delimited("ORDERS"));
        assert_ne!(Identifier::delimited("orders"), Identifier::delimited("ORDERS"));
    }

    #[test_case(VendorKind::MySql, "`my table`.id", "my table" ; "mysql backticks")]
    #[test_case(VendorKind::SqlServer, "[my table].id", "my table" ; "sql server brackets")]
    #[test_case(VendorKind::SqlServer, "\"my table\".id", "my table" ; "sql server double quotes")]
    #[test_case(VendorKind::Sql92, "\"my table\".id", "my table" ; "sql92 double quotes")]
    fn test_vendor_delimiters(kind: VendorKind, text: &str, table: &str) {
        let parts = vendor_for(kind).parse_identifiers(text, 1, 2).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name(), table);
        assert!(parts[0].is_delimited());
        assert_eq!(parts[1].name(), "id");
    }

    #[test_case(VendorKind::Sql92, "`t`" ; "sql92 rejects backticks")]
    #[test_case(VendorKind::MySql, "[t]" ; "mysql rejects brackets")]
    fn test_foreign_delimiters_are_rejected(kind: VendorKind, text: &str) {
        let err = vendor_for(kind).parse_identifiers(text, 1, 1).unwrap_err();
        assert_eq!(err.violation, ViolationType::UnexpectedCharacter);
        assert_eq!(err.position, 0);
    }

    #[test]
    fn test_quoting_round_trips_through_the_parser() {
        for kind in [VendorKind::Sql92, VendorKind::MySql, VendorKind::PostgreSql] {
            let vendor = vendor_for(kind);
            let original = Identifier::delimited("odd \"name\" ]`x");
            let quoted = vendor.quote_identifier(&original);
            let parsed = vendor.parse_identifiers(&quoted, 1, 1).unwrap();
            assert_eq!(parsed[0].name(), original.name(), "{} via {}", kind, quoted);
        }
    }

    #[test]
    #[serial]
    fn test_driver_registration() {
        let name = "org.example.IdentifierTestDriver";
        let first = driver_registry::register_driver(name);
        assert!(!driver_registry::register_driver(name));
        assert!(driver_registry::is_registered(name));
        assert!(first || driver_registry::registered_drivers().contains(&name.to_string()));
    }
}
