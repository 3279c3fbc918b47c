//! Relational naming and typing: identifiers, qualified table and column
//! names, column lists, datatypes and the schema description interface.

pub mod column_list;
pub mod data_type;
pub mod errors;
pub mod identifier;
pub mod identifier_parser;
pub mod names;
pub mod schema_description;

pub use column_list::ColumnList;
pub use data_type::{DataType, Flavor, GenericType, SqlTypeCode};
pub use errors::{IdentifierParseError, SchemaError, ViolationType};
pub use identifier::{Identifier, IdentifierList};
pub use identifier_parser::{IdentifierParser, IdentifierRules, Sql92IdentifierRules};
pub use names::{ColumnName, TableName};
pub use schema_description::{ColumnDef, ForeignKey, InMemorySchema, SchemaInspector, TableDef};
