//! Schema description consumed by the operator builders.
//!
//! The compiler never talks to a live database. Whatever inspects the real
//! catalog hands it a [`SchemaInspector`]; [`InMemorySchema`] is the
//! implementation used by the binary and the tests, loaded from YAML:
//!
//! ```yaml
//! tables:
//!   - name: shop.orders
//!     columns:
//!       - { name: id, type: INTEGER, nullable: false }
//!       - { name: customer, type: VARCHAR, size: 64 }
//!       - { name: flags, type: BIT, type_name: BIT, size: 8 }
//!     primary_key: id
//!     unique_keys: [[customer, id]]
//!     foreign_keys:
//!       - { columns: customer, references: shop.customers, referenced_columns: name }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    data_type::{DataType, SqlTypeCode},
    errors::SchemaError,
    identifier::{Identifier, IdentifierList},
    names::TableName,
};
use crate::vendor::Vendor;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: Identifier,
    pub data_type: DataType,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub columns: IdentifierList,
    pub referenced_table: TableName,
    pub referenced_columns: IdentifierList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: TableName,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Option<IdentifierList>,
    pub unique_keys: Vec<IdentifierList>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDef {
    pub fn column(&self, name: &Identifier) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| &c.name == name)
    }

    /// Primary key first, then the declared unique keys.
    pub fn all_unique_keys(&self) -> Vec<IdentifierList> {
        self.primary_key
            .iter()
            .chain(self.unique_keys.iter())
            .cloned()
            .collect()
    }
}

pub trait SchemaInspector {
    fn table(&self, name: &TableName) -> Option<&TableDef>;

    fn table_names(&self) -> Vec<TableName>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySchema {
    tables: BTreeMap<TableName, TableDef>,
}

impl InMemorySchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: TableDef) -> Result<(), SchemaError> {
        if self.tables.contains_key(&table.name) {
            return Err(SchemaError::Duplicate {
                kind: "table",
                name: table.name.to_string(),
            });
        }
        self.tables.insert(table.name.clone(), table);
        Ok(())
    }

    pub fn from_yaml_file<P: AsRef<Path>>(
        path: P,
        vendor: &dyn Vendor,
    ) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| SchemaError::ReadError {
            error: format!("{}: {}", path.as_ref().display(), e),
        })?;
        Self::from_yaml_str(&content, vendor)
    }

    pub fn from_yaml_str(content: &str, vendor: &dyn Vendor) -> Result<Self, SchemaError> {
        let config: SchemaConfig =
            serde_yaml::from_str(content).map_err(|e| SchemaError::ParseError {
                error: e.to_string(),
            })?;
        config.build(vendor)
    }
}

impl SchemaInspector for InMemorySchema {
    fn table(&self, name: &TableName) -> Option<&TableDef> {
        self.tables.get(name)
    }

    fn table_names(&self) -> Vec<TableName> {
        self.tables.keys().cloned().collect()
    }
}

/// One column name or several.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
enum KeyConfig {
    Single(String),
    Composite(Vec<String>),
}

impl KeyConfig {
    fn columns(&self) -> Vec<&str> {
        match self {
            KeyConfig::Single(col) => vec![col.as_str()],
            KeyConfig::Composite(cols) => cols.iter().map(|s| s.as_str()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnConfig {
    name: String,
    #[serde(rename = "type")]
    type_code: String,
    #[serde(default)]
    type_name: Option<String>,
    #[serde(default)]
    size: u32,
    #[serde(default = "default_nullable")]
    nullable: bool,
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ForeignKeyConfig {
    columns: KeyConfig,
    references: String,
    referenced_columns: KeyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableConfig {
    name: String,
    columns: Vec<ColumnConfig>,
    #[serde(default)]
    primary_key: Option<KeyConfig>,
    #[serde(default)]
    unique_keys: Vec<KeyConfig>,
    #[serde(default)]
    foreign_keys: Vec<ForeignKeyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaConfig {
    tables: Vec<TableConfig>,
}

impl SchemaConfig {
    fn build(&self, vendor: &dyn Vendor) -> Result<InMemorySchema, SchemaError> {
        let mut schema = InMemorySchema::new();
        for table in &self.tables {
            schema.add_table(table.build(vendor)?)?;
        }
        log::debug!("Loaded schema with {} tables", self.tables.len());
        Ok(schema)
    }
}

impl TableConfig {
    fn build(&self, vendor: &dyn Vendor) -> Result<TableDef, SchemaError> {
        let name = parse_table_name(&self.name, vendor)?;
        let mut columns: Vec<ColumnDef> = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let column_name = parse_column_identifier(&column.name, vendor)?;
            if columns.iter().any(|c| c.name == column_name) {
                return Err(SchemaError::Duplicate {
                    kind: "column",
                    name: format!("{}.{}", name, column_name),
                });
            }
            let code = SqlTypeCode::from_name(&column.type_code).ok_or_else(|| {
                SchemaError::UnknownType {
                    type_name: column.type_code.clone(),
                    column: column.name.clone(),
                }
            })?;
            let type_name = column.type_name.as_deref().unwrap_or(&column.type_code);
            let data_type = vendor
                .data_type(code, type_name, column.size)
                .ok_or_else(|| SchemaError::UnknownType {
                    type_name: type_name.to_string(),
                    column: column.name.clone(),
                })?;
            if data_type.is_unsupported() {
                log::warn!(
                    "Column {}.{} has unsupported type {}; it cannot be used in conditions",
                    name,
                    column_name,
                    type_name
                );
            }
            columns.push(ColumnDef {
                name: column_name,
                data_type,
                nullable: column.nullable,
            });
        }

        let primary_key = self
            .primary_key
            .as_ref()
            .map(|key| key_columns(key, &name, &columns, vendor))
            .transpose()?;
        let unique_keys = self
            .unique_keys
            .iter()
            .map(|key| key_columns(key, &name, &columns, vendor))
            .collect::<Result<Vec<_>, _>>()?;
        let foreign_keys = self
            .foreign_keys
            .iter()
            .map(|fk| {
                Ok(ForeignKey {
                    columns: key_columns(&fk.columns, &name, &columns, vendor)?,
                    referenced_table: parse_table_name(&fk.references, vendor)?,
                    referenced_columns: fk
                        .referenced_columns
                        .columns()
                        .iter()
                        .map(|c| parse_column_identifier(c, vendor))
                        .collect::<Result<IdentifierList, _>>()?,
                })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        Ok(TableDef {
            name,
            columns,
            primary_key,
            unique_keys,
            foreign_keys,
        })
    }
}

fn parse_table_name(text: &str, vendor: &dyn Vendor) -> Result<TableName, SchemaError> {
    let parts = vendor
        .parse_identifiers(text, 1, 3)
        .map_err(|source| SchemaError::Identifier {
            text: text.to_string(),
            source,
        })?;
    TableName::from_parts(&parts).ok_or_else(|| SchemaError::UnknownTable {
        table: text.to_string(),
    })
}

fn parse_column_identifier(text: &str, vendor: &dyn Vendor) -> Result<Identifier, SchemaError> {
    let mut parts = vendor
        .parse_identifiers(text, 1, 1)
        .map_err(|source| SchemaError::Identifier {
            text: text.to_string(),
            source,
        })?;
    parts.pop().ok_or_else(|| SchemaError::UnknownColumn {
        column: text.to_string(),
        table: String::new(),
    })
}

fn key_columns(
    key: &KeyConfig,
    table: &TableName,
    columns: &[ColumnDef],
    vendor: &dyn Vendor,
) -> Result<IdentifierList, SchemaError> {
    key.columns()
        .iter()
        .map(|text| {
            let id = parse_column_identifier(text, vendor)?;
            if columns.iter().any(|c| c.name == id) {
                Ok(id)
            } else {
                Err(SchemaError::UnknownColumn {
                    column: text.to_string(),
                    table: table.to_string(),
                })
            }
        })
        .collect()
}
