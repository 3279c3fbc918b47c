//! Table and column substitutions produced by rewrites.
//!
//! When a pass hides part of a tree behind a new alias, every structure that
//! referenced the old names has to follow. The pass hands back a [`Renamer`]
//! describing the substitution; callers apply it wherever they keep column
//! references of their own.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{
    logical_expr::{ColumnListEquality, Expression},
    logical_plan::{OrderSpec, Operator},
    optimizer::{errors::OptimizerError, renaming::Renaming, optimizer_pass::OptimizerPass},
};
use crate::db_schema::{
    column_list::ColumnList,
    names::{ColumnName, TableName},
};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Renamer {
    #[default]
    Identity,
    /// Every table becomes the alias; columns keep their name under it.
    ToAlias(TableName),
    /// Explicit substitutions. Columns without an entry of their own follow
    /// their table's entry.
    Mapping {
        tables: BTreeMap<TableName, TableName>,
        columns: BTreeMap<ColumnName, ColumnName>,
    },
}

impl Renamer {
    pub fn identity() -> Self {
        Renamer::Identity
    }

    pub fn to_alias(alias: TableName) -> Self {
        Renamer::ToAlias(alias)
    }

    pub fn mapping() -> Self {
        Renamer::Mapping {
            tables: BTreeMap::new(),
            columns: BTreeMap::new(),
        }
    }

    /// Adds a table substitution, turning the renamer into a mapping if it is
    /// not one already.
    pub fn with_table(self, from: TableName, to: TableName) -> Self {
        match self.into_mapping() {
            Renamer::Mapping {
                mut tables,
                columns,
            } => {
                tables.insert(from, to);
                Renamer::Mapping { tables, columns }
            }
            other => other,
        }
    }

    pub fn with_column(self, from: ColumnName, to: ColumnName) -> Self {
        match self.into_mapping() {
            Renamer::Mapping {
                tables,
                mut columns,
            } => {
                columns.insert(from, to);
                Renamer::Mapping { tables, columns }
            }
            other => other,
        }
    }

    fn into_mapping(self) -> Self {
        match self {
            Renamer::Identity => Renamer::mapping(),
            other => other,
        }
    }

    pub fn is_identity(&self) -> bool {
        match self {
            Renamer::Identity => true,
            Renamer::ToAlias(_) => false,
            Renamer::Mapping { tables, columns } => tables.is_empty() && columns.is_empty(),
        }
    }

    pub fn apply_to_table(&self, table: &TableName) -> TableName {
        match self {
            Renamer::Identity => table.clone(),
            Renamer::ToAlias(alias) => alias.clone(),
            Renamer::Mapping { tables, .. } => tables.get(table).unwrap_or(table).clone(),
        }
    }

    pub fn apply_to_column(&self, column: &ColumnName) -> ColumnName {
        match self {
            Renamer::Identity => column.clone(),
            Renamer::ToAlias(alias) => column.requalify(alias),
            Renamer::Mapping { tables, columns } => {
                if let Some(renamed) = columns.get(column) {
                    return renamed.clone();
                }
                match column.qualifier.as_ref().and_then(|q| tables.get(q)) {
                    Some(table) => column.requalify(table),
                    None => column.clone(),
                }
            }
        }
    }

    pub fn apply_to_columns(&self, columns: &ColumnList) -> ColumnList {
        columns.iter().map(|c| self.apply_to_column(c)).collect()
    }

    pub fn apply_to_expression(&self, expression: &Expression) -> Expression {
        expression.rename(self)
    }

    pub fn apply_to_join_conditions(
        &self,
        conditions: &[ColumnListEquality],
    ) -> Vec<ColumnListEquality> {
        conditions.iter().map(|c| c.rename(self)).collect()
    }

    pub fn apply_to_order_specs(&self, specs: &[OrderSpec]) -> Vec<OrderSpec> {
        specs
            .iter()
            .map(|spec| OrderSpec {
                expression: spec.expression.rename(self),
                ascending: spec.ascending,
            })
            .collect()
    }

    /// Runs the renaming pass over a whole tree.
    pub fn apply_to_tree(&self, plan: Arc<Operator>) -> Result<Arc<Operator>, OptimizerError> {
        Ok(Renaming::new(self.clone()).optimize(plan)?.plan)
    }
}
