use std::collections::BTreeMap;

use crate::{
    db_schema::{
        column_list::ColumnList,
        names::{ColumnName, TableName},
    },
    query_planner::{logical_expr::Expression, logical_plan::OrderSpec},
    vendor::Vendor,
};

/// One non-nested `SELECT` being assembled. Nested queries are rendered to
/// text as soon as they are complete and stored as `FROM` entries of the
/// enclosing query.
#[derive(Debug, Clone)]
pub(crate) struct SimpleQuery {
    /// Literal SQL that replaces every other clause.
    pub raw_sql: Option<String>,
    /// Computed select items, keyed by their unqualified output name.
    pub extensions: BTreeMap<ColumnName, Expression>,
    /// `FROM` entries; `Some` holds the text of an aliased table or subquery.
    pub tables: BTreeMap<TableName, Option<String>>,
    pub limit: Option<u64>,
    pub condition: Expression,
    pub distinct: bool,
    pub order: Vec<OrderSpec>,
}

impl Default for SimpleQuery {
    fn default() -> Self {
        SimpleQuery {
            raw_sql: None,
            extensions: BTreeMap::new(),
            tables: BTreeMap::new(),
            limit: None,
            condition: Expression::True,
            distinct: false,
            order: Vec::new(),
        }
    }
}

impl SimpleQuery {
    pub fn and_condition(&mut self, condition: Expression) {
        let current = std::mem::replace(&mut self.condition, Expression::True);
        self.condition = current.and(condition);
    }

    pub fn add_limit(&mut self, limit: u64) {
        self.limit = Some(self.limit.map_or(limit, |current| current.min(limit)));
    }

    /// Outer orderings take precedence over the ones already collected.
    pub fn prepend_order(&mut self, specs: &[OrderSpec]) {
        let mut order = specs.to_vec();
        for spec in self.order.drain(..) {
            if !order.contains(&spec) {
                order.push(spec);
            }
        }
        self.order = order;
    }

    /// The table this query reads when it is nothing but one bare table.
    pub fn simple_table(&self) -> Option<&TableName> {
        let bare = self.raw_sql.is_none()
            && self.extensions.is_empty()
            && self.limit.is_none()
            && self.condition.is_true()
            && !self.distinct
            && self.order.is_empty()
            && self.tables.len() == 1;
        if !bare {
            return None;
        }
        match self.tables.iter().next() {
            Some((table, None)) => Some(table),
            _ => None,
        }
    }

    fn select_item(&self, column: &ColumnName, vendor: &dyn Vendor) -> String {
        match self.extensions.get(column) {
            Some(expression) => format!(
                "{} AS {}",
                vendor
                    .boolean_expression_to_simple(expression.clone())
                    .to_sql(vendor),
                vendor.quote_identifier(&column.column)
            ),
            None => vendor.column_sql(column),
        }
    }

    /// Renders the statement with `columns` as its select list, in order.
    pub fn render(&self, columns: &ColumnList, vendor: &dyn Vendor) -> String {
        if let Some(raw) = &self.raw_sql {
            return raw.clone();
        }

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if let Some(modifier) = vendor.row_limit_as_select_modifier(self.limit) {
            sql.push_str(&modifier);
            sql.push(' ');
        }

        if columns.is_empty() {
            sql.push('1');
        } else {
            let items: Vec<String> = columns
                .iter()
                .map(|column| self.select_item(column, vendor))
                .collect();
            sql.push_str(&items.join(", "));
        }

        if self.tables.is_empty() {
            if let Some(true_table) = vendor.true_table() {
                sql.push_str(" FROM ");
                sql.push_str(true_table);
            }
        } else {
            let from: Vec<String> = self
                .tables
                .iter()
                .map(|(name, wrapped)| match wrapped {
                    Some(wrapped) => format!(
                        "{}{}{}",
                        wrapped,
                        vendor.alias_operator(),
                        vendor.table_sql(name)
                    ),
                    None => vendor.table_sql(name),
                })
                .collect();
            sql.push_str(" FROM ");
            sql.push_str(&from.join(", "));
        }

        let condition = self
            .condition
            .clone()
            .and(vendor.row_limit_as_expression(self.limit));
        if !condition.is_true() {
            sql.push_str(" WHERE ");
            sql.push_str(&condition.to_sql_fragments(vendor).join(" AND "));
        }

        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|spec| {
                    let expression = spec.expression.to_sql(vendor);
                    if spec.ascending {
                        expression
                    } else {
                        format!("DESC({})", expression)
                    }
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        if let Some(appendage) = vendor.row_limit_as_query_appendage(self.limit) {
            sql.push(' ');
            sql.push_str(&appendage);
        }
        sql
    }
}
