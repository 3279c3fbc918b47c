//! relgraph - relational query-compiler backend
//!
//! This crate provides the relational core of a graph-over-SQL mapping:
//! - Identifier, name and datatype models with vendor-aware literal encoding
//! - Immutable operator trees over tables and raw SQL
//! - Rewrite passes (projection pushdown, selection and limit insertion, renaming)
//! - SQL generation for SQL-92 and engine-specific dialects

pub mod utils;

pub mod config;
pub mod db_schema;
pub mod query_planner;
pub mod sql_generator;
pub mod vendor;
