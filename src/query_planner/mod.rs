//! The operator tree and everything that rewrites it.

pub mod errors;
pub mod logical_expr;
pub mod logical_plan;
pub mod mutator;
pub mod optimizer;
pub mod renamer;
