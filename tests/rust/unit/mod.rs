//! Integration tests exercising the public API end to end.

mod compiler_tests;
mod identifier_tests;
mod rewrite_tests;
mod schema_tests;
