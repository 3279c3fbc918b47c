use thiserror::Error;

/// Failures of the generic rewrite driver. These indicate a bug in a rewrite
/// hook, never bad input.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MutatorError {
    #[error("Unbalanced rewrite stack while leaving {during}: expected {expected} result(s), found {found}")]
    UnbalancedStack {
        expected: usize,
        found: usize,
        during: &'static str,
    },
}
