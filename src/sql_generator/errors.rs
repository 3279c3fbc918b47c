use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SqlGeneratorError {
    #[error("Query accumulator stack is empty while leaving {during} (unbalanced traversal)")]
    UnbalancedStack { during: &'static str },
    #[error("Traversal finished with {found} open queries; expected exactly one")]
    UnfinishedQueries { found: usize },
    #[error("Column '{column}' is projected but not produced by the input of {operator}")]
    ColumnNotFound {
        column: String,
        operator: &'static str,
    },
    #[error("Column '{column}' is ambiguous in the input of {operator}")]
    AmbiguousColumn {
        column: String,
        operator: &'static str,
    },
}
