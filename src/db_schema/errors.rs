//! # Schema Error Types
//!
//! Errors raised while parsing SQL identifiers and while loading a schema
//! description from YAML.
//!
//! Identifier errors are always recoverable by the caller: they carry the
//! violated rule and the 0-based character position where scanning stopped.

use std::fmt;

use thiserror::Error;

/// Rule an identifier string violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationType {
    UnexpectedCharacter,
    UnexpectedEnd,
    EmptyDelimitedIdentifier,
    TooManyIdentifiers,
    VendorRuleViolated,
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationType::UnexpectedCharacter => write!(f, "UNEXPECTED_CHARACTER"),
            ViolationType::UnexpectedEnd => write!(f, "UNEXPECTED_END"),
            ViolationType::EmptyDelimitedIdentifier => write!(f, "EMPTY_DELIMITED_IDENTIFIER"),
            ViolationType::TooManyIdentifiers => write!(f, "TOO_MANY_IDENTIFIERS"),
            ViolationType::VendorRuleViolated => write!(f, "VENDOR_RULE_VIOLATED"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct IdentifierParseError {
    pub violation: ViolationType,
    pub position: usize,
    pub message: String,
}

impl IdentifierParseError {
    pub fn new(violation: ViolationType, position: usize, message: impl Into<String>) -> Self {
        IdentifierParseError {
            violation,
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("Invalid identifier `{text}`: {source}")]
    Identifier {
        text: String,
        #[source]
        source: IdentifierParseError,
    },
    #[error("No table definition found for `{table}`")]
    UnknownTable { table: String },
    #[error("Column `{column}` not found in table `{table}`")]
    UnknownColumn { column: String, table: String },
    #[error("Duplicate {kind} `{name}` in schema")]
    Duplicate { kind: &'static str, name: String },
    #[error("Unknown SQL type `{type_name}` for column `{column}`")]
    UnknownType { type_name: String, column: String },
    #[error("Failed to read schema file: {error}")]
    ReadError { error: String },
    #[error("Failed to parse schema: {error}")]
    ParseError { error: String },
}
