use std::fmt::Display;

use thiserror::Error;

use crate::query_planner::errors::MutatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    ProjectionPushDown,
    SelectionInsertion,
    Renaming,
    LimitInsertion,
}

impl Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pass::ProjectionPushDown => write!(f, "ProjectionPushDown"),
            Pass::SelectionInsertion => write!(f, "SelectionInsertion"),
            Pass::Renaming => write!(f, "Renaming"),
            Pass::LimitInsertion => write!(f, "LimitInsertion"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OptimizerError {
    #[error("MutatorError: {pass}: {source}.")]
    Mutator {
        pass: Pass,
        #[source]
        source: MutatorError,
    },
}

impl OptimizerError {
    pub fn mutator(pass: Pass) -> impl FnOnce(MutatorError) -> OptimizerError {
        move |source| OptimizerError::Mutator { pass, source }
    }
}
