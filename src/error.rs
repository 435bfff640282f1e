use thiserror::Error;

use crate::value::ValueSpecification;

/// Malformed graph input detected while assembling a [`DependencyGraph`].
///
/// [`DependencyGraph`]: crate::DependencyGraph
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node '{0}' declares no outputs")]
    NoOutputs(String),

    #[error("Output {0} is already produced by node '{1}'")]
    DuplicateOutput(Box<ValueSpecification>, String),

    #[error("Node #{0} does not exist in this graph")]
    UnknownNode(usize),

    #[error("No node produces input {0}")]
    UnknownProducer(Box<ValueSpecification>),

    #[error("Node '{0}' cannot consume its own output {1}")]
    SelfInput(String, Box<ValueSpecification>),

    #[error("Input {1} of node '{0}' is already bound")]
    DuplicateInput(String, Box<ValueSpecification>),

    #[error("Terminal output {0} is not produced by any node")]
    UnproducedTerminal(Box<ValueSpecification>),

    #[error("Cycle detected in dependency graph at node '{0}'")]
    Cycle(String),
}
