#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod batch;
mod builder;
mod error;
mod filter;
mod graph;
mod node;
mod reduce;
mod subgraph;
mod topo;
mod value;

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(test)]
mod fixtures;

pub use petgraph::graph::NodeIndex;

pub use crate::batch::{PreviousGraphs, reduce_all};
pub use crate::builder::GraphBuilder;
pub use crate::error::*;
pub use crate::filter::{
    AcceptAll, And, InvalidFunctionFilter, InvalidPortfolioFilter, InvalidTargetFilter,
    NodeFilter, NodeFilterExt,
};
pub use crate::graph::{DependencyGraph, NodeGraph, TerminalOutputs};
pub use crate::node::{DependencyNode, FunctionParameters};
pub use crate::reduce::reduce;
pub use crate::subgraph::RootDiscardingSubgrapher;
pub use crate::topo::TopologicalNodes;
pub use crate::value::{
    ComputationTargetSpecification, ComputationTargetType, UniqueId, ValueProperties,
    ValueRequirement, ValueSpecification,
};
