//! Node acceptance predicates driving the subgrapher.
//!
//! Any `Fn(&DependencyNode) -> bool` is a [`NodeFilter`]. The named filters
//! below cover the usual reasons a previously compiled graph goes stale:
//! targets resolving differently, functions no longer being valid, and the
//! portfolio structure changing.

use std::collections::HashSet;

use crate::node::DependencyNode;
use crate::value::{ComputationTargetType, UniqueId};

pub trait NodeFilter {
    /// Whether `node` may stay in the graph, judged on the node alone.
    fn accept(&self, node: &DependencyNode) -> bool;
}

impl<F> NodeFilter for F
where
    F: Fn(&DependencyNode) -> bool,
{
    fn accept(&self, node: &DependencyNode) -> bool {
        self(node)
    }
}

pub trait NodeFilterExt: NodeFilter + Sized {
    /// Accepts a node only when both filters do.
    fn and<B: NodeFilter>(self, other: B) -> And<Self, B> {
        And(self, other)
    }
}

impl<F: NodeFilter> NodeFilterExt for F {}

#[derive(Debug, Clone)]
pub struct And<A, B>(A, B);

impl<A: NodeFilter, B: NodeFilter> NodeFilter for And<A, B> {
    fn accept(&self, node: &DependencyNode) -> bool {
        self.0.accept(node) && self.1.accept(node)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl NodeFilter for AcceptAll {
    fn accept(&self, _: &DependencyNode) -> bool {
        true
    }
}

/// Rejects nodes computing over a target whose identifier is no longer
/// valid.
#[derive(Debug, Clone, Default)]
pub struct InvalidTargetFilter {
    invalid: HashSet<UniqueId>,
}

impl InvalidTargetFilter {
    pub fn new(invalid: impl IntoIterator<Item = UniqueId>) -> Self {
        Self {
            invalid: invalid.into_iter().collect(),
        }
    }
}

impl NodeFilter for InvalidTargetFilter {
    fn accept(&self, node: &DependencyNode) -> bool {
        node.target()
            .unique_id()
            .is_none_or(|id| !self.invalid.contains(id))
    }
}

/// Rejects nodes invoking a function that is no longer valid.
#[derive(Debug, Clone, Default)]
pub struct InvalidFunctionFilter {
    invalid: HashSet<String>,
}

impl InvalidFunctionFilter {
    pub fn new<S: Into<String>>(invalid: impl IntoIterator<Item = S>) -> Self {
        Self {
            invalid: invalid.into_iter().map(Into::into).collect(),
        }
    }
}

impl NodeFilter for InvalidFunctionFilter {
    fn accept(&self, node: &DependencyNode) -> bool {
        !self.invalid.contains(node.function_id())
    }
}

/// Rejects every node computing over a portfolio node.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidPortfolioFilter;

impl NodeFilter for InvalidPortfolioFilter {
    fn accept(&self, node: &DependencyNode) -> bool {
        node.target().target_type() != ComputationTargetType::PortfolioNode
    }
}
