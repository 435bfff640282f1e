//! Operations over many graphs at once.
//!
//! A view is compiled into one graph per calculation configuration. The
//! configurations are independent, so every operation here fans out over
//! them with rayon.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use rayon::iter::{IntoParallelRefIterator, IntoParallelRefMutIterator, ParallelIterator};

use crate::filter::NodeFilter;
use crate::graph::DependencyGraph;
use crate::node::DependencyNode;
use crate::reduce::reduce;
use crate::subgraph::RootDiscardingSubgrapher;
use crate::value::ValueRequirement;

/// Reduces every graph in parallel. Results are in input order.
pub fn reduce_all(graphs: &[DependencyGraph]) -> Vec<Cow<'_, DependencyGraph>> {
    graphs.par_iter().map(|graph| reduce(graph)).collect()
}

/// A previously compiled graph and the requirements it can no longer
/// satisfy.
#[derive(Debug, Clone)]
struct PreviousGraph {
    graph: DependencyGraph,
    missing: HashSet<ValueRequirement>,
}

enum Outcome {
    Keep,
    Replace(DependencyGraph),
    Discard,
}

/// Graphs from an earlier compilation, keyed by calculation configuration,
/// that are trimmed down as parts of them go stale.
///
/// Each call to [`PreviousGraphs::filter`] narrows the graphs further and
/// adds to the missing requirements, which the caller then has to compile
/// again from scratch.
#[derive(Debug, Clone, Default)]
pub struct PreviousGraphs {
    graphs: BTreeMap<String, PreviousGraph>,
}

impl PreviousGraphs {
    /// Takes ownership of `graphs`. A later graph replaces an earlier one
    /// with the same configuration name.
    pub fn new(graphs: impl IntoIterator<Item = DependencyGraph>) -> Self {
        let graphs = graphs
            .into_iter()
            .map(|graph| {
                let name = graph.calculation_configuration_name().to_owned();
                let previous = PreviousGraph {
                    graph,
                    missing: HashSet::new(),
                };
                (name, previous)
            })
            .collect();

        Self { graphs }
    }

    /// Discards every node rejected by `filter`, and everything depending on
    /// one, from all graphs.
    ///
    /// Configurations left with no nodes are removed. They are returned with
    /// their missing requirements, which then cover every terminal output the
    /// graph had.
    pub fn filter<F>(&mut self, filter: &F) -> BTreeMap<String, HashSet<ValueRequirement>>
    where
        F: NodeFilter + Sync + ?Sized,
    {
        let discarded: Vec<String> = self
            .graphs
            .par_iter_mut()
            .filter(|(_, previous)| !previous.graph.is_empty())
            .filter_map(|(name, previous)| {
                let subgrapher =
                    RootDiscardingSubgrapher::new(|node: &DependencyNode| filter.accept(node));

                let outcome = match subgrapher.subgraph(&previous.graph, &mut previous.missing) {
                    Some(Cow::Borrowed(_)) => Outcome::Keep,
                    Some(Cow::Owned(graph)) => Outcome::Replace(graph),
                    None => Outcome::Discard,
                };

                match outcome {
                    Outcome::Keep => None,
                    Outcome::Replace(graph) => {
                        previous.graph = graph;
                        None
                    }
                    Outcome::Discard => Some(name.clone()),
                }
            })
            .collect();

        discarded
            .into_iter()
            .filter_map(|name| {
                let previous = self.graphs.remove(&name)?;
                Some((name, previous.missing))
            })
            .collect()
    }

    pub fn graph(&self, name: &str) -> Option<&DependencyGraph> {
        self.graphs.get(name).map(|previous| &previous.graph)
    }

    /// Requirements lost so far by the graph of configuration `name`.
    pub fn missing_requirements(&self, name: &str) -> Option<&HashSet<ValueRequirement>> {
        self.graphs.get(name).map(|previous| &previous.missing)
    }

    /// Configuration names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.graphs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Each remaining graph with its missing requirements, by configuration
    /// name.
    pub fn into_parts(self) -> BTreeMap<String, (DependencyGraph, HashSet<ValueRequirement>)> {
        self.graphs
            .into_iter()
            .map(|(name, previous)| (name, (previous.graph, previous.missing)))
            .collect()
    }
}
