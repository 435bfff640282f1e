//! Minimal-subgraph reduction.
//!
//! Keeps exactly the nodes and outputs needed to produce a graph's terminal
//! outputs. The algorithm runs in two memoized passes:
//!
//! 1. Walk backwards from every node producing a terminal output along
//!    input edges. A node is necessary iff it is reached. Each node is marked
//!    once, so shared ancestors (diamonds) are decided a single time.
//! 2. For every necessary node, keep an output iff it is terminal or consumed
//!    by another necessary node.
//!
//! When both passes keep everything the input graph is returned borrowed.

use std::borrow::Cow;
use std::collections::HashSet;

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use tracing::Level;

use crate::graph::{DependencyGraph, NodeGraph};
use crate::value::ValueSpecification;

/// Reduces `graph` to the nodes and outputs required by its terminal
/// outputs.
///
/// Returns [`Cow::Borrowed`] with the input itself when nothing can be
/// removed, so `reduce(&reduce(&g))` is always borrowed.
pub fn reduce(graph: &DependencyGraph) -> Cow<'_, DependencyGraph> {
    let span = tracing::span!(
        Level::DEBUG,
        "reduce",
        config = graph.calculation_configuration_name()
    );
    let _enter = span.enter();

    let nodes = graph.nodes();
    let necessary = necessary_nodes(graph);

    // Outputs consumed by necessary nodes. An edge into a necessary node
    // always starts at a necessary node, so this is per-output necessity.
    let consumed: HashSet<&ValueSpecification> = nodes
        .edge_references()
        .filter(|edge| necessary[edge.target().index()])
        .map(|edge| edge.weight())
        .collect();

    let keep_output = |output: &ValueSpecification| {
        graph.is_terminal_output(output) || consumed.contains(output)
    };

    let unchanged = nodes.node_indices().all(|index| {
        necessary[index.index()] && nodes[index].outputs().iter().all(|o| keep_output(o))
    });
    if unchanged {
        tracing::trace!("nothing to reduce");
        return Cow::Borrowed(graph);
    }

    let mut reduced = NodeGraph::with_capacity(nodes.node_count(), nodes.edge_count());
    let mut mapping: Vec<Option<NodeIndex>> = vec![None; nodes.node_count()];

    for index in nodes.node_indices() {
        let node = &nodes[index];
        if !necessary[index.index()] {
            tracing::debug!("Discarding {} from dependency graph", node);
            continue;
        }

        let pruned = node.with_outputs_where(|output| keep_output(output));
        for dropped in node.outputs().iter().filter(|o| !keep_output(*o)) {
            tracing::debug!("Discarding output {} of {}", dropped, node);
        }
        mapping[index.index()] = Some(reduced.add_node(pruned));
    }

    for edge in nodes.edge_references() {
        if let (Some(producer), Some(consumer)) = (
            mapping[edge.source().index()],
            mapping[edge.target().index()],
        ) {
            reduced.add_edge(producer, consumer, edge.weight().clone());
        }
    }

    tracing::info!(
        "Reduced dependency graph for {} from {} to {} nodes",
        graph.calculation_configuration_name(),
        nodes.node_count(),
        reduced.node_count()
    );

    Cow::Owned(DependencyGraph::from_parts(
        graph.calculation_configuration_name().to_owned(),
        reduced,
        graph.terminal_outputs().clone(),
    ))
}

impl DependencyGraph {
    /// Shorthand for [`reduce`].
    pub fn reduce(&self) -> Cow<'_, DependencyGraph> {
        reduce(self)
    }
}

/// Marks every node on a backward path from a terminal output producer.
fn necessary_nodes(graph: &DependencyGraph) -> Vec<bool> {
    let nodes = graph.nodes();
    let mut necessary = vec![false; nodes.node_count()];

    let mut stack: Vec<NodeIndex> = graph
        .terminal_outputs()
        .keys()
        .filter_map(|spec| graph.node_producing(spec))
        .collect();

    while let Some(index) = stack.pop() {
        if necessary[index.index()] {
            continue;
        }
        necessary[index.index()] = true;

        stack.extend(
            nodes
                .neighbors_directed(index, Direction::Incoming)
                .filter(|producer| !necessary[producer.index()]),
        );
    }

    necessary
}
