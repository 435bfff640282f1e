//! Root-discarding subgraphs.
//!
//! When some nodes of a compiled graph stop being valid, everything consuming
//! them, directly or through any chain of inputs, has to go as well. The
//! [`RootDiscardingSubgrapher`] computes what is left:
//!
//! 1. **Validity**: a post-order walk from the roots towards the sources
//!    decides every reachable node exactly once. A node is valid iff the
//!    filter accepts it and every producer of its inputs is valid.
//! 2. **Sweep**: invalid roots are discarded and their valid producers
//!    surface as new roots. Terminal outputs of invalid nodes are reported as
//!    missing requirements.
//!
//! Accepting everything hands the input back borrowed, rejecting everything
//! yields `None`.

use std::borrow::Cow;
use std::collections::HashSet;

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::visit::{DfsPostOrder, EdgeRef, Reversed};
use tracing::Level;

use crate::filter::NodeFilter;
use crate::graph::{DependencyGraph, NodeGraph, TerminalOutputs};
use crate::value::ValueRequirement;

/// Subgraph builder discarding every node that is rejected by a filter or
/// depends on a rejected node.
///
/// ```rust
/// use std::collections::HashSet;
/// use depgraph::{
///     ComputationTargetSpecification, DependencyNode, FunctionParameters, GraphBuilder,
///     RootDiscardingSubgrapher, ValueProperties, ValueSpecification,
/// };
///
/// let target = ComputationTargetSpecification::NULL;
/// let spot = ValueSpecification::new("Spot", target.clone(), "spot", ValueProperties::new());
/// let pv = ValueSpecification::new("PV", target.clone(), "pv", ValueProperties::new());
///
/// let mut builder = GraphBuilder::new("Default");
/// builder.add_node(DependencyNode::new(FunctionParameters::new("spot"), target.clone(), [spot.clone()]))?;
/// let node = builder.add_node(DependencyNode::new(FunctionParameters::new("pv"), target, [pv.clone()]))?;
/// builder.add_input(node, &spot)?;
/// builder.add_terminal_output(pv.clone(), pv.to_requirement())?;
/// let graph = builder.build()?;
///
/// let subgrapher = RootDiscardingSubgrapher::new(|node: &DependencyNode| node.function_id() != "spot");
/// let mut missing = HashSet::new();
/// assert!(subgrapher.subgraph(&graph, &mut missing).is_none());
/// assert!(missing.contains(&pv.to_requirement()));
/// # Ok::<(), depgraph::GraphError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RootDiscardingSubgrapher<F> {
    filter: F,
}

impl<F: NodeFilter> RootDiscardingSubgrapher<F> {
    pub fn new(filter: F) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    /// Keeps the valid part of `graph`.
    ///
    /// Requirements of terminal outputs produced by discarded nodes are added
    /// to `missing`, which may already hold the results of earlier calls.
    pub fn subgraph<'g>(
        &self,
        graph: &'g DependencyGraph,
        missing: &mut HashSet<ValueRequirement>,
    ) -> Option<Cow<'g, DependencyGraph>> {
        let name = graph.calculation_configuration_name();
        let span = tracing::span!(Level::DEBUG, "subgraph", config = name);
        let _enter = span.enter();

        if graph.is_empty() {
            return None;
        }

        let nodes = graph.nodes();
        let validity = Validity::compute(nodes, &graph.root_nodes(), &self.filter);
        validity.report_missing(nodes, graph.terminal_outputs(), missing);

        if validity.rejected == 0 {
            tracing::trace!("all nodes accepted");
            return Some(Cow::Borrowed(graph));
        }
        if validity.rejected == nodes.node_count() {
            tracing::info!("Discarded total dependency graph for {}", name);
            return None;
        }

        let mut filtered = NodeGraph::with_capacity(
            nodes.node_count() - validity.rejected,
            nodes.edge_count(),
        );
        let mut mapping: Vec<Option<NodeIndex>> = vec![None; nodes.node_count()];

        for index in nodes.node_indices() {
            if validity.is_valid(index) {
                mapping[index.index()] = Some(filtered.add_node(nodes[index].clone()));
            }
        }

        // A valid consumer implies a valid producer, so no edge is cut short.
        for edge in nodes.edge_references() {
            if let (Some(producer), Some(consumer)) = (
                mapping[edge.source().index()],
                mapping[edge.target().index()],
            ) {
                filtered.add_edge(producer, consumer, edge.weight().clone());
            }
        }

        let terminal_outputs = graph
            .terminal_outputs()
            .iter()
            .filter(|(spec, _)| {
                graph
                    .node_producing(spec)
                    .is_some_and(|producer| validity.is_valid(producer))
            })
            .map(|(spec, requirements)| (spec.clone(), requirements.clone()))
            .collect();

        tracing::info!(
            "Removed {} nodes from dependency graph for {}",
            validity.rejected,
            name
        );

        Some(Cow::Owned(DependencyGraph::from_parts(
            name.to_owned(),
            filtered,
            terminal_outputs,
        )))
    }

    /// Root-set form of [`subgraph`](Self::subgraph) working directly on a
    /// node arena.
    ///
    /// Valid roots are kept in place. An invalid root is discarded and its
    /// valid producers take its place, unless another surviving node still
    /// consumes them. Returns `None` when `roots` is empty or no node
    /// reachable from it survives.
    pub fn subgraph_roots<'r>(
        &self,
        nodes: &NodeGraph,
        roots: &'r [NodeIndex],
        terminal_outputs: &TerminalOutputs,
        missing: &mut HashSet<ValueRequirement>,
    ) -> Option<Cow<'r, [NodeIndex]>> {
        if roots.is_empty() {
            return None;
        }

        let validity = Validity::compute(nodes, roots, &self.filter);
        validity.report_missing(nodes, terminal_outputs, missing);

        if validity.rejected == 0 {
            return Some(Cow::Borrowed(roots));
        }

        let mut surviving = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = Vec::new();

        for &root in roots {
            stack.push(root);
            while let Some(index) = stack.pop() {
                if !seen.insert(index) {
                    continue;
                }
                if validity.is_valid(index) {
                    surviving.push(index);
                } else {
                    stack.extend(
                        nodes
                            .neighbors_directed(index, Direction::Incoming)
                            .filter(|producer| !seen.contains(producer)),
                    );
                }
            }
        }

        surviving.retain(|&index| {
            !nodes
                .neighbors_directed(index, Direction::Outgoing)
                .any(|consumer| validity.is_valid(consumer))
        });

        if surviving.is_empty() {
            None
        } else {
            Some(Cow::Owned(surviving))
        }
    }
}

impl DependencyGraph {
    /// Shorthand for [`RootDiscardingSubgrapher::subgraph`].
    pub fn subgraph<F: NodeFilter>(
        &self,
        filter: F,
        missing: &mut HashSet<ValueRequirement>,
    ) -> Option<Cow<'_, DependencyGraph>> {
        RootDiscardingSubgrapher::new(filter).subgraph(self, missing)
    }
}

/// Per-node validity of everything reachable from a root set.
struct Validity {
    /// `None` for nodes the walk never reached.
    valid: Vec<Option<bool>>,
    /// Reached nodes, producers before consumers.
    visited: Vec<NodeIndex>,
    rejected: usize,
}

impl Validity {
    fn compute<F>(nodes: &NodeGraph, roots: &[NodeIndex], filter: &F) -> Self
    where
        F: NodeFilter + ?Sized,
    {
        let mut valid = vec![None; nodes.node_count()];
        let mut visited = Vec::new();
        let mut rejected = 0;

        // Walking the reversed arena visits producers; post-order finishes
        // every producer before its consumers.
        let reversed = Reversed(nodes);
        let mut dfs = DfsPostOrder::empty(reversed);

        for &root in roots {
            dfs.move_to(root);
            while let Some(index) = dfs.next(reversed) {
                let accepted = filter.accept(&nodes[index])
                    && nodes
                        .neighbors_directed(index, Direction::Incoming)
                        .all(|producer| valid[producer.index()] == Some(true));

                if !accepted {
                    rejected += 1;
                }
                valid[index.index()] = Some(accepted);
                visited.push(index);
            }
        }

        Self {
            valid,
            visited,
            rejected,
        }
    }

    fn is_valid(&self, index: NodeIndex) -> bool {
        self.valid.get(index.index()) == Some(&Some(true))
    }

    fn report_missing(
        &self,
        nodes: &NodeGraph,
        terminal_outputs: &TerminalOutputs,
        missing: &mut HashSet<ValueRequirement>,
    ) {
        for &index in &self.visited {
            if self.is_valid(index) {
                continue;
            }

            let node = &nodes[index];
            tracing::debug!("Discarding {} from dependency graph", node);
            for output in node.outputs() {
                if let Some(requirements) = terminal_outputs.get(output) {
                    missing.extend(requirements.iter().cloned());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::filter::AcceptAll;
    use crate::fixtures::{
        add, function_ids, index_of, pruning_graph, requirement, terminal, validity_graph,
    };
    use crate::node::DependencyNode;

    fn names(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn reject(function: &'static str) -> impl Fn(&DependencyNode) -> bool {
        move |node: &DependencyNode| node.function_id() != function
    }

    #[test]
    fn rejecting_a_source_discards_its_consumers() {
        let graph = validity_graph();
        let mut missing = HashSet::new();

        let filtered = graph.subgraph(reject("N1"), &mut missing).unwrap();
        assert_eq!(filtered.size(), 5);
        assert_eq!(function_ids(&filtered), names(&["N2", "N3", "N5", "N6", "N7"]));
        assert_eq!(
            missing,
            HashSet::from([requirement("N4", "V4"), requirement("N8", "V8")])
        );
    }

    #[test]
    fn rejecting_a_shared_source_keeps_unrelated_branch() {
        let graph = validity_graph();
        let mut missing = HashSet::new();

        let filtered = graph.subgraph(reject("N2"), &mut missing).unwrap();
        assert_eq!(filtered.size(), 3);
        assert_eq!(function_ids(&filtered), names(&["N1", "N3", "N4"]));
        assert_eq!(
            missing,
            HashSet::from([requirement("N7", "V7"), requirement("N8", "V8")])
        );
        // N3 lost its only consumer and is now a root next to N4.
        assert_eq!(filtered.root_count(), 2);
    }

    #[test]
    fn rejecting_the_root_keeps_everything_below() {
        let graph = validity_graph();
        let mut missing = HashSet::new();

        let filtered = graph.subgraph(reject("N8"), &mut missing).unwrap();
        assert_eq!(filtered.size(), 7);
        assert_eq!(missing, HashSet::from([requirement("N8", "V8")]));
        assert_eq!(filtered.terminal_outputs().len(), 2);
        assert_eq!(filtered.root_count(), 2);
    }

    #[test]
    fn accepting_everything_borrows_input() {
        let graph = validity_graph();
        let mut missing = HashSet::new();

        let filtered = graph.subgraph(AcceptAll, &mut missing).unwrap();
        assert!(matches!(filtered, Cow::Borrowed(g) if std::ptr::eq(g, &graph)));
        assert!(missing.is_empty());
    }

    #[test]
    fn rejecting_everything_yields_none() {
        let graph = validity_graph();
        let mut missing = HashSet::new();

        assert!(graph.subgraph(|_: &DependencyNode| false, &mut missing).is_none());
        assert_eq!(missing.len(), 3);
    }

    #[test]
    fn missing_requirements_accumulate_across_calls() {
        let graph = validity_graph();
        let mut missing = HashSet::new();

        graph.subgraph(reject("N8"), &mut missing);
        graph.subgraph(reject("N1"), &mut missing);
        assert_eq!(
            missing,
            HashSet::from([requirement("N4", "V4"), requirement("N8", "V8")])
        );
    }

    #[test]
    fn filtered_graph_is_closed() {
        let graph = pruning_graph();
        let mut missing = HashSet::new();

        let filtered = graph.subgraph(reject("N5"), &mut missing).unwrap();
        assert_eq!(function_ids(&filtered), names(&["N1", "N2", "N3", "N4", "N6"]));
        for index in filtered.node_indices() {
            for (spec, producer) in filtered.inputs(index) {
                assert!(filtered[producer].produces(spec));
            }
        }
        assert!(missing.is_empty());
    }

    #[test]
    fn filter_sees_each_node_once() {
        use std::cell::Cell;

        let mut builder = GraphBuilder::new("Default");
        add(&mut builder, "S", &[], &["s"]);
        add(&mut builder, "L", &[("S", "s")], &["l"]);
        add(&mut builder, "R", &[("S", "s")], &["r"]);
        add(&mut builder, "J", &[("L", "l"), ("R", "r")], &["j"]);
        terminal(&mut builder, "J", "j");
        let graph = builder.build().unwrap();

        let calls = Cell::new(0);
        let counting = |_: &DependencyNode| {
            calls.set(calls.get() + 1);
            true
        };
        let mut missing = HashSet::new();
        graph.subgraph(counting, &mut missing);
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn root_set_surfaces_valid_producers() {
        let graph = validity_graph();
        let subgrapher = RootDiscardingSubgrapher::new(reject("N8"));
        let roots = graph.root_nodes();
        let mut missing = HashSet::new();

        let filtered = subgrapher
            .subgraph_roots(graph.nodes(), &roots, graph.terminal_outputs(), &mut missing)
            .unwrap();
        let filtered: HashSet<_> = filtered.iter().copied().collect();
        assert_eq!(
            filtered,
            HashSet::from([index_of(&graph, "N4"), index_of(&graph, "N7")])
        );
        assert_eq!(missing, HashSet::from([requirement("N8", "V8")]));
    }

    #[test]
    fn root_set_keeps_producers_still_consumed() {
        let graph = validity_graph();
        let subgrapher = RootDiscardingSubgrapher::new(reject("N2"));
        let roots = graph.root_nodes();
        let mut missing = HashSet::new();

        let filtered = subgrapher
            .subgraph_roots(graph.nodes(), &roots, graph.terminal_outputs(), &mut missing)
            .unwrap();
        let filtered: HashSet<_> = filtered.iter().copied().collect();
        // N1 feeds the surviving N4, so it is not a root of its own.
        assert_eq!(
            filtered,
            HashSet::from([index_of(&graph, "N4"), index_of(&graph, "N3")])
        );
    }

    #[test]
    fn empty_graph_yields_none() {
        let graph = GraphBuilder::new("Empty").build().unwrap();
        let mut missing = HashSet::new();

        assert!(graph.subgraph(AcceptAll, &mut missing).is_none());
        assert!(missing.is_empty());
    }

    #[test]
    fn empty_root_set_yields_none() {
        let graph = validity_graph();
        let mut missing = HashSet::new();

        let filtered = RootDiscardingSubgrapher::new(AcceptAll).subgraph_roots(
            graph.nodes(),
            &[],
            graph.terminal_outputs(),
            &mut missing,
        );
        assert!(filtered.is_none());
        assert!(missing.is_empty());
    }

    #[test]
    fn root_set_fast_paths() {
        let graph = validity_graph();
        let roots = graph.root_nodes();
        let mut missing = HashSet::new();

        let all = RootDiscardingSubgrapher::new(AcceptAll)
            .subgraph_roots(graph.nodes(), &roots, graph.terminal_outputs(), &mut missing)
            .unwrap();
        assert!(matches!(all, Cow::Borrowed(r) if std::ptr::eq(r, roots.as_slice())));

        let none = RootDiscardingSubgrapher::new(|_: &DependencyNode| false).subgraph_roots(
            graph.nodes(),
            &roots,
            graph.terminal_outputs(),
            &mut missing,
        );
        assert!(none.is_none());
        assert_eq!(missing.len(), 3);
    }
}
