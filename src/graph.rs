//! The immutable dependency graph.
//!
//! A [`DependencyGraph`] is a DAG of [`DependencyNode`]s stored in a petgraph
//! arena together with the terminal outputs the graph was built for.
//!
//! ## Arena layout
//!
//! * **Nodes**: addressed by [`NodeIndex`]. Indices are dense and only valid
//!   for the graph they were obtained from.
//! * **Edges**: run from the producer to the consumer and carry the
//!   [`ValueSpecification`] that is consumed. The incoming edges of a node are
//!   therefore its input map, and a node with no outgoing edges is a root.
//!
//! Graphs are never mutated after construction. The reducer and the
//! subgrapher return a [`Cow`](std::borrow::Cow) which is borrowed when the
//! input graph already is the answer.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Index;

use petgraph::Direction;
use petgraph::Graph;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::node::DependencyNode;
use crate::topo::TopologicalNodes;
use crate::value::{ValueRequirement, ValueSpecification};

/// Node arena shared by graphs and the root-set subgrapher.
pub type NodeGraph = Graph<DependencyNode, ValueSpecification>;

/// Terminal output specifications and the requirements they satisfy.
pub type TerminalOutputs = HashMap<ValueSpecification, HashSet<ValueRequirement>>;

#[derive(Clone, Debug)]
pub struct DependencyGraph {
    calculation_configuration_name: String,
    nodes: NodeGraph,
    producers: HashMap<ValueSpecification, NodeIndex>,
    terminal_outputs: TerminalOutputs,
}

impl DependencyGraph {
    /// Assembles a graph from parts that are already known to be consistent,
    /// either checked by the builder or derived from another graph.
    pub(crate) fn from_parts(
        calculation_configuration_name: String,
        nodes: NodeGraph,
        terminal_outputs: TerminalOutputs,
    ) -> Self {
        let producers = nodes
            .node_indices()
            .flat_map(|index| {
                nodes[index]
                    .outputs()
                    .iter()
                    .map(move |output| (output.clone(), index))
            })
            .collect();

        let graph = Self {
            calculation_configuration_name,
            nodes,
            producers,
            terminal_outputs,
        };

        debug_assert!(!petgraph::algo::is_cyclic_directed(&graph.nodes));
        debug_assert!(
            graph
                .terminal_outputs
                .keys()
                .all(|spec| graph.producers.contains_key(spec))
        );
        debug_assert!(graph.nodes.edge_references().all(|edge| {
            graph.producers.get(edge.weight()) == Some(&edge.source())
        }));

        graph
    }

    pub fn calculation_configuration_name(&self) -> &str {
        &self.calculation_configuration_name
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.nodes.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.node_count() == 0
    }

    /// The underlying node arena.
    pub fn nodes(&self) -> &NodeGraph {
        &self.nodes
    }

    pub fn node(&self, index: NodeIndex) -> Option<&DependencyNode> {
        self.nodes.node_weight(index)
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes.node_indices()
    }

    /// Input bindings of a node: every consumed specification with the node
    /// that produces it.
    pub fn inputs(
        &self,
        index: NodeIndex,
    ) -> impl Iterator<Item = (&ValueSpecification, NodeIndex)> + '_ {
        self.nodes
            .edges_directed(index, Direction::Incoming)
            .map(|edge| (edge.weight(), edge.source()))
    }

    /// Nodes producing at least one input of `index`, each reported once.
    pub fn input_nodes(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut seen = HashSet::new();
        self.nodes
            .neighbors_directed(index, Direction::Incoming)
            .filter(|producer| seen.insert(*producer))
            .collect()
    }

    /// Nodes consuming at least one output of `index`, each reported once.
    pub fn dependent_nodes(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut seen = HashSet::new();
        self.nodes
            .neighbors_directed(index, Direction::Outgoing)
            .filter(|consumer| seen.insert(*consumer))
            .collect()
    }

    pub fn terminal_outputs(&self) -> &TerminalOutputs {
        &self.terminal_outputs
    }

    pub fn is_terminal_output(&self, specification: &ValueSpecification) -> bool {
        self.terminal_outputs.contains_key(specification)
    }

    /// The node declaring `specification` as an output.
    pub fn node_producing(&self, specification: &ValueSpecification) -> Option<NodeIndex> {
        self.producers.get(specification).copied()
    }

    /// Every output declared by any node of the graph.
    pub fn output_specifications(&self) -> impl Iterator<Item = &ValueSpecification> + '_ {
        self.nodes
            .node_weights()
            .flat_map(|node| node.outputs().iter())
    }

    /// Whether none of the node's outputs is consumed inside this graph.
    pub fn is_root(&self, index: NodeIndex) -> bool {
        self.nodes
            .neighbors_directed(index, Direction::Outgoing)
            .next()
            .is_none()
    }

    /// Nodes none of whose outputs are consumed by another node, in index
    /// order.
    pub fn root_nodes(&self) -> Vec<NodeIndex> {
        self.nodes
            .node_indices()
            .filter(|&index| self.is_root(index))
            .collect()
    }

    pub fn root_count(&self) -> usize {
        self.nodes
            .node_indices()
            .filter(|&index| self.is_root(index))
            .count()
    }

    /// Nodes in producer-before-consumer order.
    pub fn topological_nodes(&self) -> TopologicalNodes<'_> {
        TopologicalNodes::new(&self.nodes)
    }
}

impl Index<NodeIndex> for DependencyGraph {
    type Output = DependencyNode;

    fn index(&self, index: NodeIndex) -> &DependencyNode {
        &self.nodes[index]
    }
}

/// Renders the graph as a Mermaid flow chart.
impl fmt::Display for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "graph LR")?;

        for index in self.nodes.node_indices() {
            let node = &self.nodes[index];
            let name = node.to_string().replace('"', "\\\"");
            writeln!(f, "    {:?}[\"{}\"]", index.index(), name)?;

            if node.outputs().iter().any(|o| self.is_terminal_output(o)) {
                writeln!(f, "    {:?} --> Output", index.index())?;
            }
        }

        writeln!(f, "    Output[Output]")?;

        for edge in self.nodes.edge_references() {
            let value = edge.weight().value_name().replace('"', "\\\"");
            writeln!(
                f,
                "    {:?} -- \"{}\" --> {:?}",
                edge.source().index(),
                value,
                edge.target().index()
            )?;
        }

        Ok(())
    }
}
