use petgraph::graph::NodeIndex;
use petgraph::visit::{Topo, Visitable};

use crate::graph::NodeGraph;
use crate::node::DependencyNode;

/// Lazy walk over every node of a graph, producers before consumers.
///
/// Nodes without an ordering relationship come out in an unspecified but
/// deterministic order. The walk can't be rewound; ask the graph for a new
/// one instead.
pub struct TopologicalNodes<'a> {
    nodes: &'a NodeGraph,
    topo: Topo<NodeIndex, <NodeGraph as Visitable>::Map>,
}

impl<'a> TopologicalNodes<'a> {
    pub(crate) fn new(nodes: &'a NodeGraph) -> Self {
        Self {
            nodes,
            topo: Topo::new(nodes),
        }
    }
}

impl<'a> Iterator for TopologicalNodes<'a> {
    type Item = (NodeIndex, &'a DependencyNode);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.topo.next(self.nodes)?;
        Some((index, &self.nodes[index]))
    }
}
