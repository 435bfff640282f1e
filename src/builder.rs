use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::NodeIndex;

use crate::error::GraphError;
use crate::graph::{DependencyGraph, NodeGraph, TerminalOutputs};
use crate::node::DependencyNode;
use crate::value::{ValueRequirement, ValueSpecification};

/// Assembles a [`DependencyGraph`] and checks it for malformed input.
///
/// Every structural invariant is checked as soon as the offending piece is
/// added, except acyclicity which is checked once in [`GraphBuilder::build`].
///
/// # Example
///
/// ```rust
/// use depgraph::{
///     ComputationTargetSpecification, DependencyNode, FunctionParameters, GraphBuilder,
///     ValueProperties, ValueSpecification,
/// };
///
/// let target = ComputationTargetSpecification::NULL;
/// let value = ValueSpecification::new("Spot", target.clone(), "spot", ValueProperties::new());
///
/// let mut builder = GraphBuilder::new("Default");
/// builder.add_node(DependencyNode::new(
///     FunctionParameters::new("spot"),
///     target,
///     [value.clone()],
/// ))?;
/// builder.add_terminal_output(value.clone(), value.to_requirement())?;
///
/// let graph = builder.build()?;
/// assert_eq!(graph.size(), 1);
/// # Ok::<(), depgraph::GraphError>(())
/// ```
pub struct GraphBuilder {
    calculation_configuration_name: String,
    nodes: NodeGraph,
    producers: HashMap<ValueSpecification, NodeIndex>,
    terminal_outputs: TerminalOutputs,
}

impl GraphBuilder {
    pub fn new(calculation_configuration_name: impl Into<String>) -> Self {
        Self {
            calculation_configuration_name: calculation_configuration_name.into(),
            nodes: NodeGraph::new(),
            producers: HashMap::new(),
            terminal_outputs: TerminalOutputs::new(),
        }
    }

    /// Adds a node. Its outputs must be non-empty and not declared by any
    /// node added before.
    pub fn add_node(&mut self, node: DependencyNode) -> Result<NodeIndex, GraphError> {
        if node.outputs().is_empty() {
            return Err(GraphError::NoOutputs(node.to_string()));
        }

        for (i, output) in node.outputs().iter().enumerate() {
            let repeated = node.outputs()[..i].contains(output);
            if repeated {
                return Err(GraphError::DuplicateOutput(
                    Box::new(output.clone()),
                    node.to_string(),
                ));
            }
            if let Some(&owner) = self.producers.get(output) {
                return Err(GraphError::DuplicateOutput(
                    Box::new(output.clone()),
                    self.nodes[owner].to_string(),
                ));
            }
        }

        let outputs = node.outputs().to_vec();
        let index = self.nodes.add_node(node);
        for output in outputs {
            self.producers.insert(output, index);
        }

        Ok(index)
    }

    /// Binds `specification` as an input of `consumer` to the node that
    /// declares it.
    pub fn add_input(
        &mut self,
        consumer: NodeIndex,
        specification: &ValueSpecification,
    ) -> Result<(), GraphError> {
        let Some(node) = self.nodes.node_weight(consumer) else {
            return Err(GraphError::UnknownNode(consumer.index()));
        };

        let Some(&producer) = self.producers.get(specification) else {
            return Err(GraphError::UnknownProducer(Box::new(specification.clone())));
        };

        if producer == consumer {
            return Err(GraphError::SelfInput(
                node.to_string(),
                Box::new(specification.clone()),
            ));
        }

        let bound = self
            .nodes
            .edges_directed(consumer, Direction::Incoming)
            .any(|edge| edge.weight() == specification);
        if bound {
            return Err(GraphError::DuplicateInput(
                node.to_string(),
                Box::new(specification.clone()),
            ));
        }

        self.nodes.add_edge(producer, consumer, specification.clone());

        Ok(())
    }

    pub fn add_inputs<'a>(
        &mut self,
        consumer: NodeIndex,
        specifications: impl IntoIterator<Item = &'a ValueSpecification>,
    ) -> Result<(), GraphError> {
        for specification in specifications {
            self.add_input(consumer, specification)?;
        }
        Ok(())
    }

    /// Marks `specification` as requested by `requirement`. A specification
    /// may satisfy any number of requirements.
    pub fn add_terminal_output(
        &mut self,
        specification: ValueSpecification,
        requirement: ValueRequirement,
    ) -> Result<(), GraphError> {
        if !self.producers.contains_key(&specification) {
            return Err(GraphError::UnproducedTerminal(Box::new(specification)));
        }

        self.terminal_outputs
            .entry(specification)
            .or_default()
            .insert(requirement);

        Ok(())
    }

    pub fn build(self) -> Result<DependencyGraph, GraphError> {
        if let Err(cycle) = petgraph::algo::toposort(&self.nodes, None) {
            return Err(GraphError::Cycle(self.nodes[cycle.node_id()].to_string()));
        }

        Ok(DependencyGraph::from_parts(
            self.calculation_configuration_name,
            self.nodes,
            self.terminal_outputs,
        ))
    }
}
