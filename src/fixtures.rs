//! Graphs shared by the unit tests.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::builder::GraphBuilder;
use crate::graph::DependencyGraph;
use crate::node::{DependencyNode, FunctionParameters};
use crate::value::{
    ComputationTargetSpecification, ValueProperties, ValueRequirement, ValueSpecification,
};

pub(crate) fn spec(function: &str, name: &str) -> ValueSpecification {
    ValueSpecification::new(
        name,
        ComputationTargetSpecification::NULL,
        function,
        ValueProperties::new(),
    )
}

pub(crate) fn requirement(function: &str, name: &str) -> ValueRequirement {
    spec(function, name).to_requirement()
}

pub(crate) fn node(
    function: &str,
    outputs: impl IntoIterator<Item = ValueSpecification>,
) -> DependencyNode {
    DependencyNode::new(
        FunctionParameters::new(function),
        ComputationTargetSpecification::NULL,
        outputs,
    )
}

/// Index of the node running `function`.
pub(crate) fn index_of(graph: &DependencyGraph, function: &str) -> NodeIndex {
    graph
        .node_indices()
        .find(|&index| graph[index].function_id() == function)
        .unwrap_or_else(|| panic!("no node runs {function}"))
}

pub(crate) fn function_ids(graph: &DependencyGraph) -> HashSet<String> {
    graph
        .node_indices()
        .map(|index| graph[index].function_id().to_owned())
        .collect()
}

pub(crate) fn output_names(graph: &DependencyGraph) -> HashSet<String> {
    graph
        .output_specifications()
        .map(|spec| spec.value_name().to_owned())
        .collect()
}

/// Adds a node running `function` that consumes `inputs` (as
/// `(producer, value)` pairs) and declares `outputs`.
pub(crate) fn add(
    builder: &mut GraphBuilder,
    function: &str,
    inputs: &[(&str, &str)],
    outputs: &[&str],
) -> NodeIndex {
    let index = builder
        .add_node(node(function, outputs.iter().map(|name| spec(function, name))))
        .unwrap();
    for (producer, name) in inputs {
        builder.add_input(index, &spec(producer, name)).unwrap();
    }
    index
}

pub(crate) fn terminal(builder: &mut GraphBuilder, function: &str, name: &str) {
    builder
        .add_terminal_output(spec(function, name), requirement(function, name))
        .unwrap();
}

/// Eight nodes where only N1, N2, N3, N4 and N6 contribute to the terminal
/// outputs F and Y.
pub(crate) fn pruning_graph() -> DependencyGraph {
    let mut builder = GraphBuilder::new("Default");
    add(&mut builder, "N1", &[], &["A", "X"]);
    add(&mut builder, "N2", &[], &["B"]);
    add(&mut builder, "N3", &[], &["C", "Y"]);
    add(&mut builder, "N4", &[("N1", "A"), ("N2", "B")], &["D", "Z"]);
    add(&mut builder, "N5", &[("N2", "B"), ("N3", "C")], &["E"]);
    add(&mut builder, "N6", &[("N4", "D")], &["F"]);
    add(&mut builder, "N7", &[("N4", "D"), ("N5", "E")], &["G"]);
    add(&mut builder, "N8", &[("N5", "E")], &["H"]);
    terminal(&mut builder, "N3", "Y");
    terminal(&mut builder, "N6", "F");
    builder.build().unwrap()
}

/// A feeds C directly and through B; nothing can be pruned.
pub(crate) fn diamond_graph() -> DependencyGraph {
    let mut builder = GraphBuilder::new("Default");
    add(&mut builder, "A", &[], &["v0", "v1", "v2"]);
    add(&mut builder, "B", &[("A", "v2")], &["v3"]);
    add(&mut builder, "C", &[("A", "v1"), ("B", "v3")], &["v4"]);
    terminal(&mut builder, "A", "v0");
    terminal(&mut builder, "C", "v4");
    builder.build().unwrap()
}

/// Three sources feeding a single root N8. N4, N7 and N8 are terminal, each
/// node `Nk` declares the single output `Vk`.
pub(crate) fn validity_graph() -> DependencyGraph {
    let mut builder = GraphBuilder::new("Default");
    add(&mut builder, "N1", &[], &["V1"]);
    add(&mut builder, "N2", &[], &["V2"]);
    add(&mut builder, "N3", &[], &["V3"]);
    add(&mut builder, "N4", &[("N1", "V1")], &["V4"]);
    add(&mut builder, "N5", &[("N2", "V2")], &["V5"]);
    add(&mut builder, "N6", &[("N2", "V2"), ("N3", "V3")], &["V6"]);
    add(&mut builder, "N7", &[("N5", "V5"), ("N6", "V6")], &["V7"]);
    add(&mut builder, "N8", &[("N4", "V4"), ("N7", "V7")], &["V8"]);
    terminal(&mut builder, "N4", "V4");
    terminal(&mut builder, "N7", "V7");
    terminal(&mut builder, "N8", "V8");
    builder.build().unwrap()
}
