use depgraph::{
    ComputationTargetSpecification, DependencyGraph, DependencyNode, FunctionParameters,
    GraphBuilder, GraphError, NodeIndex, ValueProperties, ValueSpecification,
};

/// A node running `function`, consuming `inputs` as `(producer, value)` and
/// declaring `outputs`.
struct Spec<'a> {
    function: &'a str,
    inputs: &'a [(&'a str, &'a str)],
    outputs: &'a [&'a str],
}

const fn spec<'a>(
    function: &'a str,
    inputs: &'a [(&'a str, &'a str)],
    outputs: &'a [&'a str],
) -> Spec<'a> {
    Spec {
        function,
        inputs,
        outputs,
    }
}

fn value(function: &str, name: &str) -> ValueSpecification {
    ValueSpecification::new(
        name,
        ComputationTargetSpecification::NULL,
        function,
        ValueProperties::new(),
    )
}

fn build(nodes: &[Spec], terminals: &[(&str, &str)]) -> Result<DependencyGraph, GraphError> {
    let mut builder = GraphBuilder::new("Default");

    for node in nodes {
        let index: NodeIndex = builder.add_node(DependencyNode::new(
            FunctionParameters::new(node.function),
            ComputationTargetSpecification::NULL,
            node.outputs.iter().map(|name| value(node.function, name)),
        ))?;

        for (producer, name) in node.inputs {
            builder.add_input(index, &value(producer, name))?;
        }
    }

    for (function, name) in terminals {
        let output = value(function, name);
        builder.add_terminal_output(output.clone(), output.to_requirement())?;
    }

    builder.build()
}

pub fn pruning() -> Result<DependencyGraph, GraphError> {
    build(
        &[
            spec("N1", &[], &["A", "X"]),
            spec("N2", &[], &["B"]),
            spec("N3", &[], &["C", "Y"]),
            spec("N4", &[("N1", "A"), ("N2", "B")], &["D", "Z"]),
            spec("N5", &[("N2", "B"), ("N3", "C")], &["E"]),
            spec("N6", &[("N4", "D")], &["F"]),
            spec("N7", &[("N4", "D"), ("N5", "E")], &["G"]),
            spec("N8", &[("N5", "E")], &["H"]),
        ],
        &[("N3", "Y"), ("N6", "F")],
    )
}

pub fn diamond() -> Result<DependencyGraph, GraphError> {
    build(
        &[
            spec("A", &[], &["v0", "v1", "v2"]),
            spec("B", &[("A", "v2")], &["v3"]),
            spec("C", &[("A", "v1"), ("B", "v3")], &["v4"]),
        ],
        &[("A", "v0"), ("C", "v4")],
    )
}

pub fn validity() -> Result<DependencyGraph, GraphError> {
    build(
        &[
            spec("N1", &[], &["V1"]),
            spec("N2", &[], &["V2"]),
            spec("N3", &[], &["V3"]),
            spec("N4", &[("N1", "V1")], &["V4"]),
            spec("N5", &[("N2", "V2")], &["V5"]),
            spec("N6", &[("N2", "V2"), ("N3", "V3")], &["V6"]),
            spec("N7", &[("N5", "V5"), ("N6", "V6")], &["V7"]),
            spec("N8", &[("N4", "V4"), ("N7", "V7")], &["V8"]),
        ],
        &[("N4", "V4"), ("N7", "V7"), ("N8", "V8")],
    )
}
