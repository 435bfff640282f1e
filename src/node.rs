use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::{ComputationTargetSpecification, ValueSpecification};

/// Identifier of the function a node invokes, together with the parameters
/// it was configured with.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FunctionParameters {
    function_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    parameters: BTreeMap<String, String>,
}

impl FunctionParameters {
    pub fn new(function_id: impl Into<String>) -> Self {
        Self {
            function_id: function_id.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn function_id(&self) -> &str {
        &self.function_id
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

/// A single function invocation over a computation target.
///
/// Nodes only carry what they compute and what they declare to produce. Input
/// bindings live in the graph arena as edges from the producing node, so a
/// node can be handed to a [`NodeFilter`](crate::NodeFilter) without the
/// graph it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyNode {
    function: FunctionParameters,
    target: ComputationTargetSpecification,
    outputs: Vec<ValueSpecification>,
}

impl DependencyNode {
    pub fn new(
        function: FunctionParameters,
        target: ComputationTargetSpecification,
        outputs: impl IntoIterator<Item = ValueSpecification>,
    ) -> Self {
        Self {
            function,
            target,
            outputs: outputs.into_iter().collect(),
        }
    }

    pub fn function(&self) -> &FunctionParameters {
        &self.function
    }

    pub fn function_id(&self) -> &str {
        self.function.function_id()
    }

    pub fn target(&self) -> &ComputationTargetSpecification {
        &self.target
    }

    /// Declared outputs, in declaration order.
    pub fn outputs(&self) -> &[ValueSpecification] {
        &self.outputs
    }

    pub fn produces(&self, specification: &ValueSpecification) -> bool {
        self.outputs.contains(specification)
    }

    /// Copy of this node declaring only the outputs accepted by `keep`.
    pub(crate) fn with_outputs_where<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&ValueSpecification) -> bool,
    {
        Self {
            function: self.function.clone(),
            target: self.target.clone(),
            outputs: self.outputs.iter().filter(|o| keep(*o)).cloned().collect(),
        }
    }
}

impl fmt::Display for DependencyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DependencyNode[{} on {}]", self.function.function_id, self.target)
    }
}
