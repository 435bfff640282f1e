//! Value identities used as graph keys.
//!
//! A [`ValueSpecification`] names exactly one value produced by exactly one
//! function invocation, while a [`ValueRequirement`] is the looser request a
//! caller made for that value. Both are addressed to a
//! [`ComputationTargetSpecification`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of an entity, written as `Scheme~Value`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UniqueId {
    scheme: Box<str>,
    value: Box<str>,
}

impl UniqueId {
    pub fn new(scheme: impl Into<Box<str>>, value: impl Into<Box<str>>) -> Self {
        Self {
            scheme: scheme.into(),
            value: value.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.scheme, self.value)
    }
}

/// The kind of entity a computation runs over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComputationTargetType {
    /// Nothing at all, e.g. functions producing global values.
    Null,
    Primitive,
    Security,
    Position,
    Trade,
    PortfolioNode,
}

/// Reference to the entity a node computes over.
///
/// The graph algorithms treat this as an opaque comparable value; only node
/// filters look inside it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComputationTargetSpecification {
    target_type: ComputationTargetType,
    unique_id: Option<UniqueId>,
}

impl ComputationTargetSpecification {
    /// The target of functions that don't compute over any entity.
    pub const NULL: Self = Self {
        target_type: ComputationTargetType::Null,
        unique_id: None,
    };

    pub fn new(target_type: ComputationTargetType, unique_id: UniqueId) -> Self {
        Self {
            target_type,
            unique_id: Some(unique_id),
        }
    }

    pub fn target_type(&self) -> ComputationTargetType {
        self.target_type
    }

    pub fn unique_id(&self) -> Option<&UniqueId> {
        self.unique_id.as_ref()
    }
}

impl fmt::Display for ComputationTargetSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unique_id {
            Some(id) => write!(f, "{:?}[{}]", self.target_type, id),
            None => write!(f, "{:?}", self.target_type),
        }
    }
}

/// Ordered property set attached to values, `name -> {values}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueProperties(BTreeMap<String, BTreeSet<String>>);

impl ValueProperties {
    /// Property naming the function that produced a value.
    pub const FUNCTION: &'static str = "Function";

    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` under the property `name`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.entry(name.into()).or_default().insert(value.into());
        self
    }

    pub fn values(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.0.get(name)
    }

    /// First value of a property, if the property is present.
    pub fn single_value(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(|values| values.iter().next())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.0.iter().map(|(name, values)| (name.as_str(), values))
    }
}

impl fmt::Display for ValueProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, values)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let values: Vec<_> = values.iter().map(String::as_str).collect();
            write!(f, "{}=[{}]", name, values.join(","))?;
        }
        write!(f, "}}")
    }
}

/// Fully resolved identity of one output value.
///
/// Two specifications are equal iff the value name, the target and every
/// property (including the producing function) match.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueSpecification {
    value_name: String,
    target: ComputationTargetSpecification,
    properties: ValueProperties,
}

impl ValueSpecification {
    /// Creates a specification for `value_name` on `target` produced by the
    /// function `function_id`. The function is recorded as the
    /// [`ValueProperties::FUNCTION`] property.
    pub fn new(
        value_name: impl Into<String>,
        target: ComputationTargetSpecification,
        function_id: impl Into<String>,
        properties: ValueProperties,
    ) -> Self {
        Self {
            value_name: value_name.into(),
            target,
            properties: properties.with(ValueProperties::FUNCTION, function_id),
        }
    }

    pub fn value_name(&self) -> &str {
        &self.value_name
    }

    pub fn target(&self) -> &ComputationTargetSpecification {
        &self.target
    }

    pub fn properties(&self) -> &ValueProperties {
        &self.properties
    }

    pub fn function_id(&self) -> Option<&str> {
        self.properties.single_value(ValueProperties::FUNCTION)
    }

    /// The requirement this specification would satisfy with no constraints.
    pub fn to_requirement(&self) -> ValueRequirement {
        ValueRequirement::new(self.value_name.clone(), self.target.clone())
    }
}

impl fmt::Display for ValueSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VSpec[{}, {}, {}]",
            self.value_name, self.target, self.properties
        )
    }
}

/// A request for a named value on a target. Only used for reporting which
/// requested values a graph can or cannot deliver.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueRequirement {
    value_name: String,
    target: ComputationTargetSpecification,
    #[serde(default, skip_serializing_if = "ValueProperties::is_empty")]
    constraints: ValueProperties,
}

impl ValueRequirement {
    pub fn new(value_name: impl Into<String>, target: ComputationTargetSpecification) -> Self {
        Self {
            value_name: value_name.into(),
            target,
            constraints: ValueProperties::default(),
        }
    }

    pub fn with_constraints(mut self, constraints: ValueProperties) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn value_name(&self) -> &str {
        &self.value_name
    }

    pub fn target(&self) -> &ComputationTargetSpecification {
        &self.target
    }

    pub fn constraints(&self) -> &ValueProperties {
        &self.constraints
    }
}

impl fmt::Display for ValueRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VReq[{}, {}", self.value_name, self.target)?;
        if !self.constraints.is_empty() {
            write!(f, ", {}", self.constraints)?;
        }
        write!(f, "]")
    }
}
