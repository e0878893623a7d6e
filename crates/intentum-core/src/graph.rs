use crate::{IOName, Initializer, TensorSpec};

/// The default (`ai.onnx`) operator domain is spelled as the empty string.
pub const DEFAULT_DOMAIN: &str = "";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpsetId {
    pub domain: String,
    pub version: i64,
}

impl OpsetId {
    pub fn default_domain(version: i64) -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            version,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationNode {
    pub op_type: String,
    pub domain: String,
    pub name: String,
    pub inputs: Vec<IOName>,
    pub outputs: Vec<IOName>,
}

impl OperationNode {
    /// Unnamed node in the default domain.
    pub fn new(op_type: impl Into<String>, inputs: &[&str], outputs: &[&str]) -> Self {
        Self {
            op_type: op_type.into(),
            domain: DEFAULT_DOMAIN.to_string(),
            name: String::new(),
            inputs: inputs.iter().map(|n| IOName::new(*n)).collect(),
            outputs: outputs.iter().map(|n| IOName::new(*n)).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphDescriptor {
    pub name: String,
    pub nodes: Vec<OperationNode>,
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
    pub initializers: Vec<Initializer>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModelDescriptor {
    pub ir_version: i64,
    pub producer_name: String,
    pub opset_imports: Vec<OpsetId>,
    pub graph: GraphDescriptor,
}

impl ModelDescriptor {
    pub fn initializer(&self, name: &str) -> Option<&Initializer> {
        self.graph
            .initializers
            .iter()
            .find(|init| init.name.as_str() == name)
    }

    pub fn initializer_mut(&mut self, name: &str) -> Option<&mut Initializer> {
        self.graph
            .initializers
            .iter_mut()
            .find(|init| init.name.as_str() == name)
    }
}
