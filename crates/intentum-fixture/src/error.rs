use std::path::PathBuf;

use thiserror::Error;

/// Structural problems found by [`crate::checker::check_model`].
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("model ir_version is not set")]
    MissingIrVersion,
    #[error("ir_version {ir_version} is not supported (expected {min}..={max})")]
    UnsupportedIrVersion { ir_version: i64, min: i64, max: i64 },
    #[error("model declares no opset imports")]
    MissingOpsetImport,
    #[error("opset domain '{0}' is imported more than once")]
    DuplicateOpsetDomain(String),
    #[error("default-domain opset version {0} is not supported")]
    UnsupportedOpset(i64),
    #[error("model has no graph")]
    MissingGraph,
    #[error("graph name is empty")]
    UnnamedGraph,
    #[error("graph has no nodes")]
    EmptyGraph,
    #[error("graph declares no outputs")]
    NoGraphOutputs,
    #[error("{kind} #{index} has an empty name")]
    EmptyName { kind: &'static str, index: usize },
    #[error("value '{name}': {reason}")]
    InvalidValueInfo { name: String, reason: String },
    #[error("initializer '{name}': {reason}")]
    InvalidInitializer { name: String, reason: String },
    #[error("initializer '{name}' holds {actual} elements but shape {dims:?} needs {expected}")]
    InitializerLength {
        name: String,
        dims: Vec<i64>,
        expected: usize,
        actual: usize,
    },
    #[error("name '{0}' is defined more than once")]
    DuplicateName(String),
    #[error("operator '{op_type}' is not known in domain '{domain}'")]
    UnknownOperator { op_type: String, domain: String },
    #[error("operator '{op_type}' needs opset {since}, model imports {imported}")]
    OperatorNotInOpset {
        op_type: String,
        since: i64,
        imported: i64,
    },
    #[error("node {node} ({op_type}) expects {expected} {what}, got {actual}")]
    Arity {
        node: String,
        op_type: String,
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("node {node} ({op_type}) has unexpected attribute '{attribute}'")]
    UnexpectedAttribute {
        node: String,
        op_type: String,
        attribute: String,
    },
    #[error("node {node} ({op_type}) reads '{input}' before it is defined")]
    UndefinedInput {
        node: String,
        op_type: String,
        input: String,
    },
    #[error("node {node} ({op_type}): {reason}")]
    ShapeInference {
        node: String,
        op_type: String,
        reason: String,
    },
    #[error("graph output '{0}' is never produced")]
    UndefinedOutput(String),
    #[error("graph output '{name}' is declared as {declared} but inferred as {inferred}")]
    OutputMismatch {
        name: String,
        declared: String,
        inferred: String,
    },
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("model failed validation: {0}")]
    ModelInvalid(CheckError),
    #[error("failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<CheckError> for FixtureError {
    fn from(err: CheckError) -> Self {
        FixtureError::ModelInvalid(err)
    }
}

impl FixtureError {
    /// Process exit status for this failure (sysexits `EX_DATAERR` / `EX_IOERR`).
    pub fn exit_code(&self) -> u8 {
        match self {
            FixtureError::ModelInvalid(_) => 65,
            FixtureError::Io { .. } => 74,
        }
    }
}
