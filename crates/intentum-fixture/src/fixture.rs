use std::fs;
use std::path::{Path, PathBuf};

use intentum_core::{
    DType, GraphDescriptor, Initializer, ModelDescriptor, OperationNode, OpsetId, Shape,
    TensorSpec,
};
use intentum_proto::encode_model;
use tracing::{debug, info};

use crate::builder::lower_model;
use crate::checker::check_model;
use crate::error::FixtureError;

pub const GRAPH_NAME: &str = "minimal_intent";
pub const FILE_NAME: &str = "minimal_intent.onnx";
pub const PRODUCER_NAME: &str = "intentum-fixture";
pub const IR_VERSION: i64 = 8;
pub const OPSET_VERSION: i64 = 14;

pub const INPUT_NAME: &str = "input";
pub const OUTPUT_NAME: &str = "output";
pub const WEIGHT_NAME: &str = "W";

/// Row-major [2,3]: row 0 = [1,0,0], row 1 = [0,1,0]. The two input features
/// land in the first two output columns and the third column stays zero.
pub const WEIGHTS: [f32; 6] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

pub fn minimal_intent() -> ModelDescriptor {
    let input = TensorSpec::fixed(INPUT_NAME, DType::F32, &Shape::from_slice(&[1, 2]));
    let output = TensorSpec::fixed(OUTPUT_NAME, DType::F32, &Shape::from_slice(&[1, 3]));
    let weights = Initializer::from_f32(WEIGHT_NAME, Shape::from_slice(&[2, 3]), &WEIGHTS);
    let matmul = OperationNode::new("MatMul", &[INPUT_NAME, WEIGHT_NAME], &[OUTPUT_NAME]);

    ModelDescriptor {
        ir_version: IR_VERSION,
        producer_name: PRODUCER_NAME.to_string(),
        opset_imports: vec![OpsetId::default_domain(OPSET_VERSION)],
        graph: GraphDescriptor {
            name: GRAPH_NAME.to_string(),
            nodes: vec![matmul],
            inputs: vec![input],
            outputs: vec![output],
            initializers: vec![weights],
        },
    }
}

/// `tests/fixtures/minimal_intent.onnx` under this crate's directory.
pub fn default_output_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(FILE_NAME)
}

pub fn generate_fixture(path: impl AsRef<Path>) -> Result<PathBuf, FixtureError> {
    write_model(&minimal_intent(), path)
}

/// Lowers and checks `model`, then writes it to `path`, creating missing
/// parent directories and replacing any existing file. Nothing touches the
/// filesystem unless the check passes.
pub fn write_model(
    model: &ModelDescriptor,
    path: impl AsRef<Path>,
) -> Result<PathBuf, FixtureError> {
    let path = path.as_ref();
    let proto = lower_model(model);
    check_model(&proto)?;

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        debug!(dir = %dir.display(), "ensuring output directory");
        fs::create_dir_all(dir).map_err(|source| FixtureError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let bytes = encode_model(&proto);
    fs::write(path, &bytes).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), bytes = bytes.len(), graph = %model.graph.name, "model written");
    Ok(path.to_path_buf())
}
