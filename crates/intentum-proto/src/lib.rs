//! ONNX interchange schema, restricted to the messages a single-graph model
//! needs. Field tags follow `onnx.proto` so the output is readable by any
//! ONNX consumer; fields this crate never writes are left out and skipped on
//! decode.

pub mod onnx;

use prost::Message;

pub use onnx::*;

/// Serializes a model to the ONNX binary encoding.
pub fn encode_model(model: &ModelProto) -> Vec<u8> {
    model.encode_to_vec()
}

pub fn decode_model(bytes: &[u8]) -> Result<ModelProto, prost::DecodeError> {
    ModelProto::decode(bytes)
}
