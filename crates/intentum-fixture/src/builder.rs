use intentum_core::{
    DType, GraphDescriptor, Initializer, ModelDescriptor, OperationNode, OpsetId, TensorSpec,
};
use intentum_proto::{
    tensor_shape_proto::{dimension, Dimension},
    type_proto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto,
    TensorShapeProto, TypeProto, ValueInfoProto,
};
use tracing::debug;

pub fn lower_model(model: &ModelDescriptor) -> ModelProto {
    debug!(
        graph = %model.graph.name,
        ir_version = model.ir_version,
        "lowering model"
    );

    ModelProto {
        ir_version: model.ir_version,
        producer_name: model.producer_name.clone(),
        graph: Some(graph(&model.graph)),
        opset_import: model.opset_imports.iter().map(opset_id).collect(),
        ..Default::default()
    }
}

pub fn opset_id(opset: &OpsetId) -> OperatorSetIdProto {
    OperatorSetIdProto {
        domain: opset.domain.clone(),
        version: opset.version,
    }
}

pub fn graph(graph: &GraphDescriptor) -> GraphProto {
    GraphProto {
        node: graph.nodes.iter().map(node).collect(),
        name: graph.name.clone(),
        initializer: graph.initializers.iter().map(tensor).collect(),
        input: graph.inputs.iter().map(tensor_value_info).collect(),
        output: graph.outputs.iter().map(tensor_value_info).collect(),
        ..Default::default()
    }
}

pub fn node(node: &OperationNode) -> NodeProto {
    NodeProto {
        input: node.inputs.iter().map(|n| n.0.clone()).collect(),
        output: node.outputs.iter().map(|n| n.0.clone()).collect(),
        name: node.name.clone(),
        op_type: node.op_type.clone(),
        domain: node.domain.clone(),
        ..Default::default()
    }
}

/// Dynamic dimensions become symbolic `<tensor>_dim<i>` parameters.
pub fn tensor_value_info(spec: &TensorSpec) -> ValueInfoProto {
    let dim = spec
        .dims
        .iter()
        .enumerate()
        .map(|(i, d)| Dimension {
            value: Some(match d {
                Some(v) => dimension::Value::DimValue(*v as i64),
                None => dimension::Value::DimParam(format!("{}_dim{i}", spec.name)),
            }),
            ..Default::default()
        })
        .collect();

    ValueInfoProto {
        name: spec.name.0.clone(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: spec.dtype.onnx_code(),
                shape: Some(TensorShapeProto { dim }),
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Typed payload fields are used where ONNX has one; F16 and any payload that
/// is not a whole number of elements go to `raw_data` verbatim.
pub fn tensor(init: &Initializer) -> TensorProto {
    let mut proto = TensorProto {
        dims: init.shape.0.iter().map(|d| *d as i64).collect(),
        data_type: init.dtype.onnx_code(),
        name: init.name.0.clone(),
        ..Default::default()
    };

    if init.bytes.len() % init.dtype.byte_size() != 0 {
        proto.raw_data = init.bytes.clone();
        return proto;
    }

    match init.dtype {
        DType::F32 => proto.float_data = init.to_f32().unwrap_or_default(),
        DType::I64 => proto.int64_data = init.to_i64().unwrap_or_default(),
        DType::I32 | DType::U8 => proto.int32_data = init.to_i32_widened().unwrap_or_default(),
        DType::F16 => proto.raw_data = init.bytes.clone(),
    }
    proto
}
