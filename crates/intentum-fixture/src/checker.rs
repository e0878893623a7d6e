use std::collections::{HashMap, HashSet};

use intentum_core::{DType, DEFAULT_DOMAIN};
use intentum_proto::{
    tensor_shape_proto::dimension, type_proto, GraphProto, ModelProto, NodeProto, TensorProto,
    ValueInfoProto,
};
use tracing::debug;

use crate::error::CheckError;
use crate::ops::{self, ValueType};

const MIN_IR_VERSION: i64 = 3;
const MAX_IR_VERSION: i64 = 10;
const MAX_OPSET_VERSION: i64 = 21;

pub fn check_model(model: &ModelProto) -> Result<(), CheckError> {
    let opset = check_versions(model)?;
    let graph = model.graph.as_ref().ok_or(CheckError::MissingGraph)?;
    check_graph(graph, opset)?;
    debug!(graph = %graph.name, opset, "model passed checks");
    Ok(())
}

/// Returns the imported default-domain opset version.
fn check_versions(model: &ModelProto) -> Result<i64, CheckError> {
    if model.ir_version <= 0 {
        return Err(CheckError::MissingIrVersion);
    }
    if model.opset_import.is_empty() {
        return Err(CheckError::MissingOpsetImport);
    }

    let mut seen = HashSet::new();
    for import in &model.opset_import {
        if !seen.insert(import.domain.as_str()) {
            return Err(CheckError::DuplicateOpsetDomain(import.domain.clone()));
        }
    }

    let opset = model
        .opset_import
        .iter()
        .find(|import| import.domain == DEFAULT_DOMAIN || import.domain == "ai.onnx")
        .map(|import| import.version)
        .ok_or(CheckError::MissingOpsetImport)?;
    if !(1..=MAX_OPSET_VERSION).contains(&opset) {
        return Err(CheckError::UnsupportedOpset(opset));
    }

    let min = min_ir_version(opset);
    if !(min..=MAX_IR_VERSION).contains(&model.ir_version) {
        return Err(CheckError::UnsupportedIrVersion {
            ir_version: model.ir_version,
            min,
            max: MAX_IR_VERSION,
        });
    }
    Ok(opset)
}

/// Oldest IR revision released alongside each default-domain opset.
fn min_ir_version(opset: i64) -> i64 {
    match opset {
        ..=8 => MIN_IR_VERSION,
        9 => 4,
        10 => 5,
        11 => 6,
        12..=14 => 7,
        15..=18 => 8,
        19 | 20 => 9,
        _ => 10,
    }
}

fn check_graph(graph: &GraphProto, opset: i64) -> Result<(), CheckError> {
    if graph.name.is_empty() {
        return Err(CheckError::UnnamedGraph);
    }
    if graph.node.is_empty() {
        return Err(CheckError::EmptyGraph);
    }
    if graph.output.is_empty() {
        return Err(CheckError::NoGraphOutputs);
    }

    let mut env: HashMap<String, ValueType> = HashMap::new();

    for (index, input) in graph.input.iter().enumerate() {
        let ty = value_type("graph input", index, input)?;
        if env.insert(input.name.clone(), ty).is_some() {
            return Err(CheckError::DuplicateName(input.name.clone()));
        }
    }

    let mut initializers = HashSet::new();
    for (index, init) in graph.initializer.iter().enumerate() {
        let ty = initializer_type(index, init)?;
        if !initializers.insert(init.name.as_str()) {
            return Err(CheckError::DuplicateName(init.name.clone()));
        }
        // Sharing a name with a graph input is how an initializer supplies a
        // default for that input; the declared input type wins.
        env.entry(init.name.clone()).or_insert(ty);
    }

    for (index, node) in graph.node.iter().enumerate() {
        let ty = check_node(index, node, opset, &env)?;
        for name in &node.output {
            if name.is_empty() {
                return Err(CheckError::EmptyName {
                    kind: "node output",
                    index,
                });
            }
            if env.insert(name.clone(), ty.clone()).is_some() {
                return Err(CheckError::DuplicateName(name.clone()));
            }
        }
    }

    for (index, output) in graph.output.iter().enumerate() {
        let declared = value_type("graph output", index, output)?;
        let inferred = env
            .get(&output.name)
            .ok_or_else(|| CheckError::UndefinedOutput(output.name.clone()))?;
        if !compatible(&declared, inferred) {
            return Err(CheckError::OutputMismatch {
                name: output.name.clone(),
                declared: describe(&declared),
                inferred: describe(inferred),
            });
        }
    }

    Ok(())
}

fn check_node(
    index: usize,
    node: &NodeProto,
    opset: i64,
    env: &HashMap<String, ValueType>,
) -> Result<ValueType, CheckError> {
    let label = if node.name.is_empty() {
        format!("#{index}")
    } else {
        format!("'{}'", node.name)
    };
    let domain = if node.domain == "ai.onnx" {
        DEFAULT_DOMAIN
    } else {
        node.domain.as_str()
    };

    let schema = ops::lookup(domain, &node.op_type).ok_or_else(|| CheckError::UnknownOperator {
        op_type: node.op_type.clone(),
        domain: node.domain.clone(),
    })?;
    if schema.since_version > opset {
        return Err(CheckError::OperatorNotInOpset {
            op_type: node.op_type.clone(),
            since: schema.since_version,
            imported: opset,
        });
    }

    let arity = |what: &'static str, expected: usize, actual: usize| {
        if expected == actual {
            Ok(())
        } else {
            Err(CheckError::Arity {
                node: label.clone(),
                op_type: node.op_type.clone(),
                what,
                expected,
                actual,
            })
        }
    };
    arity("inputs", schema.inputs, node.input.len())?;
    arity("outputs", schema.outputs, node.output.len())?;

    if let Some(attr) = node.attribute.first() {
        return Err(CheckError::UnexpectedAttribute {
            node: label,
            op_type: node.op_type.clone(),
            attribute: attr.name.clone(),
        });
    }

    let inputs = node
        .input
        .iter()
        .map(|name| {
            env.get(name).ok_or_else(|| CheckError::UndefinedInput {
                node: label.clone(),
                op_type: node.op_type.clone(),
                input: name.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ty = schema
        .infer(&inputs)
        .map_err(|reason| CheckError::ShapeInference {
            node: label.clone(),
            op_type: node.op_type.clone(),
            reason,
        })?;
    debug!(node = %label, op_type = %node.op_type, dims = ?ty.dims, "inferred node output");
    Ok(ty)
}

fn value_type(
    kind: &'static str,
    index: usize,
    info: &ValueInfoProto,
) -> Result<ValueType, CheckError> {
    if info.name.is_empty() {
        return Err(CheckError::EmptyName { kind, index });
    }
    let invalid = |reason: &str| CheckError::InvalidValueInfo {
        name: info.name.clone(),
        reason: reason.to_string(),
    };

    let Some(type_proto::Value::TensorType(tensor)) =
        info.r#type.as_ref().and_then(|t| t.value.as_ref())
    else {
        return Err(invalid("missing tensor type"));
    };
    let dtype = DType::from_onnx_code(tensor.elem_type)
        .ok_or_else(|| invalid(&format!("unsupported element type {}", tensor.elem_type)))?;
    let shape = tensor.shape.as_ref().ok_or_else(|| invalid("missing shape"))?;

    let dims = shape
        .dim
        .iter()
        .map(|d| match &d.value {
            Some(dimension::Value::DimValue(v)) if *v > 0 => Ok(Some(*v as usize)),
            Some(dimension::Value::DimValue(v)) => {
                Err(invalid(&format!("dimension {v} is not positive")))
            }
            Some(dimension::Value::DimParam(p)) if !p.is_empty() => Ok(None),
            _ => Err(invalid("dimension has neither value nor parameter")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ValueType { dtype, dims })
}

fn initializer_type(index: usize, init: &TensorProto) -> Result<ValueType, CheckError> {
    if init.name.is_empty() {
        return Err(CheckError::EmptyName {
            kind: "initializer",
            index,
        });
    }
    let invalid = |reason: String| CheckError::InvalidInitializer {
        name: init.name.clone(),
        reason,
    };

    let dtype = DType::from_onnx_code(init.data_type)
        .ok_or_else(|| invalid(format!("unsupported element type {}", init.data_type)))?;
    let dims = init
        .dims
        .iter()
        .map(|d| usize::try_from(*d).map_err(|_| invalid(format!("dimension {d} is negative"))))
        .collect::<Result<Vec<_>, _>>()?;

    let allowed = payload_fields(dtype);
    if let Some(field) = init
        .populated_fields()
        .into_iter()
        .find(|field| !allowed.contains(field))
    {
        return Err(invalid(format!("{field} cannot hold {dtype:?} data")));
    }

    let expected = dims
        .iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(*d))
        .ok_or_else(|| invalid("element count overflows".to_string()))?;
    let actual = init
        .payload_len(dtype.byte_size())
        .ok_or_else(|| invalid("payload is split across fields or not whole elements".to_string()))?;
    if expected != actual {
        return Err(CheckError::InitializerLength {
            name: init.name.clone(),
            dims: init.dims.clone(),
            expected,
            actual,
        });
    }

    Ok(ValueType {
        dtype,
        dims: dims.into_iter().map(Some).collect(),
    })
}

/// Payload fields ONNX readers accept for each element type.
fn payload_fields(dtype: DType) -> &'static [&'static str] {
    match dtype {
        DType::F32 => &["float_data", "raw_data"],
        DType::I64 => &["int64_data", "raw_data"],
        DType::I32 | DType::U8 | DType::F16 => &["int32_data", "raw_data"],
    }
}

/// Unknown dimensions on either side are accepted.
fn compatible(declared: &ValueType, inferred: &ValueType) -> bool {
    declared.dtype == inferred.dtype
        && declared.dims.len() == inferred.dims.len()
        && declared
            .dims
            .iter()
            .zip(&inferred.dims)
            .all(|pair| match pair {
                (Some(a), Some(b)) => a == b,
                _ => true,
            })
}

fn describe(ty: &ValueType) -> String {
    let dims = ty
        .dims
        .iter()
        .map(|d| d.map_or_else(|| "?".to_string(), |v| v.to_string()))
        .collect::<Vec<_>>()
        .join(",");
    format!("{:?}[{dims}]", ty.dtype)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::lower_model;
    use crate::fixture::minimal_intent;
    use intentum_proto::{AttributeProto, OperatorSetIdProto};
    use rstest::rstest;

    fn model() -> ModelProto {
        lower_model(&minimal_intent())
    }

    fn graph(model: &mut ModelProto) -> &mut GraphProto {
        model.graph.as_mut().expect("lowered model has a graph")
    }

    #[test]
    fn minimal_intent_passes() {
        check_model(&model()).unwrap();
    }

    #[test]
    fn short_weights_report_expected_and_actual_len() {
        let mut m = model();
        graph(&mut m).initializer[0].float_data.pop();

        let err = check_model(&m).unwrap_err();
        assert!(
            matches!(
                err,
                CheckError::InitializerLength {
                    expected: 6,
                    actual: 5,
                    ..
                }
            ),
            "{err}"
        );
    }

    #[rstest]
    #[case::no_ir_version(|m: &mut ModelProto| m.ir_version = 0, "ir_version is not set")]
    #[case::ir_too_old_for_opset(|m: &mut ModelProto| m.ir_version = 6, "ir_version 6 is not supported")]
    #[case::no_opsets(|m: &mut ModelProto| m.opset_import.clear(), "no opset imports")]
    #[case::duplicate_opset(
        |m: &mut ModelProto| m.opset_import.push(OperatorSetIdProto { domain: String::new(), version: 13 }),
        "imported more than once"
    )]
    #[case::opset_too_new(|m: &mut ModelProto| m.opset_import[0].version = 99, "opset version 99")]
    #[case::no_graph(|m: &mut ModelProto| m.graph = None, "no graph")]
    #[case::unnamed_graph(|m: &mut ModelProto| graph(m).name.clear(), "graph name is empty")]
    #[case::no_nodes(|m: &mut ModelProto| graph(m).node.clear(), "graph has no nodes")]
    #[case::dangling_input(
        |m: &mut ModelProto| graph(m).node[0].input[1] = "missing".to_string(),
        "reads 'missing' before it is defined"
    )]
    #[case::unknown_op(|m: &mut ModelProto| graph(m).node[0].op_type = "Gemm".to_string(), "'Gemm' is not known")]
    #[case::foreign_domain(
        |m: &mut ModelProto| graph(m).node[0].domain = "com.example".to_string(),
        "not known in domain 'com.example'"
    )]
    #[case::missing_operand(|m: &mut ModelProto| { graph(m).node[0].input.pop(); }, "expects 2 inputs, got 1")]
    #[case::attribute(
        |m: &mut ModelProto| graph(m).node[0].attribute.push(AttributeProto { name: "alpha".to_string(), ..Default::default() }),
        "unexpected attribute 'alpha'"
    )]
    #[case::inner_dim_mismatch(
        |m: &mut ModelProto| graph(m).initializer[0].dims = vec![3, 2],
        "inner dimensions differ"
    )]
    #[case::wrong_output_shape(
        |m: &mut ModelProto| {
            if let Some(type_proto::Value::TensorType(t)) =
                graph(m).output[0].r#type.as_mut().and_then(|t| t.value.as_mut())
            {
                t.shape.as_mut().expect("shape").dim[1].value = Some(dimension::Value::DimValue(4));
            }
        },
        "declared as F32[1,4] but inferred as F32[1,3]"
    )]
    #[case::wrong_output_type(
        |m: &mut ModelProto| {
            if let Some(type_proto::Value::TensorType(t)) =
                graph(m).output[0].r#type.as_mut().and_then(|t| t.value.as_mut())
            {
                t.elem_type = 7;
            }
        },
        "declared as I64[1,3]"
    )]
    #[case::unproduced_output(|m: &mut ModelProto| graph(m).output[0].name = "logits".to_string(), "'logits' is never produced")]
    #[case::duplicate_definition(
        |m: &mut ModelProto| graph(m).node[0].output[0] = "input".to_string(),
        "'input' is defined more than once"
    )]
    #[case::zero_dim(
        |m: &mut ModelProto| {
            if let Some(type_proto::Value::TensorType(t)) =
                graph(m).input[0].r#type.as_mut().and_then(|t| t.value.as_mut())
            {
                t.shape.as_mut().expect("shape").dim[0].value = Some(dimension::Value::DimValue(0));
            }
        },
        "dimension 0 is not positive"
    )]
    #[case::negative_initializer_dim(|m: &mut ModelProto| graph(m).initializer[0].dims = vec![-2, 3], "dimension -2 is negative")]
    #[case::float_weights_in_int64_field(
        |m: &mut ModelProto| {
            let w = &mut graph(m).initializer[0];
            w.int64_data = w.float_data.drain(..).map(|v| v as i64).collect();
        },
        "int64_data cannot hold F32 data"
    )]
    #[case::float_weights_in_double_field(
        |m: &mut ModelProto| {
            let w = &mut graph(m).initializer[0];
            w.double_data = w.float_data.drain(..).map(f64::from).collect();
        },
        "double_data cannot hold F32 data"
    )]
    #[case::element_count_overflows(
        |m: &mut ModelProto| graph(m).initializer[0].dims = vec![i64::MAX, 4],
        "element count overflows"
    )]
    #[case::opset_18_needs_ir_8(
        |m: &mut ModelProto| { m.ir_version = 7; m.opset_import[0].version = 18; },
        "ir_version 7 is not supported (expected 8..=10)"
    )]
    #[case::opset_20_needs_ir_9(
        |m: &mut ModelProto| { m.ir_version = 8; m.opset_import[0].version = 20; },
        "ir_version 8 is not supported (expected 9..=10)"
    )]
    #[case::opset_21_needs_ir_10(
        |m: &mut ModelProto| { m.ir_version = 9; m.opset_import[0].version = 21; },
        "ir_version 9 is not supported (expected 10..=10)"
    )]
    #[case::unknown_element_type(|m: &mut ModelProto| graph(m).initializer[0].data_type = 0, "unsupported element type 0")]
    fn rejects(#[case] mutate: fn(&mut ModelProto), #[case] message: &str) {
        let mut m = model();
        mutate(&mut m);

        let err = check_model(&m).unwrap_err().to_string();
        assert!(err.contains(message), "`{err}` does not mention `{message}`");
    }

    #[rstest]
    #[case(12, 7)]
    #[case(14, 7)]
    #[case(15, 8)]
    #[case(18, 8)]
    #[case(19, 9)]
    #[case(21, 10)]
    fn oldest_ir_for_opset_is_accepted(#[case] opset: i64, #[case] ir_version: i64) {
        let mut m = model();
        m.ir_version = ir_version;
        m.opset_import[0].version = opset;
        check_model(&m).unwrap();
    }

    #[test]
    fn raw_weights_are_accepted() {
        let mut m = model();
        let w = &mut graph(&mut m).initializer[0];
        let raw: Vec<u8> = w.float_data.drain(..).flat_map(f32::to_le_bytes).collect();
        w.raw_data = raw.into();
        check_model(&m).unwrap();
    }

    #[test]
    fn symbolic_batch_dim_is_accepted() {
        let mut m = model();
        if let Some(type_proto::Value::TensorType(t)) = graph(&mut m).input[0]
            .r#type
            .as_mut()
            .and_then(|t| t.value.as_mut())
        {
            t.shape.as_mut().expect("shape").dim[0].value =
                Some(dimension::Value::DimParam("batch".to_string()));
        }
        check_model(&m).unwrap();
    }

    #[test]
    fn initializer_may_default_a_graph_input() {
        let mut m = model();
        let g = graph(&mut m);
        let w_input = crate::builder::tensor_value_info(&intentum_core::TensorSpec::fixed(
            "W",
            DType::F32,
            &intentum_core::Shape::from_slice(&[2, 3]),
        ));
        g.input.push(w_input);
        check_model(&m).unwrap();
    }
}
