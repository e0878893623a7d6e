use intentum_core::{DType, DEFAULT_DOMAIN};

/// Inferred element type and dimensions (`None` = unknown) of a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueType {
    pub dtype: DType,
    pub dims: Vec<Option<usize>>,
}

type InferFn = fn(&[&ValueType]) -> Result<ValueType, String>;

pub struct OpSchema {
    pub op_type: &'static str,
    pub domain: &'static str,
    pub since_version: i64,
    pub inputs: usize,
    pub outputs: usize,
    pub types: &'static [DType],
    infer: InferFn,
}

impl OpSchema {
    /// Checks the input element types and computes the single output type.
    pub fn infer(&self, inputs: &[&ValueType]) -> Result<ValueType, String> {
        let Some(first) = inputs.first() else {
            return Err("no inputs".to_string());
        };
        if let Some(other) = inputs.iter().find(|v| v.dtype != first.dtype) {
            return Err(format!(
                "inputs mix element types {:?} and {:?}",
                first.dtype, other.dtype
            ));
        }
        if !self.types.contains(&first.dtype) {
            return Err(format!("element type {:?} is not supported", first.dtype));
        }
        (self.infer)(inputs)
    }
}

const NUMERIC: &[DType] = &[DType::F32, DType::F16, DType::I32, DType::I64];
const ALL: &[DType] = &[DType::F32, DType::F16, DType::I32, DType::I64, DType::U8];

static SCHEMAS: &[OpSchema] = &[
    OpSchema {
        op_type: "MatMul",
        domain: DEFAULT_DOMAIN,
        since_version: 1,
        inputs: 2,
        outputs: 1,
        types: NUMERIC,
        infer: infer_matmul,
    },
    OpSchema {
        op_type: "Add",
        domain: DEFAULT_DOMAIN,
        since_version: 1,
        inputs: 2,
        outputs: 1,
        types: NUMERIC,
        infer: infer_broadcast,
    },
    OpSchema {
        op_type: "Relu",
        domain: DEFAULT_DOMAIN,
        since_version: 1,
        inputs: 1,
        outputs: 1,
        types: NUMERIC,
        infer: infer_same,
    },
    OpSchema {
        op_type: "Identity",
        domain: DEFAULT_DOMAIN,
        since_version: 1,
        inputs: 1,
        outputs: 1,
        types: ALL,
        infer: infer_same,
    },
];

pub fn lookup(domain: &str, op_type: &str) -> Option<&'static OpSchema> {
    SCHEMAS
        .iter()
        .find(|s| s.domain == domain && s.op_type == op_type)
}

fn infer_same(inputs: &[&ValueType]) -> Result<ValueType, String> {
    match inputs {
        [x] => Ok((*x).clone()),
        _ => Err(format!("expected 1 input, got {}", inputs.len())),
    }
}

fn infer_broadcast(inputs: &[&ValueType]) -> Result<ValueType, String> {
    let [a, b] = inputs else {
        return Err(format!("expected 2 inputs, got {}", inputs.len()));
    };
    Ok(ValueType {
        dtype: a.dtype,
        dims: broadcast(&a.dims, &b.dims)?,
    })
}

/// Numpy `matmul` shape rule: rank-1 operands are promoted and the promoted
/// axis dropped from the result; leading dims broadcast.
fn infer_matmul(inputs: &[&ValueType]) -> Result<ValueType, String> {
    let [a, b] = inputs else {
        return Err(format!("expected 2 inputs, got {}", inputs.len()));
    };
    if a.dims.is_empty() || b.dims.is_empty() {
        return Err("operands must have rank >= 1".to_string());
    }

    let a_vec = a.dims.len() == 1;
    let b_vec = b.dims.len() == 1;
    let a_dims = if a_vec {
        vec![Some(1), a.dims[0]]
    } else {
        a.dims.clone()
    };
    let b_dims = if b_vec {
        vec![b.dims[0], Some(1)]
    } else {
        b.dims.clone()
    };

    let (a_batch, a_mat) = a_dims.split_at(a_dims.len() - 2);
    let (b_batch, b_mat) = b_dims.split_at(b_dims.len() - 2);
    let (m, k_a) = (a_mat[0], a_mat[1]);
    let (k_b, n) = (b_mat[0], b_mat[1]);

    if let (Some(k_a), Some(k_b)) = (k_a, k_b) {
        if k_a != k_b {
            return Err(format!(
                "inner dimensions differ: {} (left) vs {} (right)",
                k_a, k_b
            ));
        }
    }

    let mut dims = broadcast(a_batch, b_batch)?;
    if !a_vec {
        dims.push(m);
    }
    if !b_vec {
        dims.push(n);
    }

    Ok(ValueType {
        dtype: a.dtype,
        dims,
    })
}

fn broadcast(a: &[Option<usize>], b: &[Option<usize>]) -> Result<Vec<Option<usize>>, String> {
    let rank = a.len().max(b.len());
    let pad = |dims: &[Option<usize>], i: usize| -> Option<usize> {
        let offset = rank - dims.len();
        if i < offset {
            Some(1)
        } else {
            dims[i - offset]
        }
    };

    (0..rank)
        .map(|i| match (pad(a, i), pad(b, i)) {
            (Some(1), other) | (other, Some(1)) => Ok(other),
            (Some(x), Some(y)) if x == y => Ok(Some(x)),
            (Some(x), Some(y)) => Err(format!("dimensions {x} and {y} do not broadcast")),
            (None, known) | (known, None) => Ok(known),
        })
        .collect()
}
