use bytes::Bytes;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DType {
    F32,
    F16,
    I64,
    I32,
    U8,
}

impl DType {
    /// `TensorProto.DataType` code used by the ONNX schema.
    pub fn onnx_code(self) -> i32 {
        match self {
            DType::F32 => 1,
            DType::U8 => 2,
            DType::I32 => 6,
            DType::I64 => 7,
            DType::F16 => 10,
        }
    }

    pub fn from_onnx_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(DType::F32),
            2 => Some(DType::U8),
            6 => Some(DType::I32),
            7 => Some(DType::I64),
            10 => Some(DType::F16),
            _ => None,
        }
    }

    pub fn byte_size(self) -> usize {
        match self {
            DType::F32 | DType::I32 => 4,
            DType::F16 => 2,
            DType::I64 => 8,
            DType::U8 => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }
    pub fn rank(&self) -> usize {
        self.0.len()
    }
    pub fn numel(&self) -> usize {
        self.0.iter().product::<usize>()
    }
}

/// Constant tensor embedded in the graph. The payload is little-endian and
/// is not required to match `shape`; the checker rejects a mismatch.
#[derive(Clone, Debug, PartialEq)]
pub struct Initializer {
    pub name: crate::IOName,
    pub dtype: DType,
    pub shape: Shape,
    pub bytes: Bytes,
}

impl Initializer {
    pub fn from_le_bytes(
        name: impl Into<String>,
        dtype: DType,
        shape: Shape,
        bytes: Bytes,
    ) -> Self {
        Self {
            name: crate::IOName::new(name),
            dtype,
            shape,
            bytes,
        }
    }

    pub fn from_f32(name: impl Into<String>, shape: Shape, data: &[f32]) -> Self {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::from_le_bytes(name, DType::F32, shape, Bytes::from(bytes))
    }

    /// Number of whole elements held by the payload.
    pub fn payload_len(&self) -> usize {
        self.bytes.len() / self.dtype.byte_size()
    }

    pub fn to_f32(&self) -> Option<Vec<f32>> {
        if self.dtype != DType::F32 {
            return None;
        }
        Some(
            self.bytes
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        )
    }

    pub fn to_i64(&self) -> Option<Vec<i64>> {
        if self.dtype != DType::I64 {
            return None;
        }
        Some(
            self.bytes
                .chunks_exact(8)
                .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
                .collect(),
        )
    }

    /// I32 and U8 payloads widened to `i32`, the way ONNX stores them.
    pub fn to_i32_widened(&self) -> Option<Vec<i32>> {
        match self.dtype {
            DType::I32 => Some(
                self.bytes
                    .chunks_exact(4)
                    .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect(),
            ),
            DType::U8 => Some(self.bytes.iter().map(|b| i32::from(*b)).collect()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onnx_codes_round_trip() {
        for dtype in [DType::F32, DType::F16, DType::I64, DType::I32, DType::U8] {
            assert_eq!(DType::from_onnx_code(dtype.onnx_code()), Some(dtype));
        }
        assert_eq!(DType::from_onnx_code(0), None);
        assert_eq!(DType::from_onnx_code(8), None);
    }

    #[test]
    fn f32_initializer_keeps_row_major_order() {
        let w = Initializer::from_f32(
            "W",
            Shape::from_slice(&[2, 3]),
            &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        );
        assert_eq!(w.payload_len(), 6);
        assert_eq!(w.shape.numel(), 6);
        assert_eq!(w.to_f32(), Some(vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]));
        assert_eq!(w.to_i64(), None);
    }

    #[test]
    fn scalar_shape_has_one_element() {
        assert_eq!(Shape::from_slice(&[]).numel(), 1);
        assert_eq!(Shape::from_slice(&[0, 3]).numel(), 0);
    }
}
