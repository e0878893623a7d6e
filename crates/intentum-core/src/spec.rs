use std::fmt;

use crate::{DType, Shape};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IOName(pub String);

impl IOName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IOName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name, element type and shape of a graph input or output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorSpec {
    pub name: IOName,
    pub dtype: DType,
    pub dims: Vec<Option<usize>>, // None = dynamic
}

impl TensorSpec {
    /// Spec with every dimension fixed.
    pub fn fixed(name: impl Into<String>, dtype: DType, shape: &Shape) -> Self {
        Self {
            name: IOName::new(name),
            dtype,
            dims: shape.0.iter().map(|d| Some(*d)).collect(),
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the concrete shape when no dimension is dynamic.
    pub fn static_shape(&self) -> Option<Shape> {
        self.dims
            .iter()
            .copied()
            .collect::<Option<Vec<_>>>()
            .map(|dims| Shape::from_slice(&dims))
    }
}
