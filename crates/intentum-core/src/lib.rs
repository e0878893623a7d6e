pub mod graph;
pub mod spec;
pub mod tensor;

pub use graph::*;
pub use spec::*;
pub use tensor::*;
