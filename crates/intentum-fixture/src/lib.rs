pub mod builder;
pub mod checker;
pub mod error;
pub mod fixture;
pub mod ops;

pub use error::{CheckError, FixtureError};
pub use fixture::{default_output_path, generate_fixture, minimal_intent, write_model};
