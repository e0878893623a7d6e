use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "intentum-fixture",
    version,
    about = "Writes the minimal_intent ONNX test fixture"
)]
pub struct Cli {
    /// Output file (defaults to tests/fixtures/minimal_intent.onnx in this crate)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Log level (RUST_LOG)
    #[arg(long, default_value = "warn")]
    pub log: String,
}
