mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use intentum_fixture::{default_output_path, generate_fixture, FixtureError};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    std::env::set_var("RUST_LOG", &cli.log);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(path) => {
            // stdout carries only the path
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            let code = err
                .downcast_ref::<FixtureError>()
                .map_or(1, FixtureError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<PathBuf> {
    let out = cli.out.unwrap_or_else(default_output_path);
    tracing::debug!(out = %out.display(), "generating fixture");
    generate_fixture(&out).with_context(|| format!("could not generate {}", out.display()))
}
