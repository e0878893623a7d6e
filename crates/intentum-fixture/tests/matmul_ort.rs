use anyhow::{ensure, Context, Result};
use intentum_fixture::fixture::{FILE_NAME, INPUT_NAME, OUTPUT_NAME};
use intentum_fixture::generate_fixture;
use ort::session::{Session, SessionInputValue};

/// Runs the written fixture through ONNX Runtime.
fn run_fixture(input: [f32; 2]) -> Result<Vec<f32>> {
    let dir = tempfile::tempdir()?;
    let path = generate_fixture(dir.path().join(FILE_NAME))?;

    let mut session = Session::builder()
        .context("failed to create ORT session builder")?
        .commit_from_file(&path)
        .context("failed to load ONNX model")?;

    ensure!(session.inputs.len() == 1, "expected one model input");
    ensure!(session.inputs[0].name == INPUT_NAME, "unexpected input name");

    let value = ort::value::Tensor::from_array((vec![1usize, 2], input.to_vec()))?.into_dyn();
    let outputs = session.run(vec![(
        INPUT_NAME.to_string(),
        SessionInputValue::from(value),
    )])?;

    let (name, value) = outputs.iter().next().context("missing model output")?;
    ensure!(name == OUTPUT_NAME, "unexpected output name {name}");
    let array = value.try_extract_array::<f32>()?;
    ensure!(array.shape() == [1, 3], "unexpected output shape {:?}", array.shape());
    Ok(array.iter().copied().collect())
}

#[test]
fn features_land_in_the_first_two_columns() -> Result<()> {
    assert_eq!(run_fixture([2.0, 5.0])?, vec![2.0, 5.0, 0.0]);
    Ok(())
}

#[test]
fn third_column_is_always_zero() -> Result<()> {
    assert_eq!(run_fixture([-1.5, 0.25])?, vec![-1.5, 0.25, 0.0]);
    Ok(())
}
