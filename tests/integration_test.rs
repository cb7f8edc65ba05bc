use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::Result;
use tempfile::Builder;

fn run_import(args: &[&str]) -> Result<Output> {
    let binary_path = env!("CARGO_BIN_EXE_cartera-import");

    let output = Command::new(binary_path)
        .env_remove("DATABASE_URL")
        .env_remove("CARTERA_TABLE")
        .env_remove("CARTERA_BATCH_SIZE")
        .arg("import")
        .args(args)
        .output()?;

    Ok(output)
}

fn summary_value(stdout: &str, key: &str) -> Option<String> {
    stdout.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(&format!("{key}:")))
        .map(|value| value.trim().to_string())
}

#[test]
fn test_cli_imports_semicolon_sample() -> Result<()> {
    let sample_path = Path::new("samples").join("cartera.csv");
    let output = run_import(&[sample_path.to_str().unwrap_or_default()])?;

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;

    assert!(stdout.contains("Import completed"));
    assert_eq!(summary_value(&stdout, "read").as_deref(), Some("4"));
    assert_eq!(summary_value(&stdout, "inserted").as_deref(), Some("3"));
    assert_eq!(summary_value(&stdout, "deleted").as_deref(), Some("0"));
    assert_eq!(summary_value(&stdout, "sequence reset").as_deref(), Some("true"));

    Ok(())
}

#[test]
fn test_cli_imports_comma_sample_with_explicit_delimiter() -> Result<()> {
    let sample_path = Path::new("samples").join("cartera_comma.csv");
    let output = run_import(&[sample_path.to_str().unwrap_or_default(), ","])?;

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(summary_value(&stdout, "inserted").as_deref(), Some("2"));
    assert_eq!(summary_value(&stdout, "batches").as_deref(), Some("1"));

    Ok(())
}

#[test]
fn test_cli_honours_batch_size() -> Result<()> {
    let sample_path = Path::new("samples").join("cartera.csv");
    let output = run_import(&[sample_path.to_str().unwrap_or_default(), "--batch-size", "2"])?;

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(summary_value(&stdout, "batches").as_deref(), Some("2"));

    Ok(())
}

#[test]
fn test_cli_rejects_batch_size_beyond_insert_limit() -> Result<()> {
    let sample_path = Path::new("samples").join("cartera.csv");

    let output = run_import(&[sample_path.to_str().unwrap_or_default(), "--batch-size", "4096"])?;
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr)?.contains("at most 4095"));

    let output = run_import(&[sample_path.to_str().unwrap_or_default(), "--batch-size", "4095"])?;
    assert!(output.status.success());

    Ok(())
}

#[test]
fn test_cli_fails_on_wrong_delimiter() -> Result<()> {
    let sample_path = Path::new("samples").join("cartera.csv");
    let output = run_import(&[sample_path.to_str().unwrap_or_default(), "|"])?;

    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr)?;

    assert!(stderr.contains("DocEntry"));

    Ok(())
}

#[test]
fn test_cli_fails_when_no_row_names_a_customer() -> Result<()> {
    let mut file = Builder::new().suffix(".csv").tempfile()?;
    writeln!(file, "DocEntry;CardCode;CardName;DocNum")?;
    writeln!(file, "1;;;5001")?;

    let output = run_import(&[file.path().to_str().unwrap_or_default()])?;

    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr)?.contains("No valid rows"));

    Ok(())
}

#[test]
fn test_cli_fails_on_missing_file() -> Result<()> {
    let output = run_import(&["samples/does_not_exist.csv"])?;

    assert!(!output.status.success());

    Ok(())
}

#[test]
fn test_cli_rejects_non_csv_extension() -> Result<()> {
    let mut file = Builder::new().suffix(".txt").tempfile()?;
    writeln!(file, "DocEntry;CardCode;CardName;DocNum")?;
    writeln!(file, "1;C001;Acme;5001")?;

    let output = run_import(&[file.path().to_str().unwrap_or_default()])?;

    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr)?.contains(".csv"));

    Ok(())
}
