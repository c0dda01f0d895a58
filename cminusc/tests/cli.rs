use assert_cmd::cargo;
use assert_cmd::prelude::*;
use cminus_test::shared_resource_path;
use predicates::prelude::*;
use std::{fs, process::Command};
use tempfile::tempdir;

#[test]
fn check_when_not_a_file_then_err() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo::cargo_bin!());

    cmd.arg("check").arg("test/file/doesnt/exist.cm");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error"));

    Ok(())
}

#[test]
fn check_when_trace_log_and_valid_file_then_ok() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo::cargo_bin!());

    cmd.arg("-vvvv")
        .arg("check")
        .arg(shared_resource_path("scopes.cm"));
    cmd.assert().success().stdout(predicate::str::is_empty());

    Ok(())
}

#[test]
fn check_when_too_verbose_then_err() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo::cargo_bin!());

    cmd.arg("-vvvvv")
        .arg("check")
        .arg(shared_resource_path("scopes.cm"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Verbosity"));

    Ok(())
}

#[test]
fn check_when_valid_file_then_ok() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo::cargo_bin!());

    cmd.arg("check").arg(shared_resource_path("pointers.cm"));
    cmd.assert().success().stdout(predicate::str::is_empty());

    Ok(())
}

#[test]
fn check_when_latin1_encoded_then_ok() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("latin1.cm");
    fs::write(&path, b"/* \xa9 caf\xe9 */\nvoid main(void) { write(1); }\n")?;

    let mut cmd = Command::new(cargo::cargo_bin!());
    cmd.arg("check").arg(&path);
    cmd.assert().success();

    Ok(())
}

#[test]
fn check_when_binary_file_then_err() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("binary.cm");
    fs::write(&path, [0x00u8, 0xff, 0xfe, 0x01])?;

    let mut cmd = Command::new(cargo::cargo_bin!());
    cmd.arg("check").arg(&path);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("P0001"));

    Ok(())
}

#[test]
fn check_when_undeclared_variable_then_err() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo::cargo_bin!());

    cmd.arg("check").arg(shared_resource_path("undeclared.cm"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Undeclared variable"))
        .stderr(predicate::str::contains("undeclared variable `x`"));

    Ok(())
}

#[test]
fn compile_when_valid_file_then_assembly_on_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo::cargo_bin!());

    cmd.arg("compile").arg(shared_resource_path("arithmetic.cm"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(".globl main"))
        .stdout(predicate::str::contains(".fmt_int:"));

    Ok(())
}

#[test]
fn compile_when_output_then_writes_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let output = dir.path().join("control.s");

    let mut cmd = Command::new(cargo::cargo_bin!());
    cmd.arg("compile")
        .arg(shared_resource_path("control.cm"))
        .arg("-o")
        .arg(&output);
    cmd.assert().success().stdout(predicate::str::is_empty());

    let assembly = fs::read_to_string(output)?;
    assert!(assembly.contains("fact:"));

    Ok(())
}

#[test]
fn compile_when_type_error_then_err_and_no_assembly() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo::cargo_bin!());

    cmd.arg("compile").arg(shared_resource_path("type_error.cm"));
    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("P0303"));

    Ok(())
}

#[test]
fn tokenize_when_valid_file_then_one_token_per_line() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo::cargo_bin!());

    cmd.arg("tokenize").arg(shared_resource_path("arithmetic.cm"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2 Void \"void\"\n"))
        .stdout(predicate::str::contains("3 Star \"*\"\n"))
        .stdout(predicate::str::contains("Eof"));

    Ok(())
}
