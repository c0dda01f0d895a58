//! Shared test helpers for codegen integration tests.

use std::fs;
use std::process::Command;

use cminus_analyzer::stages::parse_and_analyze;
use cminus_codegen::generate;
use cminus_dsl::core::FileId;

/// Parses, analyzes and generates assembly for the source.
#[allow(dead_code)]
pub fn compile(source: &str) -> String {
    let program = parse_and_analyze(source, &FileId::default()).unwrap();
    let mut asm = vec![];
    generate(&program, &mut asm).unwrap();
    String::from_utf8(asm).unwrap()
}

/// Returns true if this host can assemble, link and run the generated
/// code with the system C compiler.
#[allow(dead_code)]
pub fn can_run_native() -> bool {
    if !cfg!(all(target_os = "linux", target_arch = "x86_64")) {
        return false;
    }
    Command::new("cc")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Compiles the source to an executable, runs it and returns what it
/// printed.
#[allow(dead_code)]
pub fn compile_and_run(source: &str) -> String {
    let dir = tempfile::tempdir().unwrap();
    let asm_path = dir.path().join("program.s");
    let exe_path = dir.path().join("program");
    fs::write(&asm_path, compile(source)).unwrap();

    let assembled = Command::new("cc")
        .arg("-o")
        .arg(&exe_path)
        .arg(&asm_path)
        .output()
        .unwrap();
    assert!(
        assembled.status.success(),
        "cc failed: {}",
        String::from_utf8_lossy(&assembled.stderr)
    );

    let run = Command::new(&exe_path).output().unwrap();
    String::from_utf8(run.stdout).unwrap()
}
