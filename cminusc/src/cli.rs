//! Implements the command line behavior.

use codespan_reporting::{
    diagnostic::{Diagnostic, Label, LabelStyle, Severity},
    files::SimpleFiles,
    term::{
        self,
        termcolor::{ColorChoice, StandardStream},
    },
};
use std::{
    fs::{metadata, read_dir, File},
    io::{self, Write},
    ops::Range,
    path::{Path, PathBuf},
};

use cminus_analyzer::stages::{analyze, parse_and_analyze};
use cminus_codegen::{generate, CodegenError};
use cminus_dsl::diagnostic::Label as SourceLabel;
use cminus_parser::{parse_program, tokenize_program};
use cminus_problems::Problem;
use log::{debug, info};

use crate::source::Source;

/// The file extension of C-minus sources when checking a directory.
const SOURCE_EXTENSION: &str = "cm";

/// Compiles the file to assembly.
///
/// Writes the assembly to `output` when given, otherwise to standard
/// output. Nothing is written when any stage reports a problem.
pub fn compile(path: &Path, output: Option<&Path>, suppress_output: bool) -> Result<(), String> {
    let source = read_source(path, suppress_output)?;

    let program = parse_and_analyze(source.as_str(), source.file_id())
        .map_err(|diagnostic| handle_diagnostic(diagnostic, &source, suppress_output))?;

    let result = match output {
        Some(output) => File::create(output)
            .map_err(CodegenError::from)
            .and_then(|mut file| generate(&program, &mut file)),
        None => generate(&program, &mut io::stdout().lock()),
    };

    match result {
        Ok(()) => {
            info!("Compiled {}", source.name());
            Ok(())
        }
        Err(CodegenError::Io(err)) => {
            let target = output
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| String::from("standard output"));
            let diagnostic = cminus_dsl::diagnostic::Diagnostic::problem(
                Problem::CannotWriteFile,
                SourceLabel::file(source.file_id(), err.to_string()),
            )
            .with_context("path", &target);
            Err(handle_diagnostic(diagnostic, &source, suppress_output))
        }
        Err(err) => Err(err.to_string()),
    }
}

/// Checks the files for problems without generating code.
///
/// A directory checks each C-minus source directly inside it. Stops at the
/// first file with a problem.
pub fn check(paths: Vec<PathBuf>, suppress_output: bool) -> Result<(), String> {
    let mut files: Vec<PathBuf> = vec![];
    for path in paths {
        files.append(&mut enumerate_files(path)?);
    }

    for filename in files {
        let source = read_source(&filename, suppress_output)?;

        parse_program(source.as_str(), source.file_id())
            .and_then(analyze)
            .map_err(|diagnostic| handle_diagnostic(diagnostic, &source, suppress_output))?;

        debug!("Checked {}", source.name());
    }

    Ok(())
}

/// Prints the tokens of the file, one per line, through the end of file.
pub fn tokenize(path: &Path, suppress_output: bool) -> Result<(), String> {
    let source = read_source(path, suppress_output)?;

    let tokens = tokenize_program(source.as_str(), source.file_id())
        .map_err(|diagnostic| handle_diagnostic(diagnostic, &source, suppress_output))?;

    let mut out = io::stdout().lock();
    for token in tokens {
        writeln!(out, "{token}").map_err(|e| format!("Failed writing tokens. {e}"))?;
    }
    Ok(())
}

fn read_source(path: &Path, suppress_output: bool) -> Result<Source, String> {
    Source::try_from_path(path).map_err(|diagnostic| {
        let name = path.display().to_string();
        render(diagnostic, name, String::new(), suppress_output)
    })
}

fn enumerate_files(path: PathBuf) -> Result<Vec<PathBuf>, String> {
    let metadata = metadata(path.as_path())
        .map_err(|e| format!("Unable to read {}. {}", path.display(), e))?;
    if metadata.is_dir() {
        let entries = read_dir(&path).map_err(|e| e.to_string())?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == SOURCE_EXTENSION))
            .collect();
        paths.sort();
        return Ok(paths);
    }
    Ok(vec![path])
}

/// Renders the diagnostic against the source and returns the error for
/// the process.
fn handle_diagnostic(
    diagnostic: cminus_dsl::diagnostic::Diagnostic,
    source: &Source,
    suppress_output: bool,
) -> String {
    render(
        diagnostic,
        source.name(),
        source.as_str().to_string(),
        suppress_output,
    )
}

fn render(
    diagnostic: cminus_dsl::diagnostic::Diagnostic,
    name: String,
    contents: String,
    suppress_output: bool,
) -> String {
    let summary = diagnostic.to_string();

    if !suppress_output {
        let mut files = SimpleFiles::new();
        let file_id = files.add(name, contents);

        let writer = StandardStream::stderr(ColorChoice::Auto);
        let config = term::Config::default();
        let diagnostic = map_diagnostic(diagnostic, file_id);

        if let Err(e) = term::emit(&mut writer.lock(), &config, &files, &diagnostic) {
            return format!("{summary} (failed writing to terminal: {e})");
        };
    }

    summary
}

fn map_label(label: SourceLabel, style: LabelStyle, file_id: usize) -> Label<usize> {
    let range = Range {
        start: label.span.start,
        end: label.span.end,
    };
    Label::new(style, file_id, range).with_message(label.message)
}

fn map_diagnostic(diagnostic: cminus_dsl::diagnostic::Diagnostic, file_id: usize) -> Diagnostic<usize> {
    let code = diagnostic.code();
    let description = diagnostic.description();

    // Set the primary labels
    let mut labels = vec![map_label(diagnostic.primary, LabelStyle::Primary, file_id)];

    // Add any secondary labels
    labels.extend(
        diagnostic
            .secondary
            .into_iter()
            .map(|lbl| map_label(lbl, LabelStyle::Secondary, file_id)),
    );

    Diagnostic::new(Severity::Error)
        .with_code(code)
        .with_message(description)
        .with_labels(labels)
}
