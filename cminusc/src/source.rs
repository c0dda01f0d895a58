//! Reads source files from disk.
//!
//! Files are accepted as UTF-8 or, failing that, Windows-1252 (a superset
//! of latin1).

use std::path::{Path, PathBuf};

use cminus_dsl::{
    core::FileId,
    diagnostic::{Diagnostic, Label},
};
use cminus_problems::Problem;
use log::{debug, trace};

/// The decoded contents of a source file.
#[derive(Debug)]
pub struct Source {
    path: PathBuf,
    file_id: FileId,
    data: String,
}

impl Source {
    /// Reads and decodes the file at the path.
    pub fn try_from_path(path: &Path) -> Result<Source, Diagnostic> {
        let data = read(path)?;
        Ok(Source {
            path: path.to_path_buf(),
            file_id: FileId::from_path(path),
            data,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    /// The name used when showing diagnostics for this file.
    pub fn name(&self) -> String {
        self.path.display().to_string()
    }
}

fn read(path: &Path) -> Result<String, Diagnostic> {
    debug!("Reading file {}", path.display());

    let bytes = std::fs::read(path)
        .map_err(|e| diagnostic(Problem::CannotReadFile, path, e.to_string()))?;

    let decoders: [&'static encoding_rs::Encoding; 2] =
        [encoding_rs::UTF_8, encoding_rs::WINDOWS_1252];

    decoders
        .into_iter()
        .find_map(|decoder| {
            let (text, encoding, had_errors) = decoder.decode(&bytes);
            if had_errors {
                trace!("{} is not {}", path.display(), encoding.name());
                return None;
            }
            trace!("{} decoded as {}", path.display(), encoding.name());
            Some(text.into_owned())
        })
        .ok_or_else(|| {
            diagnostic(
                Problem::UnsupportedEncoding,
                path,
                String::from("the file is not UTF-8 or Windows-1252"),
            )
        })
}

fn diagnostic(problem: Problem, path: &Path, message: String) -> Diagnostic {
    Diagnostic::problem(problem, Label::file(&FileId::from_path(path), message))
        .with_context("path", &path.display().to_string())
}
