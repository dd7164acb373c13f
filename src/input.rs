//! Input resolution: one alignment file or a directory of `*.fasta` files.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use thiserror::Error;

/// Extension of alignment files picked up in directory mode.
pub const ALIGNMENT_EXTENSION: &str = "fasta";

/// Where alignments come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A single alignment file
    Alignment(PathBuf),
    /// A directory of `*.fasta` alignment files (not recursive)
    Directory(PathBuf),
}

/// A named alignment file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentInput {
    /// File name without directory and extension
    pub name: String,
    pub path: PathBuf,
}

impl AlignmentInput {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }
}

/// Errors that can occur while resolving inputs.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Lists the alignments to analyse, in processing order.
///
/// Directory entries are sorted by file name. A directory without any
/// `*.fasta` file yields an empty list.
pub fn resolve_inputs(source: &InputSource) -> Result<Vec<AlignmentInput>, InputError> {
    match source {
        InputSource::Alignment(path) => Ok(vec![AlignmentInput::from_path(path)]),
        InputSource::Directory(dir) => {
            let read_err = |source| InputError::ReadDir {
                path: dir.clone(),
                source,
            };
            let mut paths = Vec::new();
            for entry in fs::read_dir(dir).map_err(read_err)? {
                let path = entry.map_err(read_err)?.path();
                if path.is_file() && has_alignment_extension(&path) {
                    paths.push(path);
                }
            }
            if paths.is_empty() {
                warn!("No *.{} files found in {}", ALIGNMENT_EXTENSION, dir.display());
            }
            paths.sort();
            Ok(paths.into_iter().map(AlignmentInput::from_path).collect())
        }
    }
}

fn has_alignment_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ALIGNMENT_EXTENSION)
}

/// clap value parser: the path must be an existing file.
pub fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("{} is not a file", value))
    }
}

/// clap value parser: the path must be an existing directory.
pub fn existing_dir(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("{} is not a directory", value))
    }
}
