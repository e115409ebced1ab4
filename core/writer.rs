//! Serialises a selection into the aggregate document.
//!
//! Layout: banner, project structure (tree), one bordered block per file in
//! `SelectionSet::list` order, summary. Per-file read problems are written
//! inline and counted; only failing to create or write the destination
//! aborts generation.

use crate::error::{AppError, Result};
use crate::selection::SelectionSet;
use crate::tree::render_tree;
use chrono::Local;
use log;
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_NAME: &str = "NormalizedFile.txt";
pub const TITLE: &str = "CODEBASE NORMALIZED FILE";
pub const STRUCTURE_LABEL: &str = "PROJECT STRUCTURE";
pub const CONTENTS_LABEL: &str = "FILE CONTENTS";
pub const SUMMARY_LABEL: &str = "GENERATION SUMMARY";
pub const LATIN1_WARNING: &str = "[WARNING: File decoded with latin-1 encoding]";

const RULE_WIDTH: usize = 80;
const STRUCTURE_RULE_WIDTH: usize = 40;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub output_path: PathBuf,
}

/// Writes the aggregate for `selection` to `destination`, creating or
/// overwriting it. The destination itself is never read back as one of the
/// selected files. An empty selection is refused before anything is written.
pub fn generate(
    base: &Path,
    selection: &SelectionSet,
    destination: &Path,
) -> Result<GenerationReport> {
    let output_path =
        std::path::absolute(destination).unwrap_or_else(|_| destination.to_path_buf());
    let files = files_to_aggregate(selection, &output_path);
    if files.is_empty() {
        log::error!("Refusing to generate with an empty selection");
        return Err(AppError::EmptySelection);
    }
    let to_destination_error = |source: io::Error| AppError::DestinationWrite {
        path: output_path.clone(),
        source,
    };

    log::info!(
        "Generating aggregate of {} files into {}",
        files.len(),
        output_path.display()
    );
    let file = File::create(destination).map_err(to_destination_error)?;
    let mut out = BufWriter::new(file);
    let (success_count, failure_count) =
        write_document(&mut out, base, &files, &output_path).map_err(to_destination_error)?;
    out.flush().map_err(to_destination_error)?;

    log::info!(
        "Generation complete: {} succeeded, {} failed",
        success_count,
        failure_count
    );
    Ok(GenerationReport {
        success_count,
        failure_count,
        output_path,
    })
}

/// Selected files in list order, minus the output file when an earlier
/// aggregate of the same name was picked up by the selection.
fn files_to_aggregate(selection: &SelectionSet, output_path: &Path) -> Vec<PathBuf> {
    let canonical_output = fs::canonicalize(output_path).ok();
    selection
        .list()
        .into_iter()
        .filter(|path| {
            let is_output = path == output_path
                || canonical_output
                    .as_ref()
                    .is_some_and(|output| fs::canonicalize(path).ok().as_ref() == Some(output));
            if is_output {
                log::info!("Leaving the output file out of its own aggregate: {}", path.display());
            }
            !is_output
        })
        .collect()
}

fn write_document<W: Write>(
    out: &mut W,
    base: &Path,
    files: &[PathBuf],
    output_path: &Path,
) -> io::Result<(usize, usize)> {
    let rule = "=".repeat(RULE_WIDTH);

    writeln!(out, "{rule}")?;
    writeln!(out, "{TITLE}")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "Generated on: {}", timestamp())?;
    writeln!(out, "Base Directory: {}", base.display())?;
    writeln!(out, "Total Files: {}", files.len())?;
    writeln!(out, "{rule}")?;
    writeln!(out)?;

    writeln!(out, "{STRUCTURE_LABEL}")?;
    writeln!(out, "{}", "-".repeat(STRUCTURE_RULE_WIDTH))?;
    let tree = render_tree(base, files);
    if !tree.is_empty() {
        writeln!(out, "{tree}")?;
        writeln!(out)?;
    }

    writeln!(out, "{rule}")?;
    writeln!(out, "{CONTENTS_LABEL}")?;
    writeln!(out, "{rule}")?;
    writeln!(out)?;

    let mut success_count = 0;
    let mut failure_count = 0;
    for path in files {
        if write_file_block(out, base, path)? {
            success_count += 1;
        } else {
            failure_count += 1;
        }
    }

    writeln!(out, "{rule}")?;
    writeln!(out, "{SUMMARY_LABEL}")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "Successfully processed: {} files", success_count)?;
    if failure_count > 0 {
        writeln!(out, "Failed to process: {} files", failure_count)?;
    }
    writeln!(out, "Base directory: {}", base.display())?;
    writeln!(out, "Output file: {}", output_path.display())?;
    writeln!(out, "Generated: {}", timestamp())?;
    writeln!(out, "{rule}")?;
    Ok((success_count, failure_count))
}

/// Writes one bordered file block. Returns whether the file's content made
/// it into the document.
fn write_file_block<W: Write>(out: &mut W, base: &Path, path: &Path) -> io::Result<bool> {
    let shown = path
        .strip_prefix(base)
        .map(|relative| relative.display().to_string())
        .unwrap_or_else(|_| path.display().to_string());

    let (size, content) = match fs::read(path) {
        Ok(bytes) => (format_size(bytes.len() as u64), Ok(bytes)),
        Err(e) => {
            let size = fs::metadata(path)
                .map(|m| format_size(m.len()))
                .unwrap_or_else(|_| "unknown".to_string());
            (size, Err(e))
        }
    };

    writeln!(out, "/{}\\", "=".repeat(RULE_WIDTH - 2))?;
    writeln!(out, "| FILE: {}", shown)?;
    writeln!(out, "| PATH: {}", path.display())?;
    writeln!(out, "| SIZE: {}", size)?;
    writeln!(out, "\\{}/", "=".repeat(RULE_WIDTH - 2))?;
    writeln!(out)?;

    let written = match content {
        Ok(bytes) => {
            let text = match std::str::from_utf8(&bytes) {
                Ok(text) => Cow::Borrowed(text),
                Err(e) => {
                    log::warn!("Falling back to latin-1 for {}: {}", path.display(), e);
                    writeln!(out, "{LATIN1_WARNING}")?;
                    encoding_rs::mem::decode_latin1(&bytes)
                }
            };
            out.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                writeln!(out)?;
            }
            true
        }
        Err(source) => {
            let reason = source.to_string();
            log::warn!(
                "{}",
                AppError::FileRead {
                    path: path.to_path_buf(),
                    source,
                }
            );
            writeln!(out, "[ERROR: Could not read file - {}]", reason)?;
            false
        }
    };

    writeln!(out)?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    writeln!(out)?;
    Ok(written)
}

fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Human-readable size with binary steps and one decimal, e.g. `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} TB", size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(0), "0.0 B");
        assert_eq!(format_size(512), "512.0 B");
        assert_eq!(format_size(1023), "1023.0 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
        assert_eq!(format_size(1024u64.pow(4)), "1.0 TB");
        assert_eq!(format_size(1024u64.pow(5)), "1024.0 TB");
    }

    #[test]
    fn missing_file_block_is_marked_failed() {
        let mut buffer = Vec::new();
        let ok = write_file_block(
            &mut buffer,
            Path::new("/definitely/not"),
            Path::new("/definitely/not/here.txt"),
        )
        .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(!ok);
        assert!(text.contains("| FILE: here.txt\n"));
        assert!(text.contains("| SIZE: unknown\n"));
        assert!(text.contains("[ERROR: Could not read file - "));
    }
}
