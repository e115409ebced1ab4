use crate::classify::TextClassifier;
use crate::error::{AppError, Result};
use crate::scan::{DirectoryListing, FileEntry, Scanner};
use log;
use regex::RegexBuilder;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// The files chosen for aggregation, as absolute paths.
///
/// Only regular text files are ever inserted; directories expand to the text
/// files below them. Membership does not guarantee the file is still readable
/// when the aggregate is generated.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    paths: HashSet<PathBuf>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single file if it is a regular file classified as text.
    /// Returns true only when the path was not already selected.
    pub fn add_file(&mut self, path: &Path, classifier: &TextClassifier) -> bool {
        if !path.is_file() {
            log::debug!("Not a regular file, not selecting: {}", path.display());
            return false;
        }
        if !classifier.is_text(path) {
            log::debug!("Not a text file, not selecting: {}", path.display());
            return false;
        }
        self.insert(path)
    }

    /// Selects every non-excluded text file below `directory`. Exclusions are
    /// evaluated relative to the directory's parent so the directory's own
    /// name participates in relative-path rules.
    pub fn add_directory(&mut self, directory: &Path, scanner: &Scanner) -> usize {
        let base = directory.parent().unwrap_or(directory);
        let added = scanner
            .walk_text_files(directory, base)
            .iter()
            .filter(|path| self.insert(path))
            .count();
        log::info!("Selected {} files from {}", added, directory.display());
        added
    }

    /// Selects the text files of one directory listing (no recursion).
    pub fn add_listing_text_files(&mut self, listing: &DirectoryListing) -> usize {
        listing
            .files
            .iter()
            .filter(|entry| entry.is_text)
            .filter(|entry| self.insert(&entry.absolute_path))
            .count()
    }

    /// Selects files whose *name* contains a match for `pattern`
    /// (case-insensitive), among the already listed `known_files` and every
    /// text file below `scan_root`. Nothing is added for an invalid pattern.
    pub fn add_by_regex(
        &mut self,
        pattern: &str,
        scan_root: &Path,
        known_files: &[FileEntry],
        scanner: &Scanner,
    ) -> Result<usize> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| AppError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        let name_matches = |path: &Path| {
            path.file_name()
                .is_some_and(|name| regex.is_match(&name.to_string_lossy()))
        };

        let mut added = 0;
        for entry in known_files.iter().filter(|e| !e.is_dir && e.is_text) {
            if name_matches(&entry.absolute_path) && self.insert(&entry.absolute_path) {
                added += 1;
            }
        }
        for path in scanner.walk_text_files(scan_root, scan_root) {
            if name_matches(&path) && self.insert(&path) {
                added += 1;
            }
        }
        log::info!("Selected {} files matching pattern '{}'", added, pattern);
        Ok(added)
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        let absolute = absolutize(path);
        self.paths.remove(&absolute)
    }

    pub fn clear(&mut self) {
        log::debug!("Clearing {} selected files", self.paths.len());
        self.paths.clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(&absolutize(path))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Selected paths sorted by their full path string.
    pub fn list(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.paths.iter().cloned().collect();
        paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        paths
    }

    fn insert(&mut self, path: &Path) -> bool {
        let inserted = self.paths.insert(absolutize(path));
        if inserted {
            log::trace!("Selected: {}", path.display());
        }
        inserted
    }
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Manual selection input resolved against a listing of known length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSelection {
    /// Sorted, de-duplicated 1-based positions within the listing.
    pub positions: Vec<usize>,
    /// Input parts that point (partly) outside the listing, as typed.
    pub out_of_range: Vec<String>,
}

/// Parses manual selection input such as `1,3,5` or `2-4` against a listing
/// of `limit` entries. A part with exactly one `-` is an inclusive range; a
/// reversed range selects nothing. Ranges are clamped to `1..=limit` and the
/// offending part is reported once in `out_of_range`.
pub fn parse_selection_spec(input: &str, limit: usize) -> Result<ParsedSelection> {
    let invalid = || AppError::InvalidSelectionSyntax(input.trim().to_string());
    let mut positions = BTreeSet::new();
    let mut out_of_range = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.matches('-').count() == 1 {
            let (start, end) = part.split_once('-').ok_or_else(invalid)?;
            let start: usize = start.trim().parse().map_err(|_| invalid())?;
            let end: usize = end.trim().parse().map_err(|_| invalid())?;
            if start > end {
                continue;
            }
            let (low, high) = (start.max(1), end.min(limit));
            if low <= high {
                positions.extend(low..=high);
            }
            if start < 1 || end > limit {
                out_of_range.push(format!("{start}-{end}"));
            }
        } else {
            let position = part.parse::<usize>().map_err(|_| invalid())?;
            if (1..=limit).contains(&position) {
                positions.insert(position);
            } else {
                out_of_range.push(position.to_string());
            }
        }
    }
    Ok(ParsedSelection {
        positions: positions.into_iter().collect(),
        out_of_range,
    })
}
