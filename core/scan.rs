use crate::classify::{TextClassifier, guess_mime};
use crate::error::{AppError, Result};
use crate::patterns::ExclusionRules;
use log;
#[cfg(feature = "serde_support")]
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One filesystem object found by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize))]
#[cfg_attr(feature = "serde_support", serde(rename_all = "camelCase"))]
pub struct FileEntry {
    pub absolute_path: PathBuf,
    pub relative_path: PathBuf,
    pub size_bytes: u64,
    pub is_dir: bool,
    pub is_text: bool,
    #[cfg_attr(
        feature = "serde_support",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub mime_type: Option<String>,
}

impl FileEntry {
    pub fn name(&self) -> String {
        self.absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.absolute_path.display().to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize))]
pub struct DirectoryListing {
    pub directories: Vec<FileEntry>,
    pub files: Vec<FileEntry>,
}

impl DirectoryListing {
    /// Directories first, then files; the order entries are numbered in.
    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.directories.iter().chain(self.files.iter())
    }

    /// Entry at 1-based `position` of [`Self::entries`].
    pub fn get(&self, position: usize) -> Option<&FileEntry> {
        self.entries().nth(position.checked_sub(1)?)
    }

    pub fn len(&self) -> usize {
        self.directories.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}

/// Lists and walks directories under a fixed set of exclusion rules and a
/// text classifier.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    pub rules: &'a ExclusionRules,
    pub classifier: &'a TextClassifier,
}

impl<'a> Scanner<'a> {
    pub fn new(rules: &'a ExclusionRules, classifier: &'a TextClassifier) -> Self {
        Self { rules, classifier }
    }

    /// Lists the immediate children of `directory`, sorted by name, without
    /// the excluded ones.
    pub fn scan(&self, directory: &Path) -> Result<DirectoryListing> {
        log::debug!("Scanning directory: {}", directory.display());
        let reader = fs::read_dir(directory).map_err(|e| AppError::from_io(directory, e))?;

        let mut children: Vec<PathBuf> = Vec::new();
        for entry_result in reader {
            match entry_result {
                Ok(entry) => children.push(entry.path()),
                Err(e) => log::warn!("Error reading entry in {}: {}", directory.display(), e),
            }
        }
        children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut listing = DirectoryListing::default();
        for path in children {
            if self.rules.is_excluded(&path, directory) {
                continue;
            }
            // Follows symlinks, so a link to a directory lists as a directory.
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            let relative_path = path
                .strip_prefix(directory)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.clone());

            if metadata.is_file() {
                listing.files.push(FileEntry {
                    is_text: self.classifier.is_text(&path),
                    mime_type: guess_mime(&path),
                    size_bytes: metadata.len(),
                    is_dir: false,
                    relative_path,
                    absolute_path: path,
                });
            } else if metadata.is_dir() {
                listing.directories.push(FileEntry {
                    absolute_path: path,
                    relative_path,
                    size_bytes: 0,
                    is_dir: true,
                    is_text: false,
                    mime_type: None,
                });
            } else {
                log::trace!("Skipping special file: {}", path.display());
            }
        }
        log::debug!(
            "Listed {} directories and {} files in {}",
            listing.directories.len(),
            listing.files.len(),
            directory.display()
        );
        Ok(listing)
    }

    /// Every text file below `directory`, at any depth, that is not excluded
    /// relative to `base`. Excluded directories are not descended into.
    /// Unreadable subtrees are logged and skipped.
    pub fn walk_text_files(&self, directory: &Path, base: &Path) -> Vec<PathBuf> {
        log::debug!(
            "Walking {} (exclusions relative to {})",
            directory.display(),
            base.display()
        );
        let walker = WalkDir::new(directory)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.rules.is_excluded(entry.path(), base));

        let mut found = Vec::new();
        for entry_result in walker {
            match entry_result {
                Ok(entry) => {
                    // Links are not descended into, but a link to a file counts as that file.
                    let is_file = if entry.path_is_symlink() {
                        fs::metadata(entry.path()).is_ok_and(|meta| meta.is_file())
                    } else {
                        entry.file_type().is_file()
                    };
                    if !is_file {
                        continue;
                    }
                    let path = entry.path();
                    if self.classifier.is_text(path) {
                        found.push(path.to_path_buf());
                    } else {
                        log::trace!("Skipping non-text file: {}", path.display());
                    }
                }
                Err(e) => {
                    log::warn!("{}", AppError::from(e));
                }
            }
        }
        log::debug!("Walk found {} text files", found.len());
        found
    }
}

/// Resolves a user-supplied root directory: expands `~`, canonicalises, and
/// insists on an existing directory.
pub fn validate_root(path: &str) -> Result<PathBuf> {
    let expanded = PathBuf::from(shellexpand::tilde(path.trim()).as_ref());
    let canonical = expanded
        .canonicalize()
        .map_err(|e| AppError::from_io(&expanded, e))?;
    if !canonical.is_dir() {
        return Err(AppError::NotADirectory(canonical));
    }
    log::debug!("Using root directory: {}", canonical.display());
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn validate_root_accepts_directories_only() {
        let dir = fixture();
        let root = validate_root(&dir.path().display().to_string()).unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());

        let file = dir.path().join("a.txt").display().to_string();
        assert!(matches!(validate_root(&file), Err(AppError::NotADirectory(_))));

        let missing = dir.path().join("nope").display().to_string();
        assert!(matches!(validate_root(&missing), Err(AppError::PathNotFound(_))));
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("b.rs"), "fn b() {}\n").unwrap();
        fs::write(root.join("a.txt"), "alpha\n").unwrap();
        fs::write(root.join("image.png"), [0x89, b'P', b'N', b'G']).unwrap();
        fs::write(root.join("blob.bin"), [1, 0, 2]).unwrap();
        fs::write(root.join("src/lib.rs"), "pub fn lib() {}\n").unwrap();
        fs::write(root.join("src/nested/deep.md"), "# deep\n").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "module.exports = 1;\n").unwrap();
        dir
    }

    #[test]
    fn scan_lists_children_sorted_and_filtered() {
        let dir = fixture();
        let rules = ExclusionRules::with_defaults();
        let classifier = TextClassifier::new();
        let listing = Scanner::new(&rules, &classifier).scan(dir.path()).unwrap();

        let dir_names: Vec<String> = listing.directories.iter().map(FileEntry::name).collect();
        let file_names: Vec<String> = listing.files.iter().map(FileEntry::name).collect();
        assert_eq!(dir_names, vec!["src"]);
        assert_eq!(file_names, vec!["a.txt", "b.rs", "blob.bin"]);

        let src = &listing.directories[0];
        assert_eq!(src.size_bytes, 0);
        assert!(!src.is_text);
        assert_eq!(src.mime_type, None);

        let blob = listing.files.iter().find(|f| f.name() == "blob.bin").unwrap();
        assert!(!blob.is_text);
        assert_eq!(blob.size_bytes, 3);
        assert_eq!(blob.relative_path, PathBuf::from("blob.bin"));

        assert_eq!(listing.get(1).map(FileEntry::name).as_deref(), Some("src"));
        assert_eq!(listing.get(2).map(FileEntry::name).as_deref(), Some("a.txt"));
        assert!(listing.get(0).is_none());
        assert_eq!(listing.len(), 4);
    }

    #[test]
    fn scan_of_missing_directory_errors() {
        let dir = TempDir::new().unwrap();
        let rules = ExclusionRules::new();
        let classifier = TextClassifier::new();
        let result = Scanner::new(&rules, &classifier).scan(&dir.path().join("missing"));
        assert!(matches!(result, Err(AppError::PathNotFound(_))));
    }

    #[test]
    fn walk_prunes_excluded_directories() {
        let dir = fixture();
        let rules = ExclusionRules::with_defaults();
        let classifier = TextClassifier::new();
        let found = Scanner::new(&rules, &classifier).walk_text_files(dir.path(), dir.path());
        let relative: Vec<PathBuf> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b.rs"),
                PathBuf::from("src/lib.rs"),
                PathBuf::from("src/nested/deep.md"),
            ]
        );
    }

    #[test]
    fn walk_root_itself_is_never_excluded() {
        let dir = fixture();
        let rules = ExclusionRules::from_patterns(["node_modules"]);
        let classifier = TextClassifier::new();
        let modules = dir.path().join("node_modules");
        let found = Scanner::new(&rules, &classifier).walk_text_files(&modules, dir.path());
        assert_eq!(found, vec![modules.join("pkg/index.js")]);
    }

    #[cfg(unix)]
    #[test]
    fn walk_includes_symlinked_files_but_not_linked_directories() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::create_dir_all(root.join("elsewhere")).unwrap();
        fs::write(root.join("real.py"), "x = 1\n").unwrap();
        fs::write(root.join("elsewhere/far.py"), "y = 2\n").unwrap();
        symlink(root.join("real.py"), root.join("sub/link.py")).unwrap();
        symlink(root.join("missing.py"), root.join("sub/dangling.py")).unwrap();
        symlink(root.join("elsewhere"), root.join("sub/linked_dir")).unwrap();

        let rules = ExclusionRules::new();
        let classifier = TextClassifier::new();
        let sub = root.join("sub");
        let found = Scanner::new(&rules, &classifier).walk_text_files(&sub, root);
        assert_eq!(found, vec![sub.join("link.py")]);
    }
}
