//! Shell-wildcard matching and the exclusion rule set used while scanning.
//!
//! Patterns only understand `*` (any run of characters, separators included)
//! and `?` (exactly one character). Everything else is matched literally and
//! case-insensitively against the whole candidate.

use crate::defaults::default_exclusion_patterns;
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use log;
use std::collections::BTreeSet;
use std::path::Path;

/// Returns true when `name` matches the wildcard `pattern` in its entirety.
pub fn matches(name: &str, pattern: &str) -> bool {
    match compile_wildcard(pattern) {
        Ok(glob) => glob.compile_matcher().is_match(name),
        Err(e) => {
            log::warn!("Unusable exclusion pattern \"{}\": {}", pattern, e);
            false
        }
    }
}

/// Rewrites a wildcard pattern into globset syntax with every glob
/// metacharacter other than `*` and `?` escaped.
fn translate_wildcard(pattern: &str) -> String {
    let mut translated = String::with_capacity(pattern.len() + 8);
    let mut previous_star = false;
    for ch in pattern.chars() {
        match ch {
            '*' => {
                // `**` has directory semantics in globset; a run of stars means the same as one here.
                if !previous_star {
                    translated.push('*');
                }
            }
            '?' => translated.push('?'),
            '[' | ']' | '{' | '}' => {
                translated.push('[');
                translated.push(ch);
                translated.push(']');
            }
            _ => translated.push(ch),
        }
        previous_star = ch == '*';
    }
    translated
}

fn compile_wildcard(pattern: &str) -> Result<Glob, globset::Error> {
    GlobBuilder::new(&translate_wildcard(pattern))
        .case_insensitive(true)
        .literal_separator(false)
        .backslash_escape(false)
        .build()
}

/// The set of exclusion patterns active for a session.
///
/// A path is excluded when any single pattern matches either its final
/// component or its path relative to the directory being scanned.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    patterns: BTreeSet<String>,
    matcher: GlobSet,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ExclusionRules {
    /// An empty rule set; nothing is excluded.
    pub fn new() -> Self {
        Self {
            patterns: BTreeSet::new(),
            matcher: GlobSet::empty(),
        }
    }

    /// The baseline rules: VCS metadata, dependency and build caches, and
    /// common binary, media and archive extensions.
    pub fn with_defaults() -> Self {
        Self::from_patterns(default_exclusion_patterns())
    }

    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Self::new();
        for pattern in patterns {
            let trimmed = pattern.as_ref().trim();
            if !trimmed.is_empty() {
                rules.patterns.insert(trimmed.to_string());
            }
        }
        rules.rebuild();
        rules
    }

    /// Adds a pattern. Returns false for blank or already present patterns.
    pub fn add(&mut self, pattern: &str) -> bool {
        let trimmed = pattern.trim();
        if trimmed.is_empty() || !self.patterns.insert(trimmed.to_string()) {
            return false;
        }
        log::debug!("Added exclusion pattern: {}", trimmed);
        self.rebuild();
        true
    }

    pub fn remove(&mut self, pattern: &str) -> bool {
        if !self.patterns.remove(pattern.trim()) {
            return false;
        }
        log::debug!("Removed exclusion pattern: {}", pattern.trim());
        self.rebuild();
        true
    }

    /// Removes the pattern at the 1-based `position` of [`Self::sorted`].
    pub fn remove_at(&mut self, position: usize) -> Option<String> {
        let pattern = self
            .patterns
            .iter()
            .nth(position.checked_sub(1)?)
            .cloned()?;
        self.remove(&pattern);
        Some(pattern)
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
        self.rebuild();
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns.contains(pattern)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Patterns in display order.
    pub fn sorted(&self) -> Vec<&str> {
        self.patterns.iter().map(String::as_str).collect()
    }

    pub fn is_excluded(&self, path: &Path, base: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        if let Some(name) = path.file_name() {
            if self.matcher.is_match(Path::new(name)) {
                log::trace!("Excluded by name: {}", path.display());
                return true;
            }
        }
        match path.strip_prefix(base) {
            Ok(relative) if !relative.as_os_str().is_empty() => {
                let excluded = self.matcher.is_match(relative);
                if excluded {
                    log::trace!("Excluded by relative path: {}", relative.display());
                }
                excluded
            }
            _ => false,
        }
    }

    fn rebuild(&mut self) {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.patterns {
            match compile_wildcard(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => log::warn!("Skipping exclusion pattern \"{}\": {}", pattern, e),
            }
        }
        self.matcher = builder.build().unwrap_or_else(|e| {
            log::error!("Error building exclusion set: {}", e);
            GlobSet::empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn star_is_case_insensitive_and_anchored() {
        assert!(matches("Main.CPP", "*.cpp"));
        assert!(matches("main.cpp", "*.CPP"));
        assert!(!matches("main.cpp.bak", "*.cpp"));
        assert!(!matches("xmain.cpp", "main*"));
    }

    #[test]
    fn question_mark_matches_exactly_one_char() {
        assert!(matches("axtxt", "a?txt"));
        assert!(matches("a.txt", "a?txt"));
        assert!(!matches("atxt", "a?txt"));
        assert!(!matches("abbtxt", "a?txt"));
    }

    #[test]
    fn star_crosses_separators() {
        assert!(matches("build/output/x.o", "build/*"));
        assert!(matches("a/b", "a*b"));
    }

    #[test]
    fn other_metacharacters_are_literal() {
        assert!(matches("[abc].txt", "[abc].txt"));
        assert!(!matches("a.txt", "[abc].txt"));
        assert!(matches("{a,b}", "{a,b}"));
        assert!(!matches("a", "{a,b}"));
        assert!(matches("a+b(1).rs", "a+b(1).rs"));
        assert!(matches("x^$", "x^$"));
    }

    #[test]
    fn repeated_stars_behave_like_one() {
        assert!(matches("deep/nested/file.log", "**.log"));
        assert!(matches("file.log", "**.log"));
    }

    #[test]
    fn name_rule_excludes_directory_anywhere() {
        let rules = ExclusionRules::from_patterns(["node_modules"]);
        let base = PathBuf::from("/work");
        assert!(rules.is_excluded(Path::new("/work/node_modules"), &base));
        assert!(rules.is_excluded(Path::new("/work/project/node_modules"), &base));
        assert!(!rules.is_excluded(Path::new("/work/node_modules.txt"), &base));
        assert!(!rules.is_excluded(Path::new("/work/project/node_modules/index.js"), &base));
    }

    #[test]
    fn relative_path_rule_excludes_specific_location() {
        let rules = ExclusionRules::from_patterns(["build/output"]);
        let base = PathBuf::from("/work");
        assert!(rules.is_excluded(Path::new("/work/build/output"), &base));
        assert!(!rules.is_excluded(Path::new("/work/other/build/output"), &base));
        assert!(!rules.is_excluded(Path::new("/elsewhere/build/output"), &base));
    }

    #[test]
    fn wildcard_rule_needs_wildcard_to_cover_suffixes() {
        let rules = ExclusionRules::from_patterns(["node_modules*"]);
        let base = PathBuf::from("/work");
        assert!(rules.is_excluded(Path::new("/work/node_modules.txt"), &base));
    }

    #[test]
    fn add_remove_and_clear() {
        let mut rules = ExclusionRules::new();
        assert!(rules.add("*.bak"));
        assert!(!rules.add("*.bak"));
        assert!(!rules.add("   "));
        assert!(rules.add("target"));
        assert_eq!(rules.sorted(), vec!["*.bak", "target"]);
        assert!(rules.is_excluded(Path::new("/p/notes.BAK"), Path::new("/p")));

        assert_eq!(rules.remove_at(2).as_deref(), Some("target"));
        assert_eq!(rules.remove_at(0), None);
        assert_eq!(rules.remove_at(5), None);
        assert!(rules.remove("*.bak"));
        assert!(!rules.is_excluded(Path::new("/p/notes.bak"), Path::new("/p")));

        rules.add("x");
        rules.clear();
        assert!(rules.is_empty());
    }

    #[test]
    fn defaults_cover_vcs_and_media() {
        let rules = ExclusionRules::with_defaults();
        let base = Path::new("/repo");
        assert!(rules.is_excluded(Path::new("/repo/.git"), base));
        assert!(rules.is_excluded(Path::new("/repo/assets/logo.PNG"), base));
        assert!(rules.is_excluded(Path::new("/repo/dist.tar"), base));
        assert!(!rules.is_excluded(Path::new("/repo/src/main.rs"), base));
    }
}
