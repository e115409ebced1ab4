use crate::defaults::default_text_extensions;
use log;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes inspected when neither the extension nor the
/// MIME type settles the question.
pub const SNIFF_LEN: u64 = 1024;

#[derive(Debug, Clone)]
pub struct TextClassifier {
    extensions: HashSet<String>,
}

impl Default for TextClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TextClassifier {
    pub fn new() -> Self {
        Self {
            extensions: default_text_extensions()
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
        }
    }

    /// Extends the allow-list. Leading dots are accepted and ignored.
    pub fn with_extra_extensions<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for ext in extra {
            let normalized = ext.as_ref().trim().trim_start_matches('.').to_lowercase();
            if !normalized.is_empty() {
                self.extensions.insert(normalized);
            }
        }
        self
    }

    pub fn has_text_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }

    /// Best-effort text/binary decision. Unreadable files count as binary.
    pub fn is_text(&self, path: &Path) -> bool {
        if self.has_text_extension(path) {
            return true;
        }
        if guess_mime(path).is_some_and(|mime| mime.starts_with("text/")) {
            return true;
        }
        match sniff_is_text(path) {
            Ok(is_text) => is_text,
            Err(e) => {
                log::debug!("Treating unreadable file as binary: {} ({})", path.display(), e);
                false
            }
        }
    }
}

fn sniff_is_text(path: &Path) -> std::io::Result<bool> {
    let file = File::open(path)?;
    let mut sample = Vec::with_capacity(SNIFF_LEN as usize);
    file.take(SNIFF_LEN).read_to_end(&mut sample)?;
    Ok(!sample.contains(&0))
}

/// MIME type guessed from the file name, for display.
pub fn guess_mime(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first_raw()
        .map(|mime| mime.to_string())
}
