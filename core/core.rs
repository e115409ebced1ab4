pub mod classify;
pub mod defaults;
pub mod error;
pub mod patterns;
pub mod scan;
pub mod selection;
pub mod tree;
pub mod writer;

pub use classify::{TextClassifier, guess_mime};
pub use defaults::{BuiltinDefaults, default_exclusion_patterns, default_text_extensions};
pub use error::{AppError, Result};
pub use patterns::{ExclusionRules, matches};
pub use scan::{DirectoryListing, FileEntry, Scanner, validate_root};
pub use selection::{ParsedSelection, SelectionSet, parse_selection_spec};
pub use tree::render_tree;
pub use writer::{DEFAULT_OUTPUT_NAME, GenerationReport, format_size, generate};
