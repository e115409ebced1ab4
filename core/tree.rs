use log;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE_INDENT: &str = "│   ";
const BLANK_INDENT: &str = "    ";

/// Renders the selected files as a two-level tree: files directly under
/// `base` first, then one group per parent directory (relative to `base`).
///
/// Paths outside `base` are left out. The output depends only on the set of
/// paths, never on their order in `selection`.
pub fn render_tree(base: &Path, selection: &[PathBuf]) -> String {
    if selection.is_empty() {
        return String::new();
    }

    let mut groups: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
    for path in selection {
        let Ok(relative) = path.strip_prefix(base) else {
            log::trace!("Leaving out of tree (outside base): {}", path.display());
            continue;
        };
        let Some(name) = relative.file_name() else {
            continue;
        };
        let parent = relative.parent().map(Path::to_path_buf).unwrap_or_default();
        groups
            .entry(parent)
            .or_default()
            .push(name.to_string_lossy().into_owned());
    }
    for names in groups.values_mut() {
        names.sort();
        names.dedup();
    }

    let mut lines = vec![format!("{}/", root_label(base))];
    let group_count = groups.len();
    for (group_index, (dir, names)) in groups.iter().enumerate() {
        let last_group = group_index + 1 == group_count;
        if dir.as_os_str().is_empty() {
            for (i, name) in names.iter().enumerate() {
                let last = last_group && i + 1 == names.len();
                lines.push(format!("{}{}", if last { LAST_BRANCH } else { BRANCH }, name));
            }
            continue;
        }

        lines.push(format!(
            "{}{}/",
            if last_group { LAST_BRANCH } else { BRANCH },
            slash_joined(dir)
        ));
        let indent = if last_group { BLANK_INDENT } else { PIPE_INDENT };
        for (i, name) in names.iter().enumerate() {
            let connector = if i + 1 == names.len() { LAST_BRANCH } else { BRANCH };
            lines.push(format!("{}{}{}", indent, connector, name));
        }
    }
    lines.join("\n")
}

fn root_label(base: &Path) -> String {
    base.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| base.display().to_string())
}

fn slash_joined(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
