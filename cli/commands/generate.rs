use anyhow::{Context, Result, bail};
use log;
use normalizer_core::{
    AppError, Scanner, SelectionSet, TextClassifier, generate, validate_root,
};
use std::io;
use std::path::{Path, PathBuf};

use crate::cli_args::{Cli, GenerateArgs};
use crate::config::Settings;
use crate::output::make_renderer;

pub fn handle_generate_command(args: &GenerateArgs, cli: &Cli) -> Result<()> {
    let base = validate_root(&args.path)
        .with_context(|| format!("Cannot use '{}' as base directory", args.path))?;
    log::info!("Base directory determined: {}", base.display());

    let settings = Settings::load(&base, &cli.config_file, &cli.exclusion, cli.no_color)
        .context("Failed to load configuration")?;
    let rules = settings.exclusion_rules();
    let classifier = settings.classifier();
    let scanner = Scanner::new(&rules, &classifier);

    let destination = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.output.default_name));

    let selection = build_selection(&base, args, &scanner, &classifier)?;

    let report = generate(&base, &selection, &destination)
        .context("Failed to generate normalized file")?;

    if !cli.quiet {
        let mut renderer = make_renderer(Box::new(io::stdout()), settings.ui.plain, false);
        renderer.report(&report)?;
    }
    Ok(())
}

/// Applies the selectors of `args` in order (files, directories, regexes).
/// Without any selector every text file under `base` is selected.
fn build_selection(
    base: &Path,
    args: &GenerateArgs,
    scanner: &Scanner,
    classifier: &TextClassifier,
) -> Result<SelectionSet> {
    let resolve = |path: &Path| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        }
    };
    let mut selection = SelectionSet::new();

    for file in &args.files {
        let path = resolve(file);
        if !selection.add_file(&path, classifier) {
            log::warn!("Not selecting {}: missing, binary or already selected", path.display());
        }
    }

    for dir in &args.dirs {
        let path = resolve(dir);
        if !path.is_dir() {
            bail!(AppError::NotADirectory(path));
        }
        selection.add_directory(&path, scanner);
    }

    if !args.regexes.is_empty() {
        let listing = scanner
            .scan(base)
            .with_context(|| format!("Failed to list {}", base.display()))?;
        for pattern in &args.regexes {
            selection.add_by_regex(pattern, base, &listing.files, scanner)?;
        }
    }

    if args.files.is_empty() && args.dirs.is_empty() && args.regexes.is_empty() {
        log::debug!("No selectors given, selecting every text file under the base");
        for path in scanner.walk_text_files(base, base) {
            selection.add_file(&path, classifier);
        }
    }

    log::info!("Selected {} files", selection.len());
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use normalizer_core::ExclusionRules;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules")).unwrap();
        fs::write(root.join("README.md"), "# readme\n").unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}\n").unwrap();
        fs::write(root.join("src/test_util.rs"), "pub fn t() {}\n").unwrap();
        fs::write(root.join("node_modules/dep.js"), "x\n").unwrap();
        dir
    }

    fn args(files: &[&str], dirs: &[&str], regexes: &[&str]) -> GenerateArgs {
        GenerateArgs {
            path: ".".to_string(),
            files: files.iter().map(PathBuf::from).collect(),
            dirs: dirs.iter().map(PathBuf::from).collect(),
            regexes: regexes.iter().map(|r| r.to_string()).collect(),
            output: None,
        }
    }

    fn select(root: &Path, args: &GenerateArgs) -> Result<SelectionSet> {
        let rules = ExclusionRules::with_defaults();
        let classifier = TextClassifier::new();
        let scanner = Scanner::new(&rules, &classifier);
        build_selection(root, args, &scanner, &classifier)
    }

    #[test]
    fn no_selectors_selects_every_text_file() {
        let dir = project();
        let selection = select(dir.path(), &args(&[], &[], &[])).unwrap();
        assert_eq!(selection.len(), 3);
        assert!(!selection.contains(&dir.path().join("node_modules/dep.js")));
    }

    #[test]
    fn selectors_combine_and_resolve_against_base() {
        let dir = project();
        let selection = select(dir.path(), &args(&["README.md"], &[], &["^test_"])).unwrap();
        assert_eq!(
            selection.list(),
            vec![dir.path().join("README.md"), dir.path().join("src/test_util.rs")]
        );
    }

    #[test]
    fn directory_selector_must_be_a_directory() {
        let dir = project();
        let err = select(dir.path(), &args(&[], &["README.md"], &[])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::NotADirectory(_))
        ));
        let selection = select(dir.path(), &args(&[], &["src"], &[])).unwrap();
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn invalid_regex_is_an_error() {
        let dir = project();
        let err = select(dir.path(), &args(&[], &[], &["["])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::InvalidPattern { .. })
        ));
    }
}
