use normalizer_core::{
    AppError, ExclusionRules, Scanner, SelectionSet, TextClassifier, generate,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("a.py"), "print('a')\n").unwrap();
    fs::write(dir.path().join("sub/b.py"), "print('b')").unwrap();
    dir
}

fn select_all(root: &Path) -> SelectionSet {
    let rules = ExclusionRules::with_defaults();
    let classifier = TextClassifier::new();
    let scanner = Scanner::new(&rules, &classifier);
    let listing = scanner.scan(root).unwrap();
    let mut selection = SelectionSet::new();
    selection.add_listing_text_files(&listing);
    for dir in &listing.directories {
        selection.add_directory(&dir.absolute_path, &scanner);
    }
    selection
}

fn block_header(relative: &str) -> String {
    format!("| FILE: {}\n", relative)
}

#[test]
fn document_has_banner_tree_blocks_and_summary_in_order() {
    let dir = project();
    let root = dir.path();
    let out = TempDir::new().unwrap();
    let destination = out.path().join("NormalizedFile.txt");

    let selection = select_all(root);
    assert_eq!(selection.len(), 2);
    let report = generate(root, &selection, &destination).unwrap();
    assert_eq!(report.success_count, 2);
    assert_eq!(report.failure_count, 0);
    assert_eq!(report.output_path, destination);

    let document = fs::read_to_string(&destination).unwrap();
    let rule = "=".repeat(80);
    assert!(document.starts_with(&format!("{rule}\nCODEBASE NORMALIZED FILE\n{rule}\n")));

    let lines: Vec<&str> = document.lines().collect();
    assert!(lines[3].starts_with("Generated on: "));
    assert_eq!(lines[4], format!("Base Directory: {}", root.display()));
    assert_eq!(lines[5], "Total Files: 2");

    let name = root.file_name().unwrap().to_string_lossy();
    let tree = format!("{name}/\n├── a.py\n└── sub/\n    └── b.py\n");
    assert!(document.contains(&format!("PROJECT STRUCTURE\n{}\n{tree}", "-".repeat(40))));

    let first = document.find(&block_header("a.py")).unwrap();
    let nested = Path::new("sub").join("b.py").display().to_string();
    let second = document.find(&block_header(&nested)).unwrap();
    assert!(first < second);
    assert!(document.contains(&format!("| PATH: {}\n", root.join("a.py").display())));
    assert!(document.contains("| SIZE: 11.0 B\n"));

    let summary = document.find("GENERATION SUMMARY").unwrap();
    assert!(second < summary);
    assert!(document.contains("Successfully processed: 2 files\n"));
    assert!(!document.contains("Failed to process"));
    assert!(document.contains(&format!("Output file: {}\n", destination.display())));
    assert!(document.ends_with(&format!("{rule}\n")));
}

#[test]
fn file_content_round_trips_between_borders() {
    let dir = project();
    let out = TempDir::new().unwrap();
    let destination = out.path().join("out.txt");
    generate(dir.path(), &select_all(dir.path()), &destination).unwrap();

    let document = fs::read_to_string(&destination).unwrap();
    let closing = format!("\\{}/\n\n", "=".repeat(78));
    let separator = format!("\n{}\n\n", "-".repeat(80));
    assert!(document.contains(&format!("{closing}print('a')\n{separator}")));
    // A missing trailing newline is supplied.
    assert!(document.contains(&format!("{closing}print('b')\n{separator}")));
}

#[test]
fn empty_selection_writes_nothing() {
    let dir = project();
    let destination = dir.path().join("never.txt");
    let result = generate(dir.path(), &SelectionSet::new(), &destination);
    assert!(matches!(result, Err(AppError::EmptySelection)));
    assert!(!destination.exists());
}

#[test]
fn non_utf8_file_falls_back_to_latin1() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.txt");
    fs::write(&path, b"caf\xe9\n").unwrap();
    let mut selection = SelectionSet::new();
    assert!(selection.add_file(&path, &TextClassifier::new()));

    let destination = dir.path().join("out.txt");
    let report = generate(dir.path(), &selection, &destination).unwrap();
    assert_eq!(report.success_count, 1);
    assert_eq!(report.failure_count, 0);

    let document = fs::read_to_string(&destination).unwrap();
    let warning = "[WARNING: File decoded with latin-1 encoding]";
    assert_eq!(document.matches(warning).count(), 1);
    assert!(document.contains(&format!("{warning}\ncafé\n")));
}

#[test]
fn vanished_file_is_reported_inline_and_counted() {
    let dir = project();
    let selection = select_all(dir.path());
    fs::remove_file(dir.path().join("a.py")).unwrap();

    let out = TempDir::new().unwrap();
    let destination = out.path().join("out.txt");
    let report = generate(dir.path(), &selection, &destination).unwrap();
    assert_eq!(report.success_count, 1);
    assert_eq!(report.failure_count, 1);

    let document = fs::read_to_string(&destination).unwrap();
    assert!(document.contains("[ERROR: Could not read file - "));
    assert!(document.contains("| SIZE: unknown\n"));
    assert!(document.contains("Failed to process: 1 files\n"));
}

#[test]
fn unwritable_destination_is_a_destination_error() {
    let dir = project();
    let destination = dir.path().join("missing_dir").join("out.txt");
    let result = generate(dir.path(), &select_all(dir.path()), &destination);
    assert!(matches!(result, Err(AppError::DestinationWrite { .. })));
}

#[test]
fn regex_selection_feeds_generation() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("pkg/inner")).unwrap();
    fs::write(root.join("test_top.py"), "top\n").unwrap();
    fs::write(root.join("main.py"), "main\n").unwrap();
    fs::write(root.join("pkg/inner/Test_deep.py"), "deep\n").unwrap();

    let rules = ExclusionRules::with_defaults();
    let classifier = TextClassifier::new();
    let scanner = Scanner::new(&rules, &classifier);
    let listing = scanner.scan(root).unwrap();
    let mut selection = SelectionSet::new();
    let added = selection
        .add_by_regex("^test_", root, &listing.files, &scanner)
        .unwrap();
    assert_eq!(added, 2);

    let destination = root.join("out.txt");
    let report = generate(root, &selection, &destination).unwrap();
    assert_eq!(report.success_count, 2);
    let document = fs::read_to_string(&destination).unwrap();
    assert!(document.contains("└── pkg/inner/\n    └── Test_deep.py"));
    assert!(!document.contains("| FILE: main.py"));
}

#[test]
fn previous_aggregate_in_the_selection_is_not_read_back() {
    let dir = project();
    let root = dir.path();
    let destination = root.join("NormalizedFile.txt");
    let previous = "an older aggregate\n".repeat(1000);
    fs::write(&destination, &previous).unwrap();

    let selection = select_all(root);
    assert!(selection.contains(&destination));
    let report = generate(root, &selection, &destination).unwrap();
    assert_eq!(report.success_count, 2);
    assert_eq!(report.failure_count, 0);

    let document = fs::read_to_string(&destination).unwrap();
    assert!(document.contains("Total Files: 2\n"));
    assert!(!document.contains(&block_header("NormalizedFile.txt")));
    assert!(!document.contains("an older aggregate"));
}

#[test]
fn selection_of_only_the_destination_is_empty() {
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("bundle.txt");
    fs::write(&destination, "keep me\n").unwrap();
    let mut selection = SelectionSet::new();
    assert!(selection.add_file(&destination, &TextClassifier::new()));

    let err = generate(dir.path(), &selection, &destination).unwrap_err();
    assert!(matches!(err, AppError::EmptySelection));
    assert_eq!(fs::read_to_string(&destination).unwrap(), "keep me\n");
}
