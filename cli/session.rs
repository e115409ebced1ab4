use anyhow::{Context, Result};
use log;
use normalizer_core::{
    AppError, DirectoryListing, ExclusionRules, Scanner, SelectionSet, TextClassifier, generate,
    parse_selection_spec, validate_root,
};
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::output::{Renderer, Tone};
use crate::prompt::{Prompter, ask_with_default, confirm};

/// What the main loop does after a menu action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Show the outcome, pausing first when the screen is about to be cleared.
    Continue,
    /// Redraw straight away.
    Redraw,
    Quit,
}

/// One interactive browsing session. Owns the selection and the exclusion
/// rules for its whole lifetime.
pub struct Session {
    root: PathBuf,
    dir_stack: Vec<PathBuf>,
    selection: SelectionSet,
    exclusions: ExclusionRules,
    classifier: TextClassifier,
    default_output: String,
    pause_after_action: bool,
    renderer: Box<dyn Renderer>,
    prompter: Box<dyn Prompter>,
}

impl Session {
    pub fn new(
        root: PathBuf,
        settings: &Settings,
        renderer: Box<dyn Renderer>,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            root,
            dir_stack: Vec::new(),
            selection: SelectionSet::new(),
            exclusions: settings.exclusion_rules(),
            classifier: settings.classifier(),
            default_output: settings.output.default_name.clone(),
            pause_after_action: settings.ui.clear_screen,
            renderer,
            prompter,
        }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn exclusions(&self) -> &ExclusionRules {
        &self.exclusions
    }

    pub fn current_dir(&self) -> &Path {
        self.dir_stack.last().unwrap_or(&self.root)
    }

    pub fn run(&mut self) -> Result<()> {
        log::info!("Starting interactive session in {}", self.root.display());
        loop {
            let current = self.current_dir().to_path_buf();
            self.renderer.clear().context("Failed to clear screen")?;
            self.renderer.status(&current, self.selection.len())?;
            let listing = self.list(&current)?;
            self.renderer.listing(&listing, &self.selection)?;
            self.renderer.menu()?;

            let Some(choice) = self.prompter.read_line("\nChoice: ")? else {
                log::debug!("Input closed, ending session");
                break;
            };
            let flow = match choice.trim() {
                "1" => self.select_individual(&listing)?,
                "2" => {
                    let added = self.selection.add_listing_text_files(&listing);
                    self.renderer.success(&format!("Selected {} text files", added))?;
                    Flow::Continue
                }
                "3" => {
                    let added = self.select_all_listed(&listing);
                    self.renderer.success(&format!("Selected {} files", added))?;
                    Flow::Continue
                }
                "4" => self.open_directory(&listing)?,
                "5" => self.select_by_regex(&current, &listing)?,
                "6" => {
                    if self.selection.is_empty() {
                        self.renderer.info("No files selected")?;
                    } else {
                        self.selection.clear();
                        self.renderer.success("Cleared all selections")?;
                    }
                    Flow::Continue
                }
                "7" => {
                    let paths = self.selection.list();
                    self.renderer.selection(&paths, &current)?;
                    Flow::Continue
                }
                "8" => self.manage_exclusions()?,
                "9" => self.generate_output(&current)?,
                "0" => match self.dir_stack.pop() {
                    Some(left) => {
                        log::debug!("Leaving {}", left.display());
                        Flow::Redraw
                    }
                    None => Flow::Quit,
                },
                other => {
                    self.renderer
                        .error(&format!("Invalid choice '{}'. Enter 0-9.", other))?;
                    Flow::Continue
                }
            };

            match flow {
                Flow::Quit => break,
                Flow::Redraw => {}
                Flow::Continue => {
                    if self.pause_after_action
                        && self
                            .prompter
                            .read_line("\nPress Enter to continue...")?
                            .is_none()
                    {
                        break;
                    }
                }
            }
        }
        self.renderer.line("Goodbye!", Tone::Muted)?;
        Ok(())
    }

    fn list(&mut self, directory: &Path) -> Result<DirectoryListing> {
        let scanner = Scanner::new(&self.exclusions, &self.classifier);
        match scanner.scan(directory) {
            Ok(listing) => Ok(listing),
            Err(e) => {
                log::error!("Scan failed: {}", e);
                self.renderer.error(&e.to_string())?;
                Ok(DirectoryListing::default())
            }
        }
    }

    /// Text files of the listing plus everything below its directories.
    fn select_all_listed(&mut self, listing: &DirectoryListing) -> usize {
        let scanner = Scanner::new(&self.exclusions, &self.classifier);
        let mut added = self.selection.add_listing_text_files(listing);
        for directory in &listing.directories {
            added += self
                .selection
                .add_directory(&directory.absolute_path, &scanner);
        }
        added
    }

    fn select_individual(&mut self, listing: &DirectoryListing) -> Result<Flow> {
        if listing.is_empty() {
            self.renderer.info("No items to select")?;
            return Ok(Flow::Continue);
        }
        loop {
            self.renderer.selection_help()?;
            let Some(input) = self.prompter.read_line("\nSelection: ")? else {
                return Ok(Flow::Quit);
            };
            match input.trim().to_lowercase().as_str() {
                "" | "done" | "exit" | "quit" => return Ok(Flow::Continue),
                "all" => {
                    let added = self.select_all_listed(listing);
                    self.renderer.success(&format!("Selected {} files", added))?;
                }
                "text" => {
                    let added = self.selection.add_listing_text_files(listing);
                    self.renderer.success(&format!("Selected {} text files", added))?;
                }
                spec => match parse_selection_spec(spec, listing.len()) {
                    Ok(parsed) => {
                        for part in &parsed.out_of_range {
                            self.renderer.error(&format!("Invalid number: {}", part))?;
                        }
                        self.select_positions(listing, &parsed.positions)?;
                    }
                    Err(e) => self.renderer.error(&e.to_string())?,
                },
            }
        }
    }

    fn select_positions(&mut self, listing: &DirectoryListing, positions: &[usize]) -> Result<()> {
        let scanner = Scanner::new(&self.exclusions, &self.classifier);
        let mut added = 0;
        for &position in positions {
            let Some(entry) = listing.get(position) else {
                self.renderer
                    .error(&format!("Invalid number: {}", position))?;
                continue;
            };
            if entry.is_dir {
                let count = self
                    .selection
                    .add_directory(&entry.absolute_path, &scanner);
                added += count;
                self.renderer.success(&format!(
                    "Selected directory: {}/ ({} files)",
                    entry.name(),
                    count
                ))?;
            } else if !entry.is_text {
                self.renderer
                    .warning(&format!("Skipped (not text): {}", entry.name()))?;
            } else if self.selection.add_file(&entry.absolute_path, &self.classifier) {
                added += 1;
                self.renderer
                    .success(&format!("Selected: {}", entry.name()))?;
            } else {
                self.renderer
                    .info(&format!("Already selected: {}", entry.name()))?;
            }
        }
        if added > 0 {
            self.renderer
                .success(&format!("Total selected: {} files", added))?;
        } else {
            self.renderer.info("No new text files selected")?;
        }
        Ok(())
    }

    fn open_directory(&mut self, listing: &DirectoryListing) -> Result<Flow> {
        if listing.directories.is_empty() {
            self.renderer.info("No directories to open")?;
            return Ok(Flow::Continue);
        }
        self.renderer.line("Select directory to open:", Tone::Heading)?;
        // Directories come first in the listing, so these are also their
        // listing numbers.
        for (index, directory) in listing.directories.iter().enumerate() {
            let line = format!("  {}. {}/", index + 1, directory.name());
            self.renderer.line(&line, Tone::Plain)?;
        }

        let Some(input) = self
            .prompter
            .read_line("\nDirectory number (or Enter to cancel): ")?
        else {
            return Ok(Flow::Quit);
        };
        let input = input.trim();
        if input.is_empty() {
            return Ok(Flow::Redraw);
        }
        match input.parse::<usize>().ok().and_then(|n| listing.get(n)) {
            Some(entry) if entry.is_dir => {
                log::debug!("Entering {}", entry.absolute_path.display());
                self.dir_stack.push(entry.absolute_path.clone());
                Ok(Flow::Redraw)
            }
            _ => {
                self.renderer
                    .error("Invalid directory number or not a directory")?;
                Ok(Flow::Continue)
            }
        }
    }

    fn select_by_regex(&mut self, current: &Path, listing: &DirectoryListing) -> Result<Flow> {
        let Some(pattern) = self
            .prompter
            .read_line("Regex pattern to match file names: ")?
        else {
            return Ok(Flow::Quit);
        };
        let scanner = Scanner::new(&self.exclusions, &self.classifier);
        match self
            .selection
            .add_by_regex(&pattern, current, &listing.files, &scanner)
        {
            Ok(added) => self.renderer.success(&format!(
                "Selected {} files matching '{}'",
                added, pattern
            ))?,
            Err(e) => self.renderer.error(&e.to_string())?,
        }
        Ok(Flow::Continue)
    }

    fn manage_exclusions(&mut self) -> Result<Flow> {
        loop {
            self.renderer.blank()?;
            self.renderer.exclusions(&self.exclusions.sorted())?;
            self.renderer
                .line("  a) add  r) remove  c) clear  d) done", Tone::Muted)?;
            let Some(choice) = self.prompter.read_line("Choice: ")? else {
                return Ok(Flow::Quit);
            };
            match choice.trim().to_lowercase().as_str() {
                "" | "d" | "done" => return Ok(Flow::Continue),
                "a" | "add" => {
                    let Some(pattern) = self.prompter.read_line("Exclusion pattern: ")? else {
                        return Ok(Flow::Quit);
                    };
                    let pattern = pattern.trim();
                    if pattern.is_empty() {
                        continue;
                    }
                    if self.exclusions.add(pattern) {
                        self.renderer
                            .success(&format!("Added exclusion pattern: {}", pattern))?;
                    } else {
                        self.renderer
                            .info(&format!("Already excluded: {}", pattern))?;
                    }
                }
                "r" | "remove" => {
                    let Some(number) = self.prompter.read_line("Pattern number to remove: ")?
                    else {
                        return Ok(Flow::Quit);
                    };
                    let removed = number
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|position| self.exclusions.remove_at(position));
                    match removed {
                        Some(pattern) => self
                            .renderer
                            .success(&format!("Removed exclusion pattern: {}", pattern))?,
                        None => self.renderer.error("Invalid pattern number")?,
                    }
                }
                "c" | "clear" => {
                    match confirm(
                        self.prompter.as_mut(),
                        "Clear all exclusion patterns?",
                        false,
                    )? {
                        None => return Ok(Flow::Quit),
                        Some(true) => {
                            self.exclusions.clear();
                            self.renderer.success("Cleared all exclusion patterns")?;
                        }
                        Some(false) => self.renderer.info("Kept exclusion patterns")?,
                    }
                }
                other => self
                    .renderer
                    .error(&format!("Unknown choice '{}'. Use a, r, c or d.", other))?,
            }
        }
    }

    /// Writes the aggregate with the current directory as its base. The
    /// output name is resolved against the process working directory.
    fn generate_output(&mut self, current: &Path) -> Result<Flow> {
        if self.selection.is_empty() {
            self.renderer.error(&AppError::EmptySelection.to_string())?;
            return Ok(Flow::Continue);
        }
        let Some(name) =
            ask_with_default(self.prompter.as_mut(), "Output filename", &self.default_output)?
        else {
            return Ok(Flow::Quit);
        };
        let destination = PathBuf::from(shellexpand::tilde(&name).as_ref());

        match generate(current, &self.selection, &destination) {
            Ok(report) => self.renderer.report(&report)?,
            Err(e) => {
                self.renderer
                    .error(&format!("Failed to create normalized file: {}", e))?;
                return Ok(Flow::Continue);
            }
        }

        match confirm(self.prompter.as_mut(), "Exit after generation?", false)? {
            Some(false) => Ok(Flow::Continue),
            Some(true) | None => Ok(Flow::Quit),
        }
    }
}

/// Asks for the directory to browse until a usable one is given. `None`
/// when input ends first.
pub fn prompt_for_root(
    prompter: &mut dyn Prompter,
    renderer: &mut dyn Renderer,
) -> Result<Option<PathBuf>> {
    loop {
        let Some(answer) = ask_with_default(prompter, "Directory to normalize", ".")? else {
            return Ok(None);
        };
        match validate_root(&answer) {
            Ok(root) => return Ok(Some(root)),
            Err(
                e @ (AppError::PathNotFound(_)
                | AppError::NotADirectory(_)
                | AppError::PermissionDenied(_)),
            ) => renderer.error(&e.to_string())?,
            Err(e) => return Err(e).context("Failed to resolve directory"),
        }
    }
}
