use anyhow::{Context, Result};
use colored::*;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL};
use normalizer_core::{DirectoryListing, FileEntry, GenerationReport, SelectionSet, format_size};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Heading,
    Info,
    Success,
    Warning,
    Error,
    Muted,
    Accent,
}

/// Everything the interactive session and the commands show on screen.
///
/// Implementors supply the sink, the styling of a single span and the
/// directory listing; every other view is composed from those.
pub trait Renderer {
    fn out(&mut self) -> &mut dyn Write;

    fn paint(&self, text: &str, tone: Tone) -> String;

    fn clears_screen(&self) -> bool {
        false
    }

    fn listing(&mut self, listing: &DirectoryListing, selection: &SelectionSet) -> io::Result<()>;

    fn clear(&mut self) -> io::Result<()> {
        if self.clears_screen() {
            clearscreen::clear().map_err(io::Error::other)?;
        }
        Ok(())
    }

    fn line(&mut self, text: &str, tone: Tone) -> io::Result<()> {
        let painted = self.paint(text, tone);
        writeln!(self.out(), "{}", painted)
    }

    fn blank(&mut self) -> io::Result<()> {
        writeln!(self.out())
    }

    fn info(&mut self, message: &str) -> io::Result<()> {
        let label = self.paint("Info:", Tone::Info);
        writeln!(self.out(), "{} {}", label, message)
    }

    fn success(&mut self, message: &str) -> io::Result<()> {
        let label = self.paint("Done:", Tone::Success);
        writeln!(self.out(), "{} {}", label, message)
    }

    fn warning(&mut self, message: &str) -> io::Result<()> {
        let label = self.paint("Warning:", Tone::Warning);
        writeln!(self.out(), "{} {}", label, message)
    }

    fn error(&mut self, message: &str) -> io::Result<()> {
        let label = self.paint("Error:", Tone::Error);
        writeln!(self.out(), "{} {}", label, message)
    }

    fn banner(&mut self) -> io::Result<()> {
        let rule = "=".repeat(60);
        self.line(&rule, Tone::Muted)?;
        self.line("CodeBase Normalizer", Tone::Heading)?;
        self.line("Aggregate a codebase into one annotated file", Tone::Muted)?;
        self.line(&rule, Tone::Muted)
    }

    fn status(&mut self, current: &Path, selected: usize) -> io::Result<()> {
        let location = self.paint(&current.display().to_string(), Tone::Accent);
        let count = self.paint(&selected.to_string(), Tone::Success);
        writeln!(self.out(), "Current: {}", location)?;
        writeln!(self.out(), "Selected files: {}", count)
    }

    fn menu(&mut self) -> io::Result<()> {
        self.blank()?;
        self.line("Options", Tone::Heading)?;
        for (key, label) in MENU_ITEMS {
            let key = self.paint(key, Tone::Accent);
            writeln!(self.out(), "  {}. {}", key, label)?;
        }
        Ok(())
    }

    fn selection_help(&mut self) -> io::Result<()> {
        self.blank()?;
        self.line("Selection help", Tone::Heading)?;
        self.line("  Numbers: 1,3,5 or ranges like 1-5", Tone::Muted)?;
        self.line("  'all'  select every text file and listed directory", Tone::Muted)?;
        self.line("  'text' select the listed text files only", Tone::Muted)?;
        self.line("  'done' or Enter to finish", Tone::Muted)
    }

    /// The current selection, sorted, with paths shown relative to `base`
    /// when possible.
    fn selection(&mut self, paths: &[PathBuf], base: &Path) -> io::Result<()> {
        if paths.is_empty() {
            return self.info("No files selected");
        }
        let heading = format!("Selected files ({})", paths.len());
        self.line(&heading, Tone::Heading)?;
        for (index, path) in paths.iter().enumerate() {
            let shown = pathdiff::diff_paths(path, base).unwrap_or_else(|| path.clone());
            let size = std::fs::metadata(path)
                .map(|m| format_size(m.len()))
                .unwrap_or_else(|_| "unknown".to_string());
            let size = self.paint(&size, Tone::Muted);
            writeln!(self.out(), "  {:>3}. {} ({})", index + 1, shown.display(), size)?;
        }
        Ok(())
    }

    fn exclusions(&mut self, patterns: &[&str]) -> io::Result<()> {
        let heading = format!("Exclusion patterns ({})", patterns.len());
        self.line(&heading, Tone::Heading)?;
        if patterns.is_empty() {
            return self.line("  (none)", Tone::Muted);
        }
        for (index, pattern) in patterns.iter().enumerate() {
            writeln!(self.out(), "  {:>3}. {}", index + 1, pattern)?;
        }
        Ok(())
    }

    fn report(&mut self, report: &GenerationReport) -> io::Result<()> {
        self.success(&format!(
            "Normalized file written: {}",
            report.output_path.display()
        ))?;
        writeln!(self.out(), "  Processed: {} files", report.success_count)?;
        if report.failure_count > 0 {
            let failed = self.paint(
                &format!("  Failed: {} files", report.failure_count),
                Tone::Warning,
            );
            writeln!(self.out(), "{}", failed)?;
        }
        Ok(())
    }
}

pub const MENU_ITEMS: [(&str, &str); 10] = [
    ("1", "Select individual files/directories"),
    ("2", "Select all text files here"),
    ("3", "Select everything here (recursive)"),
    ("4", "Open a directory"),
    ("5", "Select by regex"),
    ("6", "Clear selection"),
    ("7", "Show selection"),
    ("8", "Manage exclusions"),
    ("9", "Generate normalized file"),
    ("0", "Back / Exit"),
];

fn kind_label(entry: &FileEntry) -> &'static str {
    if entry.is_dir {
        "dir"
    } else if entry.is_text {
        "text"
    } else {
        "binary"
    }
}

fn size_label(entry: &FileEntry) -> String {
    if entry.is_dir {
        "-".to_string()
    } else {
        format_size(entry.size_bytes)
    }
}

/// Uncolored output with a fixed-width column layout.
pub struct PlainRenderer {
    out: Box<dyn Write>,
    clear_screen: bool,
}

impl PlainRenderer {
    pub fn new(out: Box<dyn Write>, clear_screen: bool) -> Self {
        Self { out, clear_screen }
    }
}

impl Renderer for PlainRenderer {
    fn out(&mut self) -> &mut dyn Write {
        self.out.as_mut()
    }

    fn paint(&self, text: &str, _tone: Tone) -> String {
        text.to_string()
    }

    fn clears_screen(&self) -> bool {
        self.clear_screen
    }

    fn listing(&mut self, listing: &DirectoryListing, selection: &SelectionSet) -> io::Result<()> {
        self.blank()?;
        if listing.is_empty() {
            return self.info("Directory is empty (or everything is excluded)");
        }
        for (index, entry) in listing.entries().enumerate() {
            let marker = if !entry.is_dir && selection.contains(&entry.absolute_path) {
                "*"
            } else {
                " "
            };
            let name = if entry.is_dir {
                format!("{}/", entry.name())
            } else {
                entry.name()
            };
            writeln!(
                self.out,
                "{:>4}. [{}] {:<40} {:<6} {:>10}  {}",
                index + 1,
                marker,
                name,
                kind_label(entry),
                size_label(entry),
                entry.mime_type.as_deref().unwrap_or("")
            )?;
        }
        Ok(())
    }
}

/// Colored output with table listings.
pub struct StyledRenderer {
    out: Box<dyn Write>,
    clear_screen: bool,
}

impl StyledRenderer {
    pub fn new(out: Box<dyn Write>, clear_screen: bool) -> Self {
        Self { out, clear_screen }
    }
}

impl Renderer for StyledRenderer {
    fn out(&mut self) -> &mut dyn Write {
        self.out.as_mut()
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        match tone {
            Tone::Plain => text.normal(),
            Tone::Heading => text.green().bold().underline(),
            Tone::Info => text.blue().bold(),
            Tone::Success => text.green().bold(),
            Tone::Warning => text.yellow().bold(),
            Tone::Error => text.red().bold(),
            Tone::Muted => text.dimmed(),
            Tone::Accent => text.cyan(),
        }
        .to_string()
    }

    fn clears_screen(&self) -> bool {
        self.clear_screen
    }

    fn listing(&mut self, listing: &DirectoryListing, selection: &SelectionSet) -> io::Result<()> {
        if listing.is_empty() {
            self.blank()?;
            return self.info("Directory is empty (or everything is excluded)");
        }
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("#").fg(Color::Green),
            Cell::new("Name").fg(Color::Green),
            Cell::new("Type").fg(Color::Green),
            Cell::new("Size").fg(Color::Green),
            Cell::new("MIME").fg(Color::Green),
            Cell::new("Selected").fg(Color::Green),
        ]);
        for (index, entry) in listing.entries().enumerate() {
            let (name, name_color) = if entry.is_dir {
                (format!("{}/", entry.name()), Color::Blue)
            } else if entry.is_text {
                (entry.name(), Color::Cyan)
            } else {
                (entry.name(), Color::DarkGrey)
            };
            let selected = !entry.is_dir && selection.contains(&entry.absolute_path);
            table.add_row(vec![
                Cell::new(index + 1).set_alignment(CellAlignment::Right),
                Cell::new(name).fg(name_color),
                Cell::new(kind_label(entry)),
                Cell::new(size_label(entry))
                    .set_alignment(CellAlignment::Right)
                    .fg(Color::DarkGrey),
                Cell::new(entry.mime_type.as_deref().unwrap_or("")).fg(Color::DarkGrey),
                Cell::new(if selected { "yes" } else { "" }).fg(Color::Green),
            ]);
        }
        writeln!(self.out, "{table}")
    }
}

/// Writes `data` as pretty JSON followed by a newline.
pub fn write_json<T: Serialize>(out: &mut dyn Write, data: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    out.write_all(content.as_bytes())
        .context("Failed to write JSON output")?;
    if !content.ends_with('\n') {
        out.write_all(b"\n").context("Failed to write newline")?;
    }
    out.flush().context("Failed to flush output")?;
    Ok(())
}

/// Picks the renderer for the effective UI settings.
pub fn make_renderer(out: Box<dyn Write>, plain: bool, clear_screen: bool) -> Box<dyn Renderer> {
    if plain {
        Box::new(PlainRenderer::new(out, clear_screen))
    } else {
        Box::new(StyledRenderer::new(out, clear_screen))
    }
}
