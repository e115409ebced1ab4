use anyhow::{Context, Result};
use log;
use normalizer_core::{Scanner, SelectionSet, validate_root};
use std::io;

use crate::cli_args::{Cli, ScanArgs};
use crate::config::Settings;
use crate::output::{make_renderer, write_json};

pub fn handle_scan_command(args: &ScanArgs, cli: &Cli) -> Result<()> {
    let directory =
        validate_root(&args.path).with_context(|| format!("Cannot scan '{}'", args.path))?;
    let settings = Settings::load(&directory, &cli.config_file, &cli.exclusion, cli.no_color)
        .context("Failed to load configuration")?;
    let rules = settings.exclusion_rules();
    let classifier = settings.classifier();

    let listing = Scanner::new(&rules, &classifier)
        .scan(&directory)
        .with_context(|| format!("Failed to list {}", directory.display()))?;
    log::debug!("Listing has {} entries", listing.len());

    if args.json {
        return write_json(&mut io::stdout(), &listing);
    }

    let mut renderer = make_renderer(Box::new(io::stdout()), settings.ui.plain, false);
    renderer.listing(&listing, &SelectionSet::new())?;
    if !cli.quiet {
        let text_files = listing.files.iter().filter(|f| f.is_text).count();
        renderer.info(&format!(
            "{} directories, {} files ({} text) in {}",
            listing.directories.len(),
            listing.files.len(),
            text_files,
            directory.display()
        ))?;
    }
    Ok(())
}
