use anyhow::{Context, Result};
use log;
use normalizer_core::validate_root;
use std::env;
use std::io;

use crate::cli_args::{BrowseArgs, Cli};
use crate::config::Settings;
use crate::output::make_renderer;
use crate::prompt::StdinPrompter;
use crate::session::{Session, prompt_for_root};

pub fn handle_browse_command(args: &BrowseArgs, cli: &Cli) -> Result<()> {
    let given_root = match &args.path {
        Some(path) => Some(
            validate_root(path).with_context(|| format!("Cannot browse '{}'", path))?,
        ),
        None => None,
    };
    let config_root = match &given_root {
        Some(root) => root.clone(),
        None => env::current_dir().context("Failed to determine current directory")?,
    };
    let settings = Settings::load(&config_root, &cli.config_file, &cli.exclusion, cli.no_color)
        .context("Failed to load configuration")?;
    if settings.ui.plain {
        colored::control::set_override(false);
    }

    let mut renderer = make_renderer(
        Box::new(io::stdout()),
        settings.ui.plain,
        settings.ui.clear_screen,
    );
    let mut prompter = StdinPrompter::new(!settings.ui.plain);
    renderer.banner()?;

    let root = match given_root {
        Some(root) => root,
        None => match prompt_for_root(&mut prompter, renderer.as_mut())? {
            Some(root) => root,
            None => {
                log::debug!("Input closed before a directory was chosen");
                return Ok(());
            }
        },
    };
    renderer.success(&format!("Selected directory: {}", root.display()))?;

    let mut session = Session::new(root, &settings, renderer, Box::new(prompter));
    session.run()
}
