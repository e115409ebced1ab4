use anyhow::{Context, Result, bail};
use colored::*;
use log;
use std::env;
use std::fs;
use std::path::Path;

use crate::cli_args::{Cli, ConfigArgs};
use crate::config::{Settings, project_config_path};
use crate::prompt::{StdinPrompter, confirm};

pub fn handle_config_command(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    let project_root = env::current_dir().context("Failed to determine current directory")?;

    if !args.save {
        let settings = Settings::load(&project_root, &cli.config_file, &cli.exclusion, cli.no_color)
            .context("Failed to load configuration")?;
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    let save_path = project_config_path(&project_root);
    if save_path.exists() {
        if cli.quiet {
            bail!(
                "Config file '{}' exists. Overwrite prevented in quiet mode.",
                save_path.display()
            );
        }
        let mut prompter = StdinPrompter::new(!cli.no_color);
        let question = format!(
            "Config file already exists at '{}'. Overwrite?",
            save_path.display()
        );
        if confirm(&mut prompter, &question, false)? != Some(true) {
            println!("Save cancelled.");
            return Ok(());
        }
    }

    save_default_config(&save_path)?;
    if !cli.quiet {
        println!(
            "{} Default config saved to: {}",
            "Done:".green().bold(),
            save_path.display().to_string().blue()
        );
    }
    Ok(())
}

pub fn save_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let content = Settings::default().to_toml()?;
    fs::write(path, content).with_context(|| format!("Failed to write file {}", path.display()))?;
    log::info!("Wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn saved_default_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = project_config_path(dir.path());
        save_default_config(&path).unwrap();
        assert_eq!(Settings::load_from_path(&path).unwrap(), Settings::default());
    }
}
