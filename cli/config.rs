use anyhow::{Context, Result, bail};
use log;
use normalizer_core::{DEFAULT_OUTPUT_NAME, ExclusionRules, TextClassifier};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli_args::{ConfigFileOpts, ExclusionOpts};

pub const PROJECT_CONFIG_DIR: &str = ".normalizer";
pub const USER_CONFIG_DIR: &str = "normalizer";
pub const CONFIG_FILENAME: &str = "normalizer.toml";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub exclusions: ExclusionSettings,
    #[serde(default)]
    pub classification: ClassificationSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExclusionSettings {
    #[serde(default = "default_true")]
    pub use_defaults: bool,
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ClassificationSettings {
    #[serde(default)]
    pub extra_text_extensions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputSettings {
    #[serde(default = "default_output_name")]
    pub default_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UiSettings {
    #[serde(default = "default_false")]
    pub plain: bool,
    #[serde(default = "default_true")]
    pub clear_screen: bool,
}

impl Default for ExclusionSettings {
    fn default() -> Self {
        Self {
            use_defaults: default_true(),
            add: Vec::new(),
            remove: Vec::new(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            default_name: default_output_name(),
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            plain: default_false(),
            clear_screen: default_true(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_output_name() -> String {
    DEFAULT_OUTPUT_NAME.to_string()
}

impl Settings {
    /// Finds the config file to load: an explicit `--config` path, else the
    /// project file under `project_root`, else the per-user file.
    pub fn resolve_path(project_root: &Path, opts: &ConfigFileOpts) -> Result<Option<PathBuf>> {
        if opts.no_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        if let Some(p_str) = &opts.config {
            let path = PathBuf::from(shellexpand::tilde(p_str).as_ref());
            if !path.is_file() {
                bail!("Specified config file not found at path: {}", path.display());
            }
            log::debug!("Using specified config file path: {}", path.display());
            return Ok(Some(path));
        }

        let project_path = project_config_path(project_root);
        if project_path.is_file() {
            log::debug!("Using project config file: {}", project_path.display());
            return Ok(Some(project_path));
        }
        if let Some(user_path) = user_config_path().filter(|p| p.is_file()) {
            log::debug!("Using user config file: {}", user_path.display());
            return Ok(Some(user_path));
        }
        log::debug!(
            "No config file specified and none found at: {}",
            project_path.display()
        );
        Ok(None)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        toml::from_str::<Settings>(&toml_content).with_context(|| {
            format!(
                "Error parsing config file '{}'. Check TOML syntax and structure.",
                config_path.display()
            )
        })
    }

    /// Effective settings for a run: file (if any) plus command-line overrides.
    pub fn load(
        project_root: &Path,
        file_opts: &ConfigFileOpts,
        exclusion_opts: &ExclusionOpts,
        no_color: bool,
    ) -> Result<Self> {
        let mut settings = match Self::resolve_path(project_root, file_opts)? {
            Some(path) => Self::load_from_path(&path)?,
            None => Self::default(),
        };
        settings.apply_overrides(exclusion_opts, no_color);
        log::trace!("Effective settings: {:?}", settings);
        Ok(settings)
    }

    pub fn apply_overrides(&mut self, exclusion_opts: &ExclusionOpts, no_color: bool) {
        if exclusion_opts.no_default_excludes {
            self.exclusions.use_defaults = false;
        }
        self.exclusions
            .add
            .extend(exclusion_opts.exclude.iter().cloned());
        if no_color {
            self.ui.plain = true;
        }
    }

    pub fn exclusion_rules(&self) -> ExclusionRules {
        let mut rules = if self.exclusions.use_defaults {
            ExclusionRules::with_defaults()
        } else {
            ExclusionRules::new()
        };
        for pattern in &self.exclusions.add {
            rules.add(pattern);
        }
        for pattern in &self.exclusions.remove {
            if !rules.remove(pattern) {
                log::warn!("Exclusion '{}' listed for removal is not active", pattern);
            }
        }
        rules
    }

    pub fn classifier(&self) -> TextClassifier {
        TextClassifier::new().with_extra_extensions(&self.classification.extra_text_extensions)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize settings to TOML")
    }
}

pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_CONFIG_DIR).join(CONFIG_FILENAME)
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(USER_CONFIG_DIR).join(CONFIG_FILENAME))
}
