use once_cell::sync::Lazy;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct BuiltinDefaults {
    #[serde(default)]
    pub exclusions: Vec<String>,
    #[serde(default)]
    pub text_extensions: Vec<String>,
}

static BUILTIN_DEFAULTS: Lazy<BuiltinDefaults> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/defaults.yaml"));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/defaults.yaml")
});

pub fn get_builtin_defaults() -> &'static BuiltinDefaults {
    &BUILTIN_DEFAULTS
}

pub fn default_exclusion_patterns() -> &'static [String] {
    &BUILTIN_DEFAULTS.exclusions
}

pub fn default_text_extensions() -> &'static [String] {
    &BUILTIN_DEFAULTS.text_extensions
}
