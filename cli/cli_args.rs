use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigFileOpts {
    #[arg(
        long,
        global = true,
        help = "Path of the TOML config file (default: .normalizer/normalizer.toml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help_heading = "Configuration"
    )]
    pub config: Option<String>,

    #[arg(
        long,
        global = true,
        help = "Disable loading any TOML config file.",
        conflicts_with = "config",
        help_heading = "Configuration"
    )]
    pub no_config: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExclusionOpts {
    #[arg(
        short = 'x',
        long = "exclude",
        global = true,
        value_name = "PATTERN",
        help = "Add an exclusion pattern (name, relative path or wildcard). Repeatable.",
        help_heading = "Exclusions"
    )]
    pub exclude: Vec<String>,

    #[arg(
        long,
        global = true,
        help = "Start from an empty exclusion list instead of the built-in one.",
        help_heading = "Exclusions"
    )]
    pub no_default_excludes: bool,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Aggregate a codebase's text files into one annotated document.",
    long_about = "normalizer browses a directory, lets you pick files (by number, range, \nregex or whole directories) and writes them into a single file with a \nmanifest header, a tree summary and delimited per-file content blocks.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  normalizer\n  normalizer browse ~/projects/app\n  normalizer scan src --json\n  normalizer generate . --regex '^test_' -o tests.txt"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,

    #[arg(long, global = true, help = "Disable colored output.")]
    pub no_color: bool,

    #[clap(flatten)]
    pub config_file: ConfigFileOpts,

    #[clap(flatten)]
    pub exclusion: ExclusionOpts,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(
        visible_alias = "b",
        about = "Browse a directory interactively and build a selection (default)."
    )]
    Browse(BrowseArgs),

    #[command(
        visible_alias = "s",
        about = "List the selectable entries of one directory."
    )]
    Scan(ScanArgs),

    #[command(
        visible_alias = "g",
        visible_alias = "gen",
        about = "Select files non-interactively and write the aggregate."
    )]
    Generate(GenerateArgs),

    #[command(about = "Show or save the configuration file structure.")]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct BrowseArgs {
    #[arg(
        value_name = "PATH",
        help = "Directory to start in (prompted for when omitted)."
    )]
    pub path: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    #[arg(value_name = "PATH", default_value = ".", help = "Directory to list.")]
    pub path: String,

    #[arg(long, help = "Print the listing as JSON.")]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(
        value_name = "PATH",
        default_value = ".",
        help = "Base directory of the aggregate."
    )]
    pub path: String,

    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help = "Select a single file (relative to PATH). Repeatable.",
        help_heading = "Selection"
    )]
    pub files: Vec<PathBuf>,

    #[arg(
        short = 'd',
        long = "dir",
        value_name = "DIR",
        help = "Select every text file below a directory (relative to PATH). Repeatable.",
        help_heading = "Selection"
    )]
    pub dirs: Vec<PathBuf>,

    #[arg(
        short = 'r',
        long = "regex",
        value_name = "REGEX",
        help = "Select text files whose name matches (case-insensitive). Repeatable.",
        help_heading = "Selection"
    )]
    pub regexes: Vec<String>,

    #[arg(
        short = 'o',
        long,
        value_name = "OUTPUT",
        help = "Output file (default from config, else NormalizedFile.txt).",
        help_heading = "Output Control"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        long,
        help = "Save the default config to .normalizer/normalizer.toml (prompts overwrite)."
    )]
    pub save: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_collects_repeated_selectors() {
        let cli = Cli::parse_from([
            "normalizer", "-vv", "generate", "proj", "-f", "a.py", "--file", "b.py", "-r",
            "^test_", "-x", "*.lock", "-o", "out.txt",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.exclusion.exclude, vec!["*.lock".to_string()]);
        match cli.command {
            Some(Commands::Generate(args)) => {
                assert_eq!(args.path, "proj");
                assert_eq!(args.files, vec![PathBuf::from("a.py"), PathBuf::from("b.py")]);
                assert_eq!(args.regexes, vec!["^test_".to_string()]);
                assert_eq!(args.output, Some(PathBuf::from("out.txt")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn no_command_means_interactive() {
        let cli = Cli::parse_from(["normalizer", "--no-color"]);
        assert!(cli.no_color);
        assert!(cli.command.is_none());
    }
}
