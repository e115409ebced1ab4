mod cli_args;
mod commands;
mod config;
mod output;
mod prompt;
mod session;

use anyhow::Result;
use clap::Parser;
use colored::*;
use log;
use std::process;

use cli_args::{BrowseArgs, Cli, Commands};
use normalizer_core::AppError;

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);
    if cli_args.no_color {
        colored::control::set_override(false);
    }

    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(&cli_args) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = exit_code_for(&e);

            // Invalid input is always reported, even when quiet.
            if !quiet || exit_code == 1 || exit_code == 5 {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }

            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn exit_code_for(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<AppError>() {
        Some(AppError::PathNotFound(_)) => 5,
        Some(AppError::NotADirectory(_)) => 5,
        Some(AppError::InvalidPattern { .. }) => 5,
        Some(AppError::InvalidSelectionSyntax(_)) => 5,
        Some(AppError::EmptySelection) => 5,
        Some(AppError::PermissionDenied(_)) => 2,
        Some(AppError::FileRead { .. }) => 2,
        Some(AppError::DestinationWrite { .. }) => 2,
        Some(AppError::Io(_)) => 2,
        Some(AppError::WalkDir(_)) => 2,
        Some(AppError::Glob(_)) => 2,
        Some(AppError::DataLoading(_)) => 1,
        Some(_) => 1,
        // Config problems and other anyhow errors
        None => 1,
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: &Cli) -> Result<()> {
    match &cli.command {
        None => {
            log::debug!("No command given, starting interactive browse...");
            commands::browse::handle_browse_command(&BrowseArgs::default(), cli)?;
        }
        Some(Commands::Browse(args)) => {
            log::debug!("Executing 'browse' command...");
            commands::browse::handle_browse_command(args, cli)?;
        }
        Some(Commands::Scan(args)) => {
            log::debug!("Executing 'scan' command...");
            commands::scan::handle_scan_command(args, cli)?;
        }
        Some(Commands::Generate(args)) => {
            log::debug!("Executing 'generate' command...");
            commands::generate::handle_generate_command(args, cli)?;
        }
        Some(Commands::Config(args)) => {
            log::debug!("Executing 'config' command...");
            commands::config::handle_config_command(args, cli)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::path::PathBuf;

    #[test]
    fn exit_codes_follow_error_kind() {
        let invalid: Result<()> = Err(AppError::EmptySelection).context("Failed to generate");
        assert_eq!(exit_code_for(&invalid.unwrap_err()), 5);

        let io = anyhow::Error::new(AppError::DestinationWrite {
            path: PathBuf::from("out.txt"),
            source: std::io::Error::other("disk full"),
        });
        assert_eq!(exit_code_for(&io), 2);

        assert_eq!(exit_code_for(&anyhow::anyhow!("bad config")), 1);
    }
}
