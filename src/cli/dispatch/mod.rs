use std::io::IsTerminal;
use std::time::Instant;

use crate::cli::Cli;
use crate::cli::commands::common::parse_error_format;
use crate::diagnostics::{ColorMode, ErrorFormat, FormatOptions};
use crate::driver::Driver;
use crate::error::{Error, Result};

mod commands;
mod logging;
mod reporting;
#[cfg(test)]
mod tests;

/// Execute a parsed CLI command. Logging and diagnostics reporting are
/// configured here so the binary entrypoint can stay thin.
pub fn run(driver: &Driver, cli: Cli) -> Result<()> {
    let log_options = cli.log_options.resolved();
    logging::init_logging(&log_options);
    let is_terminal = std::io::stderr().is_terminal();
    let env_error_format = std::env::var("QUILL_ERROR_FORMAT")
        .ok()
        .and_then(|value| parse_error_format(&value).ok());
    let default_format = env_error_format.unwrap_or_else(|| {
        if is_terminal {
            ErrorFormat::Human
        } else {
            ErrorFormat::Short
        }
    });
    let color_choice = if std::env::var_os("NO_COLOR").is_some() {
        ColorMode::Never
    } else {
        ColorMode::Auto
    };
    let format_options = FormatOptions {
        format: cli.error_format.unwrap_or(default_format),
        color: color_choice,
        is_terminal,
    };
    let command_for_logging = cli.command.clone();
    let start = Instant::now();
    logging::log_run_start(&command_for_logging, &log_options);
    let result = commands::dispatch_command(driver, cli.command, format_options);
    logging::log_run_complete(&command_for_logging, start.elapsed(), &result);
    result
}

pub fn report_error(err: &Error) {
    reporting::report_error(err);
}
