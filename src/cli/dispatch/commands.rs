use std::path::PathBuf;

use crate::cli::{Cli, CliError, Command};
use crate::diagnostics::FormatOptions;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::{lsp, version};

use super::logging::format_input_list;
use super::reporting::print_report_diagnostics;

pub(super) fn dispatch_command(
    driver: &Driver,
    command: Command,
    format_options: FormatOptions,
) -> Result<()> {
    match command {
        Command::Check { inputs } => run_check(driver, &inputs, format_options),
        Command::Lsp => lsp::run_stdio(driver),
        Command::Help { topic } => run_help(topic.as_deref()),
        Command::Version => {
            println!("{}", version::formatted());
            Ok(())
        }
    }
}

fn run_check(driver: &Driver, inputs: &[PathBuf], format_options: FormatOptions) -> Result<()> {
    let report = driver.check(inputs)?;
    if report.has_diagnostics() {
        println!("check completed with diagnostics:");
        print_report_diagnostics(&report, format_options);
        if report.has_errors() {
            return Err(Error::Cli(CliError::new("diagnostics reported; see above")));
        }
    } else {
        println!("check passed for {}", format_input_list(inputs));
    }
    Ok(())
}

fn run_help(topic: Option<&str>) -> Result<()> {
    match topic {
        Some(topic) => {
            let rendered = Cli::help_for(topic)?;
            println!("{rendered}");
        }
        None => println!("{}", Cli::usage()),
    }
    Ok(())
}
