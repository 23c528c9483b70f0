use crate::logging::LogOptions;

use super::super::{Cli, CliError, Command};
use super::common::{is_help_flag, parse_output_options, partition_inputs_and_flags};

pub(super) fn parse(args: Vec<String>) -> Result<Cli, CliError> {
    if args.first().is_some_and(|value| is_help_flag(value)) {
        return Ok(help_invocation());
    }
    let (inputs, rest) = partition_inputs_and_flags(args, "check requires <file> argument")?;
    if rest.iter().any(|value| is_help_flag(value)) {
        return Ok(help_invocation());
    }
    let (log_settings, error_format) = parse_output_options(rest.into_iter())?;
    Ok(Cli {
        command: Command::Check { inputs },
        log_options: log_settings.merged_with_env(),
        error_format,
    })
}

fn help_invocation() -> Cli {
    Cli {
        command: Command::Help {
            topic: Some("check".into()),
        },
        log_options: LogOptions::from_env(),
        error_format: None,
    }
}
