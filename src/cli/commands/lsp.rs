use crate::logging::LogOptions;

use super::super::{Cli, CliError, Command};
use super::common::{is_help_flag, parse_output_options};

pub(super) fn parse(args: Vec<String>) -> Result<Cli, CliError> {
    if args.iter().any(|value| is_help_flag(value)) {
        return Ok(Cli {
            command: Command::Help {
                topic: Some("lsp".into()),
            },
            log_options: LogOptions::from_env(),
            error_format: None,
        });
    }
    // The server only takes logging flags; everything else arrives over the
    // protocol.
    let (log_settings, error_format) = parse_output_options(args.into_iter())?;
    if error_format.is_some() {
        return Err(CliError::with_usage(
            "lsp does not accept --error-format; diagnostics are published over the protocol",
        ));
    }
    Ok(Cli {
        command: Command::Lsp,
        log_options: log_settings.merged_with_env(),
        error_format: None,
    })
}
