use std::path::PathBuf;

use crate::diagnostics::ErrorFormat;
use crate::logging::{LogFormat, LogLevel, LogSettings};

use super::super::CliError;

pub(crate) fn is_help_flag(value: &str) -> bool {
    matches!(value, "-h" | "--help")
}

pub(crate) fn partition_inputs_and_flags(
    args: Vec<String>,
    missing_message: &str,
) -> Result<(Vec<PathBuf>, Vec<String>), CliError> {
    if args.is_empty() {
        return Err(CliError::with_usage(missing_message));
    }

    let mut inputs = Vec::new();
    let mut index = 0;
    while index < args.len() {
        let value = &args[index];
        if value.starts_with('-') {
            break;
        }
        if value.trim().is_empty() {
            return Err(CliError::with_usage("input path must not be empty"));
        }
        inputs.push(PathBuf::from(value));
        index += 1;
    }

    if inputs.is_empty() {
        return Err(CliError::with_usage(missing_message));
    }

    let rest = args.into_iter().skip(index).collect();
    Ok((inputs, rest))
}

/// Parse the output-shaping flags shared by checking commands: log format,
/// log level, and diagnostic format.
pub(crate) fn parse_output_options<I, T>(
    args: I,
) -> Result<(LogSettings, Option<ErrorFormat>), CliError>
where
    I: Iterator<Item = T>,
    T: Into<String>,
{
    let iter = args.map(Into::into).collect::<Vec<_>>();
    let mut idx = 0;
    let mut log_settings = LogSettings::default();
    let mut error_format = None;

    while idx < iter.len() {
        let flag = &iter[idx];
        idx += 1;
        match flag.as_str() {
            "--log-format" => {
                let Some(value) = iter.get(idx) else {
                    return Err(CliError::with_usage("expected value after --log-format"));
                };
                idx += 1;
                let Some(format) = LogFormat::parse(value) else {
                    return Err(CliError::with_usage(format!(
                        "invalid log format '{value}'; supported values: auto, text, json"
                    )));
                };
                log_settings.apply_format(format);
            }
            "--log-level" => {
                let Some(value) = iter.get(idx) else {
                    return Err(CliError::with_usage("expected value after --log-level"));
                };
                idx += 1;
                let Some(level) = LogLevel::parse(value) else {
                    return Err(CliError::with_usage(format!(
                        "invalid log level '{value}'; supported values: error, warn, info, debug, trace"
                    )));
                };
                log_settings.apply_level(level);
            }
            "--error-format" => {
                let Some(value) = iter.get(idx) else {
                    return Err(CliError::with_usage("expected value after --error-format"));
                };
                idx += 1;
                error_format = Some(parse_error_format(value)?);
            }
            other => {
                return Err(CliError::with_usage(format!(
                    "unsupported option '{other}' for command"
                )));
            }
        }
    }

    Ok((log_settings, error_format))
}

pub(crate) fn parse_error_format(spec: &str) -> Result<ErrorFormat, CliError> {
    let value = spec.trim().to_ascii_lowercase();
    let format = match value.as_str() {
        "human" => ErrorFormat::Human,
        "json" => ErrorFormat::Json,
        "short" => ErrorFormat::Short,
        _ => {
            return Err(CliError::with_usage(format!(
                "invalid --error-format '{spec}'; supported values: human, json, short"
            )));
        }
    };
    Ok(format)
}
