use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Command;
use crate::logging::{LogFormat, LogOptions};

pub(super) fn init_logging(options: &LogOptions) {
    use std::io::IsTerminal;
    use std::sync::OnceLock;
    use tracing_subscriber::{EnvFilter, fmt};

    static INITIALISED: OnceLock<()> = OnceLock::new();

    let _ = INITIALISED.get_or_init(|| {
        let use_ansi = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        let level = options.level.as_tracing_level();
        let make_filter = || {
            let directive = options.level.to_string();
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
        };

        match options.format {
            LogFormat::Json => {
                let subscriber = fmt::fmt()
                    .with_env_filter(make_filter())
                    .with_max_level(level)
                    .with_ansi(use_ansi)
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .json()
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
            }
            _ => {
                let subscriber = fmt::fmt()
                    .with_env_filter(make_filter())
                    .with_max_level(level)
                    .with_ansi(use_ansi)
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .compact()
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
            }
        }
    });
}

pub(super) fn log_run_start(command: &Command, options: &LogOptions) {
    match command {
        Command::Check { inputs } => {
            tracing::info!(
                target: "pipeline",
                stage = "cli.run.start",
                command = "check",
                status = "start",
                log_level = %options.level,
                log_format = %options.format,
                input_count = inputs.len(),
                inputs = %format_input_list(inputs),
            );
        }
        other => {
            tracing::info!(
                target: "pipeline",
                stage = "cli.run.start",
                command = command_name(other),
                status = "start",
                log_level = %options.level,
                log_format = %options.format,
            );
        }
    }
}

pub(super) fn log_run_complete(
    command: &Command,
    elapsed: Duration,
    result: &crate::error::Result<()>,
) {
    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    match result {
        Ok(()) => {
            tracing::info!(
                target: "pipeline",
                stage = "cli.run.footer",
                command = command_name(command),
                status = "ok",
                elapsed_ms,
            );
        }
        Err(err) => {
            tracing::error!(
                target: "pipeline",
                stage = "cli.run.footer",
                command = command_name(command),
                status = "error",
                elapsed_ms,
                error = %err,
            );
        }
    }
}

pub(super) fn format_input_list(inputs: &[PathBuf]) -> String {
    match inputs {
        [] => "<none>".into(),
        [only] => only.display().to_string(),
        many => many
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Check { .. } => "check",
        Command::Lsp => "lsp",
        Command::Help { .. } => "help",
        Command::Version => "version",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_input_list_renders_expected_summaries() {
        assert_eq!(format_input_list(&[]), "<none>");
        assert_eq!(format_input_list(&[PathBuf::from("one.ql")]), "one.ql");
        assert_eq!(
            format_input_list(&[PathBuf::from("one.ql"), PathBuf::from("two.ql")]),
            "one.ql, two.ql"
        );
    }

    #[test]
    fn command_names_cover_every_variant() {
        assert_eq!(command_name(&Command::Check { inputs: vec![] }), "check");
        assert_eq!(command_name(&Command::Lsp), "lsp");
        assert_eq!(command_name(&Command::Help { topic: None }), "help");
        assert_eq!(command_name(&Command::Version), "version");
    }
}
