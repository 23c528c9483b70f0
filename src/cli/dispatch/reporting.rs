use std::io::{self, Write};

use crate::diagnostics::{ColorMode, ErrorFormat, FormatOptions, format_diagnostics};
use crate::driver::CheckReport;
use crate::error::Error;

pub(super) fn report_error(err: &Error) {
    let mut out = io::stderr();
    if let Err(io_err) = report_error_to(err, &mut out) {
        let _ = writeln!(io::stderr(), "failed to report error: {io_err}");
    }
}

pub(super) fn report_error_to(err: &Error, out: &mut dyn Write) -> io::Result<()> {
    match err {
        Error::Parse(parse_err) => {
            writeln!(out, "error: {parse_err}")?;
            let rendered = format_diagnostics(
                parse_err.diagnostics(),
                parse_err.files(),
                FormatOptions {
                    format: ErrorFormat::Human,
                    color: ColorMode::Never,
                    is_terminal: false,
                },
            );
            writeln!(out, "{rendered}")?;
        }
        _ => {
            writeln!(out, "{err}")?;
            if cfg!(debug_assertions) {
                if let Some(backtrace) = err.backtrace() {
                    writeln!(out, "stack trace:")?;
                    writeln!(out, "{backtrace}")?;
                }
            }
        }
    }
    Ok(())
}

pub(super) fn print_report_diagnostics(report: &CheckReport, options: FormatOptions) {
    let mut out: Box<dyn Write> = match options.format {
        ErrorFormat::Json => Box::new(io::stdout()),
        _ if report.has_errors() => Box::new(io::stderr()),
        _ => Box::new(io::stdout()),
    };
    if let Err(err) = print_report_diagnostics_to(report, options, &mut out) {
        let _ = writeln!(io::stderr(), "failed to write diagnostics: {err}");
    }
}

pub(super) fn print_report_diagnostics_to(
    report: &CheckReport,
    options: FormatOptions,
    out: &mut dyn Write,
) -> io::Result<()> {
    if report.diagnostics.is_empty() {
        return Ok(());
    }
    let rendered = format_diagnostics(&report.diagnostics, &report.files, options);
    writeln!(out, "{rendered}")
}
