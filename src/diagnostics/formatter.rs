use serde::Serialize;

use super::{Diagnostic, DiagnosticCode, FileCache, LineCol, Severity, Span};

pub const JSON_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorFormat {
    Human,
    Json,
    Short,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatOptions {
    pub format: ErrorFormat,
    pub color: ColorMode,
    pub is_terminal: bool,
}

impl FormatOptions {
    #[must_use]
    pub fn use_color(self) -> bool {
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => self.is_terminal,
        }
    }
}

/// Render a collection of diagnostics to a single string.
#[must_use]
pub fn format_diagnostics(
    diagnostics: &[Diagnostic],
    files: &FileCache,
    options: FormatOptions,
) -> String {
    let mut rendered = String::new();
    let use_color = options.use_color();
    for (index, diagnostic) in diagnostics.iter().enumerate() {
        if index > 0 {
            rendered.push('\n');
        }
        let chunk = match options.format {
            ErrorFormat::Human => render_human(diagnostic, files, use_color),
            ErrorFormat::Short => render_short(diagnostic, files),
            ErrorFormat::Json => render_json(diagnostic, files),
        };
        rendered.push_str(&chunk);
    }
    rendered
}

fn render_human(diagnostic: &Diagnostic, files: &FileCache, color: bool) -> String {
    let mut out = String::new();
    let (path, location) = locate_primary(diagnostic, files);
    out.push_str(&format_header(diagnostic, color));
    out.push('\n');
    out.push_str(&format_location_arrow(&path, location.as_ref()));
    let mut snippets = Vec::new();
    if let Some(label) = diagnostic.primary_label.as_ref() {
        snippets.push(render_snippet(
            label.span,
            &label.message,
            diagnostic.severity,
            files,
            color,
        ));
    }
    for label in &diagnostic.secondary_labels {
        snippets.push(render_snippet(
            label.span,
            &label.message,
            diagnostic.severity,
            files,
            color,
        ));
    }
    snippets.retain(|snippet| !snippet.is_empty());
    out.push_str(&snippets.join("\n"));
    for note in &diagnostic.notes {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!("note: {note}"));
    }
    out
}

fn render_short(diagnostic: &Diagnostic, files: &FileCache) -> String {
    let (path, location) = locate_primary(diagnostic, files);
    let (line, column) = location.map_or_else(
        || ("?".into(), "?".into()),
        |loc| (loc.line.to_string(), loc.column.to_string()),
    );
    let mut out = format!(
        "{path}:{line}:{column}: {}[{}]: {}",
        diagnostic.severity.as_str(),
        diagnostic.code_str(),
        diagnostic.message
    );
    if !diagnostic.notes.is_empty() {
        out.push_str(&format!(" (notes: {})", diagnostic.notes.len()));
    }
    out
}

fn render_json(diagnostic: &Diagnostic, files: &FileCache) -> String {
    let primary_span = diagnostic
        .primary_label
        .as_ref()
        .and_then(|label| JsonSpan::from_span(label.span, files));
    let mut labels = Vec::new();
    if let Some(label) = diagnostic.primary_label.as_ref() {
        labels.push(JsonLabel::from_label(label, files));
    }
    for label in &diagnostic.secondary_labels {
        labels.push(JsonLabel::from_label(label, files));
    }

    let payload = JsonDiagnostic {
        version: JSON_SCHEMA_VERSION.to_string(),
        severity: diagnostic.severity.as_str().to_string(),
        code: diagnostic.code.clone(),
        message: diagnostic.message.clone(),
        primary_span,
        labels,
        notes: diagnostic.notes.clone(),
    };
    serde_json::to_string(&payload).unwrap_or_else(|_| "{}".into())
}

fn format_header(diagnostic: &Diagnostic, color: bool) -> String {
    let severity = diagnostic.severity.as_str();
    let prefix = if color {
        colorize(severity, severity_color(diagnostic.severity))
    } else {
        severity.to_string()
    };
    format!("{prefix}[{}]: {}", diagnostic.code_str(), diagnostic.message)
}

fn format_location_arrow(path: &str, loc: Option<&LineCol>) -> String {
    match loc {
        Some(loc) => format!("  --> {path}:{}:{}\n   |\n", loc.line, loc.column),
        None => format!("  --> {path}:?:?\n   |\n"),
    }
}

fn render_snippet(
    span: Span,
    message: &str,
    severity: Severity,
    files: &FileCache,
    color: bool,
) -> String {
    let mut out = String::new();
    let Some(file) = files.get(span.file_id) else {
        return out;
    };
    let Some(loc) = file.line_col(span.start) else {
        return out;
    };
    let Some(line) = file.line(loc.line) else {
        return out;
    };
    let (line_start, _) = file
        .line_bounds(loc.line)
        .unwrap_or((span.start.saturating_sub(loc.column), span.end));
    let display_line = line.trim_end_matches('\n');
    let rel_start = span
        .start
        .saturating_sub(line_start)
        .min(display_line.len());
    let rel_end = span
        .end
        .saturating_sub(line_start)
        .clamp(rel_start, display_line.len());
    let column = char_column(display_line, rel_start);
    let caret_count = char_width(display_line, rel_start, rel_end);
    out.push_str(&format!("{:>4} | {display_line}\n", loc.line));
    let mut caret_line = format!(
        "{:>4} | {}{}",
        "",
        " ".repeat(column.saturating_sub(1)),
        "^".repeat(caret_count),
    );
    if !message.is_empty() {
        caret_line.push(' ');
        caret_line.push_str(message);
    }
    if color {
        out.push_str(&caret_line.replace('^', &colorize("^", severity_color(severity))));
    } else {
        out.push_str(&caret_line);
    }
    out
}

fn locate_primary(diagnostic: &Diagnostic, files: &FileCache) -> (String, Option<LineCol>) {
    if let Some(label) = diagnostic.primary_label.as_ref() {
        if let Some(file) = files.get(label.span.file_id) {
            let loc = file.line_col(label.span.start).and_then(|lc| {
                let (line_start, _) = file.line_bounds(lc.line)?;
                let display_line = file.line(lc.line)?.trim_end_matches('\n');
                let rel_start = label
                    .span
                    .start
                    .saturating_sub(line_start)
                    .min(display_line.len());
                Some(LineCol {
                    line: lc.line,
                    column: char_column(display_line, rel_start),
                })
            });
            return (file.path.display().to_string(), loc);
        }
    }
    ("<unknown>".into(), None)
}

/// 1-based display column for a byte offset into a single line.
fn char_column(line: &str, byte_offset: usize) -> usize {
    line.get(..byte_offset)
        .map_or(byte_offset, |prefix| prefix.chars().count())
        + 1
}

/// Caret count for a byte range within a single line; at least one caret.
fn char_width(line: &str, start: usize, end: usize) -> usize {
    line.get(start..end)
        .map_or_else(|| end.saturating_sub(start), |text| text.chars().count())
        .max(1)
}

fn colorize(value: &str, code: &str) -> String {
    format!("\u{1b}[{code}m{value}\u{1b}[0m")
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "1;31",
        Severity::Warning => "1;33",
        Severity::Note => "1;34",
        Severity::Help => "1;32",
    }
}

#[derive(Serialize)]
struct JsonDiagnostic {
    version: String,
    severity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<DiagnosticCode>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_span: Option<JsonSpan>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    labels: Vec<JsonLabel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<String>,
}

#[derive(Serialize)]
struct JsonSpan {
    file: String,
    start: usize,
    end: usize,
    line_start: usize,
    column_start: usize,
}

impl JsonSpan {
    fn from_span(span: Span, files: &FileCache) -> Option<Self> {
        let file = files.get(span.file_id)?;
        let line_col = file.line_col(span.start)?;
        Some(Self {
            file: file.path.display().to_string(),
            start: span.start,
            end: span.end,
            line_start: line_col.line,
            column_start: line_col.column,
        })
    }
}

#[derive(Serialize)]
struct JsonLabel {
    message: String,
    span: JsonSpan,
    is_primary: bool,
}

impl JsonLabel {
    fn from_label(label: &super::Label, files: &FileCache) -> JsonLabel {
        JsonLabel {
            message: label.message.clone(),
            span: JsonSpan::from_span(label.span, files).unwrap_or(JsonSpan {
                file: "<unknown>".into(),
                start: label.span.start,
                end: label.span.end,
                line_start: 0,
                column_start: 0,
            }),
            is_primary: label.is_primary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostic, DiagnosticCode};
    use serde_json::Value;

    fn sample_file() -> (FileCache, Span) {
        let mut files = FileCache::default();
        let source = "fn pick(x: int | x > 5) -> int {\n    return x;\n}\n";
        let file_id = files.add_file("sample.ql", source);
        let start = source.find("x > 5").expect("sample contains guard");
        let span = Span::in_file(file_id, start, start + 5);
        (files, span)
    }

    fn base_diagnostic(span: Span) -> Diagnostic {
        Diagnostic::warning("overload `pick/1` #2 is unreachable", Some(span))
            .with_primary_label("guard already covered")
            .with_code(DiagnosticCode::new("W1002", Some("guards".into())))
    }

    fn options(format: ErrorFormat) -> FormatOptions {
        FormatOptions {
            format,
            color: ColorMode::Never,
            is_terminal: false,
        }
    }

    #[test]
    fn human_format_includes_snippet_and_notes() {
        let (files, span) = sample_file();
        let mut diagnostic = base_diagnostic(span);
        diagnostic.add_note("covered by overload #1");
        let rendered = format_diagnostics(&[diagnostic], &files, options(ErrorFormat::Human));
        assert!(
            rendered.contains("warning[W1002]: overload `pick/1` #2 is unreachable"),
            "header should contain severity and code: {rendered}"
        );
        assert!(
            rendered.contains("--> sample.ql:1:18"),
            "location arrow should include path and line/col: {rendered}"
        );
        assert!(
            rendered.contains("guard already covered"),
            "primary label message should be rendered: {rendered}"
        );
        assert!(
            rendered.contains("note: covered by overload #1"),
            "notes should render after snippets: {rendered}"
        );
    }

    #[test]
    fn human_format_underlines_guard_span() {
        let (files, span) = sample_file();
        let rendered =
            format_diagnostics(&[base_diagnostic(span)], &files, options(ErrorFormat::Human));
        let caret_line = rendered
            .lines()
            .find(|line| line.contains('^'))
            .expect("caret line rendered");
        assert_eq!(caret_line.chars().filter(|ch| *ch == '^').count(), 5);
    }

    #[test]
    fn secondary_labels_render_their_own_snippet() {
        let (files, span) = sample_file();
        let source = "fn pick(x: int | x > 5) -> int {\n    return x;\n}\n";
        let param = source.find("x: int").expect("sample declares parameter");
        let diagnostic = base_diagnostic(span).with_secondary(crate::diagnostics::Label::secondary(
            Span::in_file(span.file_id, param, param + 1),
            "parameter declared here",
        ));
        let rendered = format_diagnostics(&[diagnostic.clone()], &files, options(ErrorFormat::Human));
        assert!(
            rendered.contains("parameter declared here"),
            "secondary label message should be rendered: {rendered}"
        );
        let json = format_diagnostics(&[diagnostic], &files, options(ErrorFormat::Json));
        let value: Value = serde_json::from_str(&json).expect("valid json diagnostic");
        let labels = value["labels"].as_array().expect("labels array");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1]["is_primary"], false);
        assert_eq!(labels[1]["span"]["column_start"], 9);
    }

    #[test]
    fn short_format_is_single_line() {
        let (files, span) = sample_file();
        let mut diagnostic = base_diagnostic(span);
        diagnostic.add_note("covered by overload #1");
        let rendered = format_diagnostics(&[diagnostic], &files, options(ErrorFormat::Short));
        assert!(
            rendered.starts_with("sample.ql:1:18: warning[W1002]:"),
            "short format should start with path/line/col: {rendered}"
        );
        assert!(
            rendered.contains("(notes: 1)"),
            "short format should include note count when present: {rendered}"
        );
        assert_eq!(rendered.lines().count(), 1);
    }

    #[test]
    fn json_format_emits_schema_versioned_payload() {
        let (files, span) = sample_file();
        let rendered =
            format_diagnostics(&[base_diagnostic(span)], &files, options(ErrorFormat::Json));
        let value: Value = serde_json::from_str(&rendered).expect("valid json diagnostic");
        assert_eq!(value["version"], JSON_SCHEMA_VERSION, "schema version");
        assert_eq!(value["severity"], "warning", "severity field");
        assert_eq!(value["code"]["code"], "W1002", "diagnostic code");
        assert_eq!(value["code"]["category"], "guards", "diagnostic category");
        assert!(
            value["primary_span"].is_object(),
            "primary span should be included: {value}"
        );
        assert_eq!(value["primary_span"]["line_start"], 1);
        assert!(
            value["labels"].is_array() && !value["labels"].as_array().unwrap().is_empty(),
            "labels array should be present: {value}"
        );
    }

    #[test]
    fn missing_file_renders_unknown_location() {
        let files = FileCache::default();
        let diagnostic = Diagnostic::error("guard set incomplete", None)
            .with_code(DiagnosticCode::new("E1001", Some("guards".into())));
        let rendered = format_diagnostics(&[diagnostic], &files, options(ErrorFormat::Short));
        assert!(rendered.starts_with("<unknown>:?:?: error[E1001]:"));
    }
}
