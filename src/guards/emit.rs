//! Rendering of guard analysis findings into diagnostics.
//!
//! Pure formatting: no analysis happens here. Findings are sorted into a
//! canonical order (group name, member position, code) and note diagnostics
//! stay adjacent to the error or warning they annotate, so identical input
//! always renders to an identical list.

use crate::diagnostics::{Diagnostic, DiagnosticCode, Span};
use crate::guards::analyzer::{Cover, Finding, OVERLOAD_CEILING};

pub(crate) mod codes {
    pub const GUARD_INCOMPLETE: &str = "E1001";
    pub const GUARD_UNREACHABLE: &str = "W1002";
    pub const GUARD_BASE_NOT_LAST: &str = "E1004";
    pub const GUARD_MULTIPLE_BASE: &str = "E1005";
    pub const GUARD_OVERLOAD_COUNT: &str = "W1101";
    pub const GUARD_UNKNOWN_EXPLOSION: &str = "W1102";
}

const CATEGORY: &str = "guards";

/// One group's findings plus the source positions needed to render them.
#[derive(Debug)]
pub(crate) struct GroupReport {
    pub group_name: String,
    pub member_spans: Vec<Span>,
    pub findings: Vec<Finding>,
}

struct Entry {
    group: String,
    anchor: usize,
    code: &'static str,
    parent: Diagnostic,
    notes: Vec<Diagnostic>,
}

/// Render every report into the final, canonically ordered diagnostic list.
pub(crate) fn render(reports: &[GroupReport]) -> Vec<Diagnostic> {
    let mut entries: Vec<Entry> = reports
        .iter()
        .flat_map(|report| report.findings.iter().map(move |finding| entry_for(report, finding)))
        .collect();
    // Stable sort: ties keep declaration order.
    entries.sort_by(|a, b| {
        (a.group.as_str(), a.anchor, a.code).cmp(&(b.group.as_str(), b.anchor, b.code))
    });
    let mut diagnostics = Vec::with_capacity(entries.len());
    for entry in entries {
        diagnostics.push(entry.parent);
        diagnostics.extend(entry.notes);
    }
    diagnostics
}

fn entry_for(report: &GroupReport, finding: &Finding) -> Entry {
    let name = report.group_name.as_str();
    match *finding {
        Finding::Incomplete => entry(
            report,
            0,
            codes::GUARD_INCOMPLETE,
            error(
                codes::GUARD_INCOMPLETE,
                format!("overload group `{name}` is incomplete: guards do not cover all possible inputs"),
                span_at(report, 0),
            ),
            Vec::new(),
        ),
        Finding::BaseNotLast { base } => entry(
            report,
            base,
            codes::GUARD_BASE_NOT_LAST,
            error(
                codes::GUARD_BASE_NOT_LAST,
                format!("base overload `{name}` #{} must be declared last", base + 1),
                span_at(report, base),
            ),
            Vec::new(),
        ),
        Finding::MultipleBase { first, second } => entry(
            report,
            second,
            codes::GUARD_MULTIPLE_BASE,
            error(
                codes::GUARD_MULTIPLE_BASE,
                format!("overload group `{name}` declares multiple base overloads"),
                span_at(report, second),
            ),
            vec![note(
                codes::GUARD_MULTIPLE_BASE,
                format!("first base overload is #{}", first + 1),
                span_at(report, first),
            )],
        ),
        Finding::Unreachable { member, cover } => {
            let parent = warning(
                codes::GUARD_UNREACHABLE,
                format!("overload `{name}` #{} is unreachable", member + 1),
                span_at(report, member),
            );
            let annotation = match cover {
                Cover::Member(covering) => note(
                    codes::GUARD_UNREACHABLE,
                    format!("already covered by overload #{}", covering + 1),
                    span_at(report, covering),
                ),
                Cover::Unsatisfiable => note(
                    codes::GUARD_UNREACHABLE,
                    "its guard conditions are mutually exclusive".to_string(),
                    span_at(report, member),
                ),
            };
            entry(report, member, codes::GUARD_UNREACHABLE, parent, vec![annotation])
        }
        Finding::OverloadCount { count } => entry(
            report,
            0,
            codes::GUARD_OVERLOAD_COUNT,
            warning(
                codes::GUARD_OVERLOAD_COUNT,
                format!(
                    "overload group `{name}` has {count} overloads, above the advisory ceiling of {OVERLOAD_CEILING}"
                ),
                span_at(report, 0),
            ),
            Vec::new(),
        ),
        Finding::UnknownExplosion { unknown, total } => entry(
            report,
            0,
            codes::GUARD_UNKNOWN_EXPLOSION,
            warning(
                codes::GUARD_UNKNOWN_EXPLOSION,
                format!(
                    "{unknown} of {total} overloads in group `{name}` have guards too opaque to analyze"
                ),
                span_at(report, 0),
            ),
            Vec::new(),
        ),
    }
}

fn entry(
    report: &GroupReport,
    anchor: usize,
    code: &'static str,
    parent: Diagnostic,
    notes: Vec<Diagnostic>,
) -> Entry {
    Entry {
        group: report.group_name.clone(),
        anchor,
        code,
        parent,
        notes,
    }
}

fn span_at(report: &GroupReport, index: usize) -> Option<Span> {
    report.member_spans.get(index).copied()
}

fn error(code: &str, message: String, span: Option<Span>) -> Diagnostic {
    Diagnostic::error(message, span)
        .with_code(DiagnosticCode::new(code, Some(CATEGORY.to_string())))
}

fn warning(code: &str, message: String, span: Option<Span>) -> Diagnostic {
    Diagnostic::warning(message, span)
        .with_code(DiagnosticCode::new(code, Some(CATEGORY.to_string())))
}

fn note(code: &str, message: String, span: Option<Span>) -> Diagnostic {
    Diagnostic::note(message, span)
        .with_code(DiagnosticCode::new(code, Some(CATEGORY.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::guards::analyzer::Cover;

    fn spans(count: usize) -> Vec<Span> {
        (0..count).map(|i| Span::new(i * 10, i * 10 + 5)).collect()
    }

    #[test]
    fn renders_codes_and_category() {
        let report = GroupReport {
            group_name: "f/1".to_string(),
            member_spans: spans(1),
            findings: vec![Finding::Incomplete],
        };
        let diagnostics = render(&[report]);
        assert_eq!(diagnostics.len(), 1);
        let diagnostic = &diagnostics[0];
        assert!(diagnostic.message.starts_with("overload group `f/1` is incomplete"));
        assert_eq!(diagnostic.code_str(), "E1001");
        let code = diagnostic.code.as_ref().expect("code attached");
        assert_eq!(code.category.as_deref(), Some("guards"));
        assert_eq!(diagnostic.severity, Severity::Error);
    }

    #[test]
    fn notes_stay_adjacent_to_their_parent() {
        let report = GroupReport {
            group_name: "g/1".to_string(),
            member_spans: spans(3),
            findings: vec![
                Finding::Incomplete,
                Finding::Unreachable {
                    member: 1,
                    cover: Cover::Member(0),
                },
            ],
        };
        let diagnostics = render(&[report]);
        let codes: Vec<(&str, Severity)> = diagnostics
            .iter()
            .map(|d| (d.code_str(), d.severity))
            .collect();
        assert_eq!(
            codes,
            vec![
                ("E1001", Severity::Error),
                ("W1002", Severity::Warning),
                ("W1002", Severity::Note),
            ]
        );
        // The note points back at the covering member's span.
        assert_eq!(
            diagnostics[2].primary_label.as_ref().map(|l| l.span),
            Some(Span::new(0, 5))
        );
        assert!(diagnostics[2].message.contains("overload #1"));
    }

    #[test]
    fn sorting_is_by_group_then_position_then_code() {
        let second = GroupReport {
            group_name: "b/1".to_string(),
            member_spans: spans(2),
            findings: vec![
                Finding::Unreachable {
                    member: 1,
                    cover: Cover::Member(0),
                },
                Finding::Incomplete,
            ],
        };
        let first = GroupReport {
            group_name: "a/2".to_string(),
            member_spans: spans(1),
            findings: vec![Finding::Incomplete],
        };
        // Reports arrive out of order; rendering restores canonical order.
        let diagnostics = render(&[second, first]);
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert!(messages[0].contains("`a/2`"));
        assert!(messages[1].contains("`b/1`"));
        assert_eq!(diagnostics[1].code_str(), "E1001");
        assert_eq!(diagnostics[2].code_str(), "W1002");
    }

    #[test]
    fn unsatisfiable_cover_notes_do_not_cite_an_index() {
        let report = GroupReport {
            group_name: "f/1".to_string(),
            member_spans: spans(2),
            findings: vec![Finding::Unreachable {
                member: 0,
                cover: Cover::Unsatisfiable,
            }],
        };
        let diagnostics = render(&[report]);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[1].message.contains("mutually exclusive"));
    }

    #[test]
    fn rendering_twice_is_byte_identical() {
        let build = || GroupReport {
            group_name: "math.clamp/2".to_string(),
            member_spans: spans(4),
            findings: vec![
                Finding::Incomplete,
                Finding::BaseNotLast { base: 1 },
                Finding::Unreachable {
                    member: 3,
                    cover: Cover::Member(1),
                },
            ],
        };
        let once: Vec<String> = render(&[build()]).iter().map(ToString::to_string).collect();
        let twice: Vec<String> = render(&[build()]).iter().map(ToString::to_string).collect();
        assert_eq!(once, twice);
    }
}
