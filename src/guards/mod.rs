//! Guard-clause overload completeness validation.
//!
//! Quill dispatches between same-name, same-arity overloads by evaluating
//! their guards in declaration order. This module proves at compile time that
//! a group's guards jointly cover every legal input, flags clauses earlier
//! guards make unreachable, and enforces the base-clause ordering rules.
//!
//! Everything here is implementation-private except [`validate`] and the
//! [`GuardConfig`] handed to it.

mod analyzer;
mod collect;
mod emit;
mod instrument;
mod interval;
mod predicate;

pub use instrument::{GuardConfig, MetricsTarget};

pub(crate) use collect::OverloadCollector;

use std::time::Instant;

use crate::diagnostics::Diagnostic;
use crate::frontend::ast::Module;

use emit::GroupReport;
use instrument::MetricsRecorder;

/// Validate every overload group declared in `module`.
///
/// Returns the complete diagnostic list in canonical order: sorted by group
/// name, member position, then code, with note diagnostics adjacent to the
/// finding they annotate. The same input always yields the same list.
///
/// The validator never panics and never fails: guards it cannot analyze
/// degrade to conservative "unknown" predicates, and instrumentation enabled
/// through `config` has no effect on the returned diagnostics.
#[must_use]
pub fn validate(module: &Module, config: &GuardConfig) -> Vec<Diagnostic> {
    let mut collector = OverloadCollector::default();
    validate_with(&mut collector, module, config)
}

/// Like [`validate`], but reusing a caller-owned collector so batch drivers
/// keep its allocations across compilation units.
pub(crate) fn validate_with<'m>(
    collector: &mut OverloadCollector<'m>,
    module: &'m Module,
    config: &GuardConfig,
) -> Vec<Diagnostic> {
    collector.reset();
    collector.collect_module(module);

    let recorder = MetricsRecorder::new(config);
    let mut reports = Vec::with_capacity(collector.groups().len());
    for group in collector.groups() {
        let started = recorder.is_enabled().then(Instant::now);
        let mut scratch = instrument::rent(config);
        let outcome = analyzer::analyze_group(group, &mut scratch);
        instrument::give_back(config, scratch);
        if let Some(started) = started {
            recorder.record(
                &group.key.display_name(),
                group.members.len(),
                outcome.unknown_members,
                started.elapsed(),
            );
        }
        reports.push(GroupReport {
            group_name: group.key.display_name(),
            member_spans: group.members.iter().map(|decl| decl.span).collect(),
            findings: outcome.findings,
        });
    }

    let diagnostics = emit::render(&reports);
    tracing::debug!(
        target: "pipeline",
        stage = "guards.validate.complete",
        groups = reports.len(),
        diagnostics = diagnostics.len(),
    );
    diagnostics
}
