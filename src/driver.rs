//! Compilation driver: runs the `read -> lex -> parse -> validate` pipeline
//! over a batch of `.ql` inputs and folds the results into a [`CheckReport`].

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use crate::diagnostics::{Diagnostic, FileCache};
use crate::error::Result;
use crate::frontend::parser::{self, ParseOutput};
use crate::guards::{self, GuardConfig, OverloadCollector};

/// Outcome of checking a batch of inputs.
///
/// Diagnostics are grouped per input in the order the inputs were given;
/// within each input they follow the canonical order produced by the
/// pipeline stages.
#[derive(Clone, Debug, Default)]
pub struct CheckReport {
    pub diagnostics: Vec<Diagnostic>,
    pub files: FileCache,
}

impl CheckReport {
    #[must_use]
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity.is_error())
    }
}

/// Entry point for batch checking. Holds the guard-validator configuration
/// so that environment toggles are read once per process, not per file.
#[derive(Clone, Debug, Default)]
pub struct Driver {
    config: GuardConfig,
}

impl Driver {
    /// Build a driver from `QUILL_*` environment toggles.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            config: GuardConfig::from_env(),
        }
    }

    #[must_use]
    pub fn with_config(config: GuardConfig) -> Self {
        Self { config }
    }

    /// Check every input file and collect diagnostics.
    ///
    /// A file that fails to parse contributes its syntax diagnostics and is
    /// skipped by the guard validator; remaining files are still checked.
    /// I/O failures abort the batch.
    pub fn check(&self, inputs: &[PathBuf]) -> Result<CheckReport> {
        let started = Instant::now();
        tracing::info!(
            target: "pipeline",
            stage = "driver.check.start",
            command = "check",
            status = "start",
            input_count = inputs.len(),
            inputs = %summarize_inputs(inputs),
        );

        let mut report = CheckReport::default();
        let mut parsed = Vec::with_capacity(inputs.len());
        for input in inputs {
            let source = fs::read_to_string(input)?;
            let file_id = report.files.add_file(input.clone(), source.clone());
            parsed.push(parser::parse_module_in_file(&source, file_id));
        }

        let mut collector = OverloadCollector::default();
        for outcome in &parsed {
            merge_outcome(&mut report, &mut collector, outcome, &self.config);
        }

        tracing::info!(
            target: "pipeline",
            stage = "driver.check.complete",
            command = "check",
            status = "ok",
            input_count = inputs.len(),
            diagnostics = report.diagnostics.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        );
        Ok(report)
    }

    /// Check a single in-memory source, as the language server does for open
    /// buffers. Never touches the filesystem.
    #[must_use]
    pub fn check_source(&self, path: impl Into<PathBuf>, source: impl Into<String>) -> CheckReport {
        let mut report = CheckReport::default();
        let source = source.into();
        let file_id = report.files.add_file(path.into(), source.clone());
        let outcome = parser::parse_module_in_file(&source, file_id);
        let mut collector = OverloadCollector::default();
        merge_outcome(&mut report, &mut collector, &outcome, &self.config);
        report
    }
}

fn merge_outcome<'m>(
    report: &mut CheckReport,
    collector: &mut OverloadCollector<'m>,
    outcome: &'m std::result::Result<ParseOutput, parser::ParseError>,
    config: &GuardConfig,
) {
    match outcome {
        Ok(output) => {
            report
                .diagnostics
                .extend(output.diagnostics.iter().cloned());
            report
                .diagnostics
                .extend(guards::validate_with(collector, &output.module, config));
        }
        Err(error) => {
            report
                .diagnostics
                .extend(error.diagnostics().iter().cloned());
        }
    }
}

fn summarize_inputs(inputs: &[PathBuf]) -> String {
    match inputs {
        [] => "<none>".to_string(),
        [only] => only.display().to_string(),
        many => many
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::{Driver, summarize_inputs};
    use crate::error::Error;
    use crate::guards::GuardConfig;

    fn write_source(dir: &tempfile::TempDir, name: &str, source: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, source).unwrap();
        path
    }

    #[test]
    fn clean_inputs_produce_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(
            &dir,
            "clean.ql",
            "fn abs(x | x < 0) { return 0 - x; }\nfn abs(x) { return x; }\n",
        );

        let report = Driver::with_config(GuardConfig::default())
            .check(&[path])
            .unwrap();
        assert!(!report.has_diagnostics());
        assert!(!report.has_errors());
    }

    #[test]
    fn guard_diagnostics_reach_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "gap.ql", "fn f(x | x > 0) { return x; }\n");

        let report = Driver::with_config(GuardConfig::default())
            .check(&[path])
            .unwrap();
        assert!(report.has_errors());
        assert_eq!(report.diagnostics[0].code_str(), "E1001");
    }

    #[test]
    fn parse_failure_skips_validation_for_that_file_only() {
        let dir = tempfile::tempdir().unwrap();
        let broken = write_source(&dir, "broken.ql", "fn f(x | x > 0) { return x }\n");
        let gapped = write_source(&dir, "gap.ql", "fn g(x | x > 0) { return x; }\n");

        let report = Driver::with_config(GuardConfig::default())
            .check(&[broken, gapped])
            .unwrap();
        // broken.ql reports syntax trouble but no guard diagnostics; gap.ql
        // is still validated.
        assert!(report
            .diagnostics
            .iter()
            .any(|diagnostic| diagnostic.message.contains("expected `;`")));
        assert!(report
            .diagnostics
            .iter()
            .any(|diagnostic| diagnostic.code_str() == "E1001"));
        assert!(!report
            .diagnostics
            .iter()
            .any(|diagnostic| diagnostic.message.contains("`f/1`")));
    }

    #[test]
    fn missing_input_aborts_with_io_error() {
        let result = Driver::with_config(GuardConfig::default())
            .check(&[PathBuf::from("/nonexistent/quill/input.ql")]);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn check_source_works_without_filesystem() {
        let driver = Driver::with_config(GuardConfig::default());
        let report = driver.check_source("buffer.ql", "fn f(x | x >= 0) { return x; }");
        assert!(report.has_errors());
        let span = report.diagnostics[0].primary_label.as_ref().unwrap().span;
        assert_eq!(
            report.files.path(span.file_id),
            Some(std::path::Path::new("buffer.ql"))
        );
    }

    #[test]
    fn input_summaries_cover_all_arities() {
        assert_eq!(summarize_inputs(&[]), "<none>");
        assert_eq!(summarize_inputs(&[PathBuf::from("a.ql")]), "a.ql");
        assert_eq!(
            summarize_inputs(&[PathBuf::from("a.ql"), PathBuf::from("b.ql")]),
            "a.ql, b.ql"
        );
    }
}
