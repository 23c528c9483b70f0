//! Optional instrumentation for the guard validator.
//!
//! Two independent toggles, both read from the environment into an explicit
//! [`GuardConfig`] so the orchestrator never consults ambient state:
//!
//! - `QUILL_GUARD_METRICS`: `1` streams one JSON record per analyzed group to
//!   stderr; any other non-empty value is an append-mode file path.
//! - `QUILL_GUARD_POOL`: non-empty (and not `0`) reuses a bounded pool of
//!   scratch buffers across groups.
//!
//! Neither toggle may change analysis results, and neither may fail loudly;
//! write errors and pool contention are swallowed.

use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write as _};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use serde::Serialize;

use crate::guards::interval::ParamDomains;

const POOL_LIMIT: usize = 8;

/// Destination for per-group metrics records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetricsTarget {
    Stderr,
    File(PathBuf),
}

/// Explicit validator configuration. Defaults to everything off.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuardConfig {
    pub metrics: Option<MetricsTarget>,
    pub pooling: bool,
}

impl GuardConfig {
    /// Read both toggles from the environment once.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            metrics: metrics_target(env::var("QUILL_GUARD_METRICS").ok().as_deref()),
            pooling: pooling_enabled(env::var("QUILL_GUARD_POOL").ok().as_deref()),
        }
    }
}

fn metrics_target(value: Option<&str>) -> Option<MetricsTarget> {
    match value {
        Some("1") => Some(MetricsTarget::Stderr),
        Some(path) if !path.is_empty() => Some(MetricsTarget::File(PathBuf::from(path))),
        _ => None,
    }
}

fn pooling_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.is_empty() && value != "0")
}

#[derive(Serialize)]
struct GroupRecord<'a> {
    group: &'a str,
    overloads: usize,
    unknown: usize,
    unknown_pct: f64,
    elapsed_us: u64,
}

/// Writes one line-delimited JSON record per analyzed group.
pub(crate) struct MetricsRecorder {
    target: Option<MetricsTarget>,
}

impl MetricsRecorder {
    pub(crate) fn new(config: &GuardConfig) -> Self {
        Self {
            target: config.metrics.clone(),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    pub(crate) fn record(&self, group: &str, overloads: usize, unknown: usize, elapsed: Duration) {
        let Some(target) = &self.target else {
            return;
        };
        let record = GroupRecord {
            group,
            overloads,
            unknown,
            unknown_pct: percentage(unknown, overloads),
            elapsed_us: u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
        };
        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };
        match target {
            MetricsTarget::Stderr => {
                let mut err = io::stderr().lock();
                let _ = writeln!(err, "{line}");
            }
            MetricsTarget::File(path) => {
                if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                    let _ = writeln!(file, "{line}");
                }
            }
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Per-group working storage. Rented at group start, returned at group end;
/// the analyzer resizes it for the member count before use.
#[derive(Debug, Default)]
pub(crate) struct GroupScratch {
    pub domains: Vec<ParamDomains>,
}

impl GroupScratch {
    /// Clear retained buffers and size the outer list for `members` slots,
    /// keeping inner capacity warm for reuse.
    pub(crate) fn reset_for(&mut self, members: usize) {
        for domain in &mut self.domains {
            domain.clear();
        }
        if self.domains.len() < members {
            self.domains.resize_with(members, Vec::new);
        } else {
            self.domains.truncate(members);
        }
    }
}

fn pool() -> &'static Mutex<Vec<GroupScratch>> {
    static POOL: OnceLock<Mutex<Vec<GroupScratch>>> = OnceLock::new();
    POOL.get_or_init(|| Mutex::new(Vec::new()))
}

pub(crate) fn rent(config: &GuardConfig) -> GroupScratch {
    if config.pooling {
        if let Ok(mut slots) = pool().lock() {
            if let Some(scratch) = slots.pop() {
                return scratch;
            }
        }
    }
    GroupScratch::default()
}

pub(crate) fn give_back(config: &GuardConfig, scratch: GroupScratch) {
    if !config.pooling {
        return;
    }
    if let Ok(mut slots) = pool().lock() {
        if slots.len() < POOL_LIMIT {
            slots.push(scratch);
        }
    }
}
