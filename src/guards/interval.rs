//! Interval algebra backing guard coverage analysis.
//!
//! Guards that compare one parameter against one literal map onto intervals
//! over a single numeric axis (booleans ride along as the points 0 and 1).
//! Coverage accumulation works on [`IntervalSet`], a sorted disjoint union
//! that merges touching pieces.

use std::cmp::Ordering;

/// A contiguous range of the numeric axis. Unbounded ends are represented by
/// the infinities and are always exclusive after normalization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Interval {
    pub min: f64,
    pub min_inclusive: bool,
    pub max: f64,
    pub max_inclusive: bool,
}

/// Per-parameter domains of one overload: parameter index paired with the
/// interval its atoms pin down.
pub(crate) type ParamDomains = Vec<(usize, Interval)>;

fn cmp_bound(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl Interval {
    pub(crate) fn new(min: f64, min_inclusive: bool, max: f64, max_inclusive: bool) -> Self {
        Self {
            min,
            min_inclusive: min_inclusive && min.is_finite(),
            max,
            max_inclusive: max_inclusive && max.is_finite(),
        }
    }

    pub(crate) fn full() -> Self {
        Self::new(f64::NEG_INFINITY, false, f64::INFINITY, false)
    }

    pub(crate) fn point(value: f64) -> Self {
        Self::new(value, true, value, true)
    }

    pub(crate) fn less_than(value: f64) -> Self {
        Self::new(f64::NEG_INFINITY, false, value, false)
    }

    pub(crate) fn at_most(value: f64) -> Self {
        Self::new(f64::NEG_INFINITY, false, value, true)
    }

    pub(crate) fn greater_than(value: f64) -> Self {
        Self::new(value, false, f64::INFINITY, false)
    }

    pub(crate) fn at_least(value: f64) -> Self {
        Self::new(value, true, f64::INFINITY, false)
    }

    /// An interval is empty when its bounds cross, or pinch a single value
    /// that at least one side excludes.
    pub(crate) fn is_empty(&self) -> bool {
        match cmp_bound(self.min, self.max) {
            Ordering::Greater => true,
            Ordering::Equal => !(self.min_inclusive && self.max_inclusive),
            Ordering::Less => false,
        }
    }

    /// Bound-wise intersection; the tighter bound wins and carries its own
    /// inclusivity, ties keep a point only when both sides include it.
    pub(crate) fn intersect(&self, other: &Self) -> Self {
        let (min, min_inclusive) = match cmp_bound(self.min, other.min) {
            Ordering::Greater => (self.min, self.min_inclusive),
            Ordering::Less => (other.min, other.min_inclusive),
            Ordering::Equal => (self.min, self.min_inclusive && other.min_inclusive),
        };
        let (max, max_inclusive) = match cmp_bound(self.max, other.max) {
            Ordering::Less => (self.max, self.max_inclusive),
            Ordering::Greater => (other.max, other.max_inclusive),
            Ordering::Equal => (self.max, self.max_inclusive && other.max_inclusive),
        };
        Self::new(min, min_inclusive, max, max_inclusive)
    }

    /// `other` is fully contained in `self` iff intersecting changes nothing.
    pub(crate) fn covers(&self, other: &Self) -> bool {
        self.intersect(other) == *other
    }

    pub(crate) fn is_full(&self) -> bool {
        self.covers(&Interval::full())
    }

    /// True when `self` and `next` (with `next.min >= self.min`) overlap or
    /// touch at a shared endpoint that at least one side includes.
    fn connects_to(&self, next: &Self) -> bool {
        match cmp_bound(next.min, self.max) {
            Ordering::Less => true,
            Ordering::Equal => self.max_inclusive || next.min_inclusive,
            Ordering::Greater => false,
        }
    }

    /// Extend `self` rightwards to absorb `next`. Caller guarantees the two
    /// connect and `next.min >= self.min`.
    fn absorb(&mut self, next: &Self) {
        match cmp_bound(next.max, self.max) {
            Ordering::Greater => {
                self.max = next.max;
                self.max_inclusive = next.max_inclusive;
            }
            Ordering::Equal => {
                self.max_inclusive = self.max_inclusive || next.max_inclusive;
            }
            Ordering::Less => {}
        }
    }
}

/// Normalized union of intervals: sorted by lower bound, pairwise disjoint,
/// touching neighbours merged.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct IntervalSet {
    parts: Vec<Interval>,
}

impl IntervalSet {
    pub(crate) fn new() -> Self {
        Self { parts: Vec::new() }
    }

    pub(crate) fn insert(&mut self, interval: Interval) {
        if interval.is_empty() {
            return;
        }
        self.parts.push(interval);
        self.normalize();
    }

    fn normalize(&mut self) {
        self.parts.sort_by(|a, b| {
            cmp_bound(a.min, b.min)
                // Inclusive lower bounds sort first so the sweep extends them.
                .then_with(|| b.min_inclusive.cmp(&a.min_inclusive))
        });
        let mut merged: Vec<Interval> = Vec::with_capacity(self.parts.len());
        for part in self.parts.drain(..) {
            if let Some(last) = merged.last_mut() {
                if last.connects_to(&part) {
                    last.absorb(&part);
                    continue;
                }
            }
            merged.push(part);
        }
        self.parts = merged;
    }

    /// True when `interval` lies entirely inside the union. Empty probes are
    /// vacuously covered.
    pub(crate) fn covers_interval(&self, interval: &Interval) -> bool {
        if interval.is_empty() {
            return true;
        }
        // Parts are disjoint and non-touching after normalization, so a
        // contiguous probe must fit inside a single part.
        self.parts.iter().any(|part| part.covers(interval))
    }

    /// True when the union is the entire numeric axis.
    pub(crate) fn covers_full_domain(&self) -> bool {
        self.parts.len() == 1 && self.parts[0].is_full()
    }

    /// True when the union contains both points of the boolean domain.
    pub(crate) fn covers_bool_domain(&self) -> bool {
        self.covers_interval(&Interval::point(0.0)) && self.covers_interval(&Interval::point(1.0))
    }
}
