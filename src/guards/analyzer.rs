//! Completeness and reachability analysis over one overload group.
//!
//! Members are processed strictly in declaration order (the dispatch order).
//! Coverage accumulated from earlier members is threaded through the fold as
//! an explicit value, which keeps group analyses independent of each other.

use crate::guards::collect::FunctionGroup;
use crate::guards::instrument::GroupScratch;
use crate::guards::interval::{IntervalSet, ParamDomains};
use crate::guards::predicate::{PredicateDescriptor, PredicateType, classify};

/// Advisory ceiling on overload count per group.
pub(crate) const OVERLOAD_CEILING: usize = 32;

/// What makes an overload unreachable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Cover {
    /// Fully inside the coverage accumulated up to (and including) this
    /// earlier member.
    Member(usize),
    /// The guard's own conjunction admits no value at all.
    Unsatisfiable,
}

/// One analysis finding, positioned by member index where applicable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Finding {
    Incomplete,
    BaseNotLast { base: usize },
    MultipleBase { first: usize, second: usize },
    Unreachable { member: usize, cover: Cover },
    OverloadCount { count: usize },
    UnknownExplosion { unknown: usize, total: usize },
}

#[derive(Debug, Default)]
pub(crate) struct GroupOutcome {
    pub findings: Vec<Finding>,
    pub unknown_members: usize,
}

/// Running union of the regions earlier members already match.
#[derive(Debug, Default)]
struct Coverage {
    /// An earlier base clause matches everything.
    full: bool,
    per_param: Vec<(usize, IntervalSet)>,
}

impl Coverage {
    fn add_member(&mut self, descriptor: &PredicateDescriptor, domain: &ParamDomains) {
        match descriptor.kind {
            PredicateType::Base => self.full = true,
            PredicateType::Analyzable => {
                // Only a clause constraining a single parameter carves out a
                // region later clauses can be entirely inside; clauses
                // constraining several parameters cover too little to subsume
                // anything on their own.
                if let [(param, interval)] = domain.as_slice() {
                    self.set_for(*param).insert(*interval);
                }
            }
            PredicateType::Unknown => {}
        }
    }

    fn set_for(&mut self, param: usize) -> &mut IntervalSet {
        if let Some(position) = self.per_param.iter().position(|(p, _)| *p == param) {
            &mut self.per_param[position].1
        } else {
            self.per_param.push((param, IntervalSet::new()));
            let index = self.per_param.len() - 1;
            &mut self.per_param[index].1
        }
    }

    /// An overload is covered when any one of its constrained parameters is
    /// already matched for every value the overload would accept.
    fn covers(&self, domain: &ParamDomains) -> bool {
        if self.full {
            return true;
        }
        domain.iter().any(|(param, interval)| {
            self.per_param
                .iter()
                .find(|(p, _)| p == param)
                .is_some_and(|(_, set)| set.covers_interval(interval))
        })
    }
}

/// Analyze one group; never panics, never reorders members.
pub(crate) fn analyze_group(group: &FunctionGroup<'_>, scratch: &mut GroupScratch) -> GroupOutcome {
    let members = &group.members;
    let descriptors: Vec<PredicateDescriptor> =
        members.iter().map(|decl| classify(decl)).collect();
    let unknown_members = descriptors
        .iter()
        .filter(|descriptor| descriptor.kind == PredicateType::Unknown)
        .count();
    let mut outcome = GroupOutcome {
        findings: Vec::new(),
        unknown_members,
    };

    // Base-overload rule.
    let bases: Vec<usize> = descriptors
        .iter()
        .enumerate()
        .filter(|(_, descriptor)| descriptor.kind == PredicateType::Base)
        .map(|(index, _)| index)
        .collect();
    if let [first, second, ..] = bases.as_slice() {
        outcome.findings.push(Finding::MultipleBase {
            first: *first,
            second: *second,
        });
        return outcome;
    }
    let base = bases.first().copied();
    if let Some(index) = base.filter(|&index| index + 1 != members.len()) {
        outcome.findings.push(Finding::BaseNotLast { base: index });
    }

    // Reduce each analyzable member to per-parameter intervals.
    scratch.reset_for(members.len());
    for (index, descriptor) in descriptors.iter().enumerate() {
        if descriptor.kind == PredicateType::Analyzable {
            if let Some(domain) = scratch.domains.get_mut(index) {
                fill_domain(descriptor, domain);
            }
        }
    }
    let domains = &scratch.domains;

    // Subsumption fold.
    let mut coverage = Coverage::default();
    for (index, (descriptor, domain)) in descriptors.iter().zip(domains.iter()).enumerate() {
        if descriptor.kind == PredicateType::Analyzable {
            if domain.iter().any(|(_, interval)| interval.is_empty()) {
                outcome.findings.push(Finding::Unreachable {
                    member: index,
                    cover: Cover::Unsatisfiable,
                });
            } else if coverage.covers(domain) {
                if let Some(covering) = earliest_cover(&descriptors, domains, index, domain) {
                    outcome.findings.push(Finding::Unreachable {
                        member: index,
                        cover: Cover::Member(covering),
                    });
                }
            }
        }
        coverage.add_member(descriptor, domain);
    }

    // Completeness verdict: a final base clause, or an analyzable union that
    // leaves no value of some parameter's domain unmatched.
    let complete = match base {
        Some(index) if index + 1 == members.len() => true,
        _ => analyzable_union_covers(group, &descriptors, domains),
    };
    if !complete {
        outcome.findings.push(Finding::Incomplete);
    }

    // Advisory checks.
    if unknown_members * 2 > members.len() && members.len() >= 2 {
        outcome.findings.push(Finding::UnknownExplosion {
            unknown: unknown_members,
            total: members.len(),
        });
    }
    if members.len() > OVERLOAD_CEILING {
        outcome.findings.push(Finding::OverloadCount {
            count: members.len(),
        });
    }

    outcome
}

fn fill_domain(descriptor: &PredicateDescriptor, domain: &mut ParamDomains) {
    for atom in &descriptor.atoms {
        let interval = atom.interval();
        match domain.iter_mut().find(|(param, _)| *param == atom.param) {
            Some((_, existing)) => *existing = existing.intersect(&interval),
            None => domain.push((atom.param, interval)),
        }
    }
    domain.sort_by_key(|(param, _)| *param);
}

/// Smallest prefix end index whose accumulated coverage contains `probe`.
fn earliest_cover(
    descriptors: &[PredicateDescriptor],
    domains: &[ParamDomains],
    upto: usize,
    probe: &ParamDomains,
) -> Option<usize> {
    let mut coverage = Coverage::default();
    for (index, (descriptor, domain)) in
        descriptors.iter().zip(domains.iter()).enumerate().take(upto)
    {
        coverage.add_member(descriptor, domain);
        if coverage.covers(probe) {
            return Some(index);
        }
    }
    None
}

fn analyzable_union_covers(
    group: &FunctionGroup<'_>,
    descriptors: &[PredicateDescriptor],
    domains: &[ParamDomains],
) -> bool {
    let mut unions: Vec<(usize, IntervalSet)> = Vec::new();
    for (descriptor, domain) in descriptors.iter().zip(domains.iter()) {
        if descriptor.kind != PredicateType::Analyzable {
            continue;
        }
        if let [(param, interval)] = domain.as_slice() {
            match unions.iter_mut().find(|(p, _)| p == param) {
                Some((_, set)) => set.insert(*interval),
                None => {
                    let mut set = IntervalSet::new();
                    set.insert(*interval);
                    unions.push((*param, set));
                }
            }
        }
    }
    unions.iter().any(|(param, set)| {
        if param_is_bool(group, *param) {
            set.covers_bool_domain()
        } else {
            set.covers_full_domain()
        }
    })
}

fn param_is_bool(group: &FunctionGroup<'_>, param: usize) -> bool {
    group
        .members
        .first()
        .and_then(|decl| decl.params.get(param))
        .and_then(|p| p.ty.as_ref())
        .is_some_and(|ty| ty.name == "bool")
}
