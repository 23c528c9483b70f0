//! Grouping of declared overloads into dispatch families.
//!
//! Declaration order inside a group is the dispatch order and must never be
//! permuted; group emission order is the order each family first appears.

use std::collections::HashMap;

use crate::frontend::ast::{FunctionDecl, Module};

/// Identity of one overload family within its enclosing scope.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct GroupKey {
    pub owner: String,
    pub name: String,
    pub arity: usize,
    pub signature: String,
}

impl GroupKey {
    fn for_decl(owner: &str, decl: &FunctionDecl) -> Self {
        Self {
            owner: owner.to_string(),
            name: decl.name.clone(),
            arity: decl.arity(),
            signature: decl.signature(),
        }
    }

    /// Short form used in diagnostics, `name/arity` with an owner prefix for
    /// methods.
    pub(crate) fn display_name(&self) -> String {
        if self.owner.is_empty() {
            format!("{}/{}", self.name, self.arity)
        } else {
            format!("{}.{}/{}", self.owner, self.name, self.arity)
        }
    }
}

/// One overload family in declaration order.
#[derive(Clone, Debug)]
pub(crate) struct FunctionGroup<'a> {
    pub key: GroupKey,
    pub members: Vec<&'a FunctionDecl>,
}

/// Accumulates groups across one or more modules.
#[derive(Debug, Default)]
pub(crate) struct OverloadCollector<'a> {
    groups: Vec<FunctionGroup<'a>>,
    index: HashMap<GroupKey, usize>,
}

impl<'a> OverloadCollector<'a> {
    pub(crate) fn collect_module(&mut self, module: &'a Module) {
        for (owner, decl) in module.functions() {
            self.add(owner, decl);
        }
    }

    fn add(&mut self, owner: &str, decl: &'a FunctionDecl) {
        let key = GroupKey::for_decl(owner, decl);
        if let Some(&slot) = self.index.get(&key) {
            if let Some(group) = self.groups.get_mut(slot) {
                group.members.push(decl);
            }
            return;
        }
        self.index.insert(key.clone(), self.groups.len());
        self.groups.push(FunctionGroup {
            key,
            members: vec![decl],
        });
    }

    /// Clear accumulated state so the collector can be reused for an
    /// independent compilation unit.
    pub(crate) fn reset(&mut self) {
        self.groups.clear();
        self.index.clear();
    }

    pub(crate) fn groups(&self) -> &[FunctionGroup<'a>] {
        &self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse_module;

    fn collect(source: &str) -> Vec<(String, usize)> {
        let module = parse_module(source).expect("test source parses").module;
        let mut collector = OverloadCollector::default();
        collector.collect_module(&module);
        collector
            .groups()
            .iter()
            .map(|group| (group.key.display_name(), group.members.len()))
            .collect()
    }

    #[test]
    fn overloads_sharing_name_and_arity_group_in_declaration_order() {
        let groups = collect(
            "fn f(x | x < 0) { return x; }\n\
             fn g() { return 0; }\n\
             fn f(x) { return x; }\n",
        );
        assert_eq!(
            groups,
            vec![("f/1".to_string(), 2), ("g/0".to_string(), 1)]
        );
    }

    #[test]
    fn arity_splits_families() {
        let groups = collect(
            "fn f(x) { return x; }\n\
             fn f(x, y) { return x; }\n",
        );
        assert_eq!(
            groups,
            vec![("f/1".to_string(), 1), ("f/2".to_string(), 1)]
        );
    }

    #[test]
    fn parameter_type_signature_splits_families() {
        let groups = collect(
            "fn parse(s: str) { return s; }\n\
             fn parse(n: int) { return n; }\n",
        );
        assert_eq!(
            groups,
            vec![("parse/1".to_string(), 1), ("parse/1".to_string(), 1)]
        );
    }

    #[test]
    fn class_methods_group_under_their_owner() {
        let groups = collect(
            "fn sign(x) { return x; }\n\
             class Math {\n\
               fn sign(x | x < 0) { return 0 - 1; }\n\
               fn sign(x) { return 1; }\n\
             }\n",
        );
        assert_eq!(
            groups,
            vec![("sign/1".to_string(), 1), ("Math.sign/1".to_string(), 2)]
        );
    }

    #[test]
    fn members_keep_source_order_within_a_group() {
        let module = parse_module(
            "fn pick(x | x < 0) { return 0; }\n\
             fn pick(x | x > 5) { return 1; }\n\
             fn pick(x) { return 2; }\n",
        )
        .expect("parses")
        .module;
        let mut collector = OverloadCollector::default();
        collector.collect_module(&module);
        let group = &collector.groups()[0];
        let guards: Vec<bool> = group
            .members
            .iter()
            .map(|decl| decl.has_guards())
            .collect();
        assert_eq!(guards, vec![true, true, false]);
    }

    #[test]
    fn reset_clears_accumulated_groups() {
        let module = parse_module("fn f(x) { return x; }")
            .expect("parses")
            .module;
        let mut collector = OverloadCollector::default();
        collector.collect_module(&module);
        assert_eq!(collector.groups().len(), 1);
        collector.reset();
        assert!(collector.groups().is_empty());
        collector.collect_module(&module);
        assert_eq!(collector.groups().len(), 1);
    }
}
