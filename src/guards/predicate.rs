//! Guard classification and normalization.
//!
//! Every overload's guard is folded into one of three shapes before coverage
//! analysis runs: `Base` (matches everything), `Analyzable` (a conjunction of
//! atomic comparisons against literals), or `Unknown` (anything the interval
//! model cannot express, treated as opaque).

use crate::frontend::ast::{BinOp, Expr, ExprNode, FunctionDecl, Literal, Param, UnOp};
use crate::guards::interval::Interval;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PredicateType {
    Base,
    Analyzable,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AtomOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl AtomOp {
    fn from_bin(op: BinOp) -> Option<Self> {
        match op {
            BinOp::Eq => Some(Self::Eq),
            BinOp::Lt => Some(Self::Lt),
            BinOp::Le => Some(Self::Le),
            BinOp::Gt => Some(Self::Gt),
            BinOp::Ge => Some(Self::Ge),
            _ => None,
        }
    }

    /// Mirror the comparison for a literal-first spelling (`5 < x` is `x > 5`).
    fn flipped(self) -> Self {
        match self {
            Self::Eq => Self::Eq,
            Self::Lt => Self::Gt,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Ge => Self::Le,
        }
    }
}

/// One comparison of a parameter against a literal value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Atom {
    pub param: usize,
    pub op: AtomOp,
    pub value: f64,
}

impl Atom {
    pub(crate) fn interval(&self) -> Interval {
        match self.op {
            AtomOp::Eq => Interval::point(self.value),
            AtomOp::Lt => Interval::less_than(self.value),
            AtomOp::Le => Interval::at_most(self.value),
            AtomOp::Gt => Interval::greater_than(self.value),
            AtomOp::Ge => Interval::at_least(self.value),
        }
    }
}

/// Normalized view of one overload's guards.
#[derive(Clone, Debug)]
pub(crate) struct PredicateDescriptor {
    pub kind: PredicateType,
    pub atoms: Vec<Atom>,
}

impl PredicateDescriptor {
    /// Canonical descriptor for overloads that always match.
    pub(crate) const fn always() -> Self {
        Self {
            kind: PredicateType::Base,
            atoms: Vec::new(),
        }
    }

    /// Canonical descriptor for guards the analysis cannot see through.
    pub(crate) const fn unknown() -> Self {
        Self {
            kind: PredicateType::Unknown,
            atoms: Vec::new(),
        }
    }

    fn analyzable(atoms: Vec<Atom>) -> Self {
        Self {
            kind: PredicateType::Analyzable,
            atoms,
        }
    }
}

/// Classify an overload's guards.
///
/// No guards at all, or a single bare/parenthesized literal `true`, count as
/// base. Conjunctions of atomic comparisons become analyzable atoms; every
/// other shape (disjunction, negation, calls, `!=`, non-literal operands)
/// degrades to `Unknown` rather than failing.
pub(crate) fn classify(decl: &FunctionDecl) -> PredicateDescriptor {
    let guards: Vec<&Expr> = decl
        .params
        .iter()
        .filter_map(|param| param.guard.as_ref())
        .collect();
    if guards.is_empty() {
        return PredicateDescriptor::always();
    }
    if let [only] = guards.as_slice() {
        // Tautology detection is deliberately this narrow; no constant
        // folding beyond the literal itself.
        if is_literal_true(only) {
            return PredicateDescriptor::always();
        }
    }
    let mut atoms = Vec::new();
    for guard in guards {
        if !collect_atoms(guard, &decl.params, &mut atoms) {
            return PredicateDescriptor::unknown();
        }
    }
    PredicateDescriptor::analyzable(atoms)
}

fn is_literal_true(expr: &Expr) -> bool {
    matches!(
        expr.unwrap_parens().node,
        ExprNode::Literal(Literal::Bool(true))
    )
}

fn collect_atoms(expr: &Expr, params: &[Param], out: &mut Vec<Atom>) -> bool {
    let expr = expr.unwrap_parens();
    match &expr.node {
        ExprNode::Binary {
            op: BinOp::And,
            left,
            right,
        } => collect_atoms(left, params, out) && collect_atoms(right, params, out),
        ExprNode::Binary { op, left, right } => {
            match atom_from_comparison(*op, left, right, params) {
                Some(atom) => {
                    out.push(atom);
                    true
                }
                None => false,
            }
        }
        _ => false,
    }
}

fn atom_from_comparison(op: BinOp, left: &Expr, right: &Expr, params: &[Param]) -> Option<Atom> {
    let op = AtomOp::from_bin(op)?;
    if let (Some(param), Some(value)) = (param_index(left, params), literal_value(right)) {
        return Some(Atom { param, op, value });
    }
    if let (Some(value), Some(param)) = (literal_value(left), param_index(right, params)) {
        return Some(Atom {
            param,
            op: op.flipped(),
            value,
        });
    }
    None
}

fn param_index(expr: &Expr, params: &[Param]) -> Option<usize> {
    match &expr.unwrap_parens().node {
        ExprNode::Identifier(name) => params.iter().position(|param| param.name == *name),
        _ => None,
    }
}

fn literal_value(expr: &Expr) -> Option<f64> {
    match &expr.unwrap_parens().node {
        ExprNode::Literal(literal) => literal.numeric_value(),
        ExprNode::Unary {
            op: UnOp::Neg,
            operand,
        } => literal_value(operand).map(|value| -value),
        _ => None,
    }
}
