//! Syntax tree produced by the parser and consumed by the guard validator.

use crate::diagnostics::Span;

/// A parsed compilation unit.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub items: Vec<Item>,
}

impl Module {
    pub fn push_item(&mut self, item: Item) {
        self.items.push(item);
    }

    /// All function declarations with their enclosing scope name, in
    /// declaration order. Top-level functions report an empty owner.
    pub fn functions(&self) -> impl Iterator<Item = (&str, &FunctionDecl)> {
        self.items.iter().flat_map(|item| match item {
            Item::Function(function) => {
                Box::new(std::iter::once(("", function)))
                    as Box<dyn Iterator<Item = (&str, &FunctionDecl)>>
            }
            Item::Class(class) => Box::new(
                class
                    .methods
                    .iter()
                    .map(move |method| (class.name.as_str(), method)),
            ),
        })
    }
}

#[derive(Debug, Clone)]
pub enum Item {
    Function(FunctionDecl),
    Class(ClassDecl),
}

/// `class Name { fn ... }`
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub methods: Vec<FunctionDecl>,
    pub span: Span,
}

/// A single function clause. Overloads are separate declarations sharing a
/// name; dispatch tries them in declaration order.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeName>,
    pub body: Block,
    pub span: Span,
}

impl FunctionDecl {
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Ordered parameter-type signature, `_` for untyped parameters.
    #[must_use]
    pub fn signature(&self) -> String {
        self.params
            .iter()
            .map(|param| param.ty.as_ref().map_or("_", |ty| ty.name.as_str()))
            .collect::<Vec<_>>()
            .join(",")
    }

    #[must_use]
    pub fn has_guards(&self) -> bool {
        self.params.iter().any(|param| param.guard.is_some())
    }
}

#[derive(Debug, Clone)]
pub struct TypeName {
    pub name: String,
    pub span: Span,
}

/// `name: type | guard`; type and guard are both optional.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeName>,
    pub guard: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Let {
        name: String,
        value: Expr,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub node: ExprNode,
    pub span: Span,
}

impl Expr {
    /// Strip any number of enclosing parentheses.
    #[must_use]
    pub fn unwrap_parens(&self) -> &Expr {
        let mut current = self;
        while let ExprNode::Paren(inner) = &current.node {
            current = inner;
        }
        current
    }
}

#[derive(Debug, Clone)]
pub enum ExprNode {
    Literal(Literal),
    Identifier(String),
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Paren(Box<Expr>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Literal {
    /// Numeric value on the shared int/float axis; booleans map onto {0, 1}.
    #[must_use]
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Literal::Int(value) => Some(*value as f64),
            Literal::Float(value) => Some(*value),
            Literal::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            Literal::Str(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}
