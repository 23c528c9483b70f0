use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use crate::diagnostics::{Diagnostic, DiagnosticSink, FileCache, FileId, Span};
use crate::frontend::ast::{
    BinOp, Block, ClassDecl, Expr, ExprNode, FunctionDecl, Item, Literal, Module, Param, Stmt,
    TypeName, UnOp,
};
use crate::frontend::lexer::{Keyword, LexOutput, Token, TokenKind, lex_with_file};

/// Resulting AST and non-fatal diagnostics from parsing.
#[derive(Debug)]
pub struct ParseOutput {
    pub module: Module,
    pub diagnostics: Vec<Diagnostic>,
    pub file_id: FileId,
}

/// Fatal parse error preventing further analysis of the file.
#[derive(Debug)]
pub struct ParseError {
    message: String,
    diagnostics: Vec<Diagnostic>,
    files: FileCache,
}

impl ParseError {
    #[must_use]
    pub fn new(message: impl Into<String>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            message: message.into(),
            diagnostics,
            files: FileCache::default(),
        }
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn files(&self) -> &FileCache {
        &self.files
    }

    /// Attach the offending source so the error can render standalone.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        let mut files = FileCache::default();
        let file_id = files.add_file(path, source);
        for diagnostic in &mut self.diagnostics {
            if let Some(label) = diagnostic.primary_label.as_mut() {
                label.span = label.span.with_file(file_id);
            }
            for label in &mut diagnostic.secondary_labels {
                label.span = label.span.with_file(file_id);
            }
        }
        self.files = files;
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for ParseError {}

/// Parse a standalone source string.
///
/// # Errors
///
/// Returns a [`ParseError`] carrying every accumulated diagnostic when the
/// source contains a lexical or syntactic error.
pub fn parse_module(source: &str) -> Result<ParseOutput, ParseError> {
    parse_module_in_file(source, FileId::UNKNOWN)
}

/// Parse a source string whose spans should refer to `file_id`.
///
/// # Errors
///
/// Returns a [`ParseError`] carrying every accumulated diagnostic when the
/// source contains a lexical or syntactic error.
pub fn parse_module_in_file(source: &str, file_id: FileId) -> Result<ParseOutput, ParseError> {
    let LexOutput {
        tokens,
        diagnostics: mut all,
        file_id,
    } = lex_with_file(source, file_id);
    let significant: Vec<Token> = tokens
        .into_iter()
        .filter(|token| !token.kind.is_trivia())
        .collect();

    let mut parser = Parser::new(significant, file_id);
    let module = parser.run();
    all.extend(parser.finish());

    if let Some(first_error) = all.iter().find(|diagnostic| diagnostic.severity.is_error()) {
        let message = first_error.message.clone();
        return Err(ParseError::new(message, all));
    }
    Ok(ParseOutput {
        module,
        diagnostics: all,
        file_id,
    })
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    file_id: FileId,
    diagnostics: DiagnosticSink,
}

impl Parser {
    fn new(tokens: Vec<Token>, file_id: FileId) -> Self {
        Self {
            tokens,
            index: 0,
            file_id,
            diagnostics: DiagnosticSink::new("syntax"),
        }
    }

    fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics.into_vec()
    }

    fn run(&mut self) -> Module {
        let mut module = Module::default();
        while !self.is_at_end() {
            if let Some(item) = self.parse_item() {
                module.push_item(item);
            } else {
                self.recover_to_item_boundary();
            }
        }
        module
    }

    // ---- item grammar ----

    fn parse_item(&mut self) -> Option<Item> {
        if self.check_keyword(Keyword::Fn) {
            return self.parse_function().map(Item::Function);
        }
        if self.check_keyword(Keyword::Class) {
            return self.parse_class().map(Item::Class);
        }
        let span = self.current_span();
        let found = self.describe_current();
        self.push_error(format!("expected `fn` or `class`, found {found}"), span);
        None
    }

    fn parse_class(&mut self) -> Option<ClassDecl> {
        let start = self.current_span()?;
        self.advance();
        let name = self.consume_identifier("expected class name")?;
        self.expect_punctuation('{')?;
        let mut methods = Vec::new();
        while !self.check_punctuation('}') && !self.is_at_end() {
            if self.check_keyword(Keyword::Fn) {
                if let Some(method) = self.parse_function() {
                    methods.push(method);
                    continue;
                }
            } else {
                let span = self.current_span();
                let found = self.describe_current();
                self.push_error(format!("expected method or `}}`, found {found}"), span);
            }
            self.recover_inside_class();
        }
        let end = self.current_span().unwrap_or(start);
        self.expect_punctuation('}')?;
        Some(ClassDecl {
            name,
            methods,
            span: start.merge(end),
        })
    }

    fn parse_function(&mut self) -> Option<FunctionDecl> {
        let start = self.current_span()?;
        self.advance();
        let name = self.consume_identifier("expected function name")?;
        self.expect_punctuation('(')?;
        let params = self.parse_params()?;
        let return_type = if self.consume_operator("->") {
            Some(self.parse_type_name()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Some(FunctionDecl {
            name,
            params,
            return_type,
            body,
            span,
        })
    }

    fn parse_params(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();
        if self.consume_punctuation(')') {
            return Some(params);
        }
        loop {
            params.push(self.parse_param()?);
            if self.consume_punctuation(',') {
                continue;
            }
            self.expect_punctuation(')')?;
            return Some(params);
        }
    }

    fn parse_param(&mut self) -> Option<Param> {
        let start = self.current_span()?;
        let name = self.consume_identifier("expected parameter name")?;
        let ty = if self.consume_punctuation(':') {
            Some(self.parse_type_name()?)
        } else {
            None
        };
        let guard = if self.consume_punctuation('|') {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let end = self.previous_span().unwrap_or(start);
        Some(Param {
            name,
            ty,
            guard,
            span: start.merge(end),
        })
    }

    fn parse_type_name(&mut self) -> Option<TypeName> {
        let span = self.current_span();
        let name = self.consume_identifier("expected type name")?;
        Some(TypeName {
            name,
            span: span.unwrap_or(Span::new(0, 0)),
        })
    }

    // ---- statement grammar ----

    fn parse_block(&mut self) -> Option<Block> {
        let start = self.current_span()?;
        self.expect_punctuation('{')?;
        let mut statements = Vec::new();
        while !self.check_punctuation('}') && !self.is_at_end() {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            } else {
                self.recover_to_statement_boundary();
            }
        }
        let end = self.current_span().unwrap_or(start);
        self.expect_punctuation('}')?;
        Some(Block {
            statements,
            span: start.merge(end),
        })
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        if self.check_keyword(Keyword::Return) {
            let start = self.current_span()?;
            self.advance();
            let value = if self.check_punctuation(';') {
                None
            } else {
                Some(self.parse_expr()?)
            };
            let end = self.current_span().unwrap_or(start);
            self.expect_punctuation(';')?;
            return Some(Stmt::Return {
                value,
                span: start.merge(end),
            });
        }
        if self.check_keyword(Keyword::Let) {
            let start = self.current_span()?;
            self.advance();
            let name = self.consume_identifier("expected binding name")?;
            if !self.consume_operator("=") {
                let span = self.current_span();
                self.push_error("expected `=` in `let` binding", span);
                return None;
            }
            let value = self.parse_expr()?;
            let end = self.current_span().unwrap_or(start);
            self.expect_punctuation(';')?;
            return Some(Stmt::Let {
                name,
                value,
                span: start.merge(end),
            });
        }
        let expr = self.parse_expr()?;
        self.expect_punctuation(';')?;
        Some(Stmt::Expr(expr))
    }

    // ---- expression grammar, loosest binding first ----

    fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.match_keyword(Keyword::Or) {
            let right = self.parse_and()?;
            left = binary(BinOp::Or, left, right);
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_not()?;
        while self.match_keyword(Keyword::And) {
            let right = self.parse_not()?;
            left = binary(BinOp::And, left, right);
        }
        Some(left)
    }

    fn parse_not(&mut self) -> Option<Expr> {
        if self.check_keyword(Keyword::Not) {
            let span = self.current_span()?;
            self.advance();
            let operand = self.parse_not()?;
            let span = span.merge(operand.span);
            return Some(Expr {
                node: ExprNode::Unary {
                    op: UnOp::Not,
                    operand: Box::new(operand),
                },
                span,
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Option<Expr> {
        let left = self.parse_additive()?;
        let Some(op) = self.peek_comparison() else {
            return Some(left);
        };
        self.advance();
        let right = self.parse_additive()?;
        let mut expr = binary(op, left, right);
        // Comparisons do not chain; report but keep folding left so the rest
        // of the expression still parses.
        while let Some(op) = self.peek_comparison() {
            let span = self.current_span();
            self.push_error("comparison operators cannot be chained", span);
            self.advance();
            let right = self.parse_additive()?;
            expr = binary(op, expr, right);
        }
        Some(expr)
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = if self.check_operator("+") {
                BinOp::Add
            } else if self.check_operator("-") {
                BinOp::Sub
            } else {
                return Some(left);
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.check_operator("*") {
                BinOp::Mul
            } else if self.check_operator("/") {
                BinOp::Div
            } else if self.check_operator("%") {
                BinOp::Rem
            } else {
                return Some(left);
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        if self.check_operator("-") {
            let span = self.current_span()?;
            self.advance();
            let operand = self.parse_unary()?;
            let span = span.merge(operand.span);
            return Some(Expr {
                node: ExprNode::Unary {
                    op: UnOp::Neg,
                    operand: Box::new(operand),
                },
                span,
            });
        }
        self.parse_call()
    }

    fn parse_call(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        while self.check_punctuation('(') {
            self.advance();
            let mut args = Vec::new();
            if !self.check_punctuation(')') {
                loop {
                    args.push(self.parse_expr()?);
                    if !self.consume_punctuation(',') {
                        break;
                    }
                }
            }
            let end = self.current_span().unwrap_or(expr.span);
            self.expect_punctuation(')')?;
            let span = expr.span.merge(end);
            expr = Expr {
                node: ExprNode::Call {
                    callee: Box::new(expr),
                    args,
                },
                span,
            };
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Number { float } => {
                self.advance();
                let literal = self.parse_number_literal(&token, float);
                Some(Expr {
                    node: ExprNode::Literal(literal),
                    span: token.span,
                })
            }
            TokenKind::Str(value) => {
                self.advance();
                Some(Expr {
                    node: ExprNode::Literal(Literal::Str(value)),
                    span: token.span,
                })
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Some(Expr {
                    node: ExprNode::Literal(Literal::Bool(true)),
                    span: token.span,
                })
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Some(Expr {
                    node: ExprNode::Literal(Literal::Bool(false)),
                    span: token.span,
                })
            }
            TokenKind::Identifier => {
                self.advance();
                Some(Expr {
                    node: ExprNode::Identifier(token.lexeme),
                    span: token.span,
                })
            }
            TokenKind::Punctuation('(') => {
                self.advance();
                let inner = self.parse_expr()?;
                let end = self.current_span().unwrap_or(inner.span);
                self.expect_punctuation(')')?;
                Some(Expr {
                    span: token.span.merge(end),
                    node: ExprNode::Paren(Box::new(inner)),
                })
            }
            _ => {
                let found = self.describe_current();
                self.push_error(format!("expected expression, found {found}"), Some(token.span));
                None
            }
        }
    }

    fn parse_number_literal(&mut self, token: &Token, float: bool) -> Literal {
        if float {
            match token.lexeme.parse::<f64>() {
                Ok(value) => Literal::Float(value),
                Err(_) => {
                    self.push_error("invalid float literal", Some(token.span));
                    Literal::Float(0.0)
                }
            }
        } else {
            match token.lexeme.parse::<i64>() {
                Ok(value) => Literal::Int(value),
                Err(_) => {
                    self.push_error("integer literal out of range", Some(token.span));
                    Literal::Int(0)
                }
            }
        }
    }

    // ---- recovery ----

    fn recover_to_item_boundary(&mut self) {
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Keyword(Keyword::Fn | Keyword::Class) => return,
                TokenKind::Punctuation('}') => {
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn recover_inside_class(&mut self) {
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Keyword(Keyword::Fn) | TokenKind::Punctuation('}') => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn recover_to_statement_boundary(&mut self) {
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Punctuation(';') => {
                    self.advance();
                    return;
                }
                TokenKind::Punctuation('}') => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ---- cursor helpers ----

    fn is_at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek(), Some(token) if token.kind == TokenKind::Keyword(keyword))
    }

    fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check_punctuation(&self, expected: char) -> bool {
        matches!(self.peek(), Some(token) if token.kind == TokenKind::Punctuation(expected))
    }

    fn consume_punctuation(&mut self, expected: char) -> bool {
        if self.check_punctuation(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punctuation(&mut self, expected: char) -> Option<()> {
        if self.consume_punctuation(expected) {
            return Some(());
        }
        let span = self.current_span().or_else(|| self.previous_span());
        let found = self.describe_current();
        self.push_error(format!("expected `{expected}`, found {found}"), span);
        None
    }

    fn check_operator(&self, symbol: &'static str) -> bool {
        matches!(self.peek(), Some(token) if token.kind == TokenKind::Operator(symbol))
    }

    fn consume_operator(&mut self, symbol: &'static str) -> bool {
        if self.check_operator(symbol) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_comparison(&self) -> Option<BinOp> {
        self.peek().and_then(|token| match token.kind {
            TokenKind::Operator("==") => Some(BinOp::Eq),
            TokenKind::Operator("!=") => Some(BinOp::Ne),
            TokenKind::Operator("<") => Some(BinOp::Lt),
            TokenKind::Operator("<=") => Some(BinOp::Le),
            TokenKind::Operator(">") => Some(BinOp::Gt),
            TokenKind::Operator(">=") => Some(BinOp::Ge),
            _ => None,
        })
    }

    fn consume_identifier(&mut self, message: &str) -> Option<String> {
        if matches!(self.peek(), Some(token) if token.kind == TokenKind::Identifier) {
            return self.advance().map(|token| token.lexeme);
        }
        let span = self.current_span().or_else(|| self.previous_span());
        let found = self.describe_current();
        self.push_error(format!("{message}, found {found}"), span);
        None
    }

    fn current_span(&self) -> Option<Span> {
        self.peek().map(|token| token.span)
    }

    fn previous_span(&self) -> Option<Span> {
        self.index
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .map(|token| token.span)
    }

    fn describe_current(&self) -> String {
        match self.peek() {
            Some(token) => format!("`{}`", token.lexeme),
            None => "end of input".to_string(),
        }
    }

    fn push_error(&mut self, message: impl Into<String>, span: Option<Span>) {
        let span = span.map(|span| span.with_file(self.file_id));
        self.diagnostics.push_error(message, span);
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr {
        node: ExprNode::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Module {
        match parse_module(source) {
            Ok(output) => output.module,
            Err(err) => panic!("expected parse success, got: {err}"),
        }
    }

    fn first_function(module: &Module) -> &FunctionDecl {
        match &module.items[0] {
            Item::Function(decl) => decl,
            Item::Class(_) => panic!("expected function item"),
        }
    }

    #[test]
    fn parses_guarded_overload_set() {
        let module = parse_ok(
            "fn abs(x: int | x < 0) -> int { return 0 - x; }\n\
             fn abs(x: int) -> int { return x; }\n",
        );
        assert_eq!(module.items.len(), 2);
        let first = first_function(&module);
        assert_eq!(first.name, "abs");
        assert_eq!(first.arity(), 1);
        assert_eq!(first.signature(), "int");
        let guard = first.params[0].guard.as_ref().expect("guard parsed");
        assert!(matches!(
            guard.node,
            ExprNode::Binary { op: BinOp::Lt, .. }
        ));
        let second = match &module.items[1] {
            Item::Function(decl) => decl,
            Item::Class(_) => panic!("expected function"),
        };
        assert!(second.params[0].guard.is_none());
    }

    #[test]
    fn parses_conjunction_guard() {
        let module = parse_ok("fn clamp(x | x >= 0 and x < 10) { return x; }");
        let decl = first_function(&module);
        let guard = decl.params[0].guard.as_ref().expect("guard");
        let ExprNode::Binary { op, left, right } = &guard.node else {
            panic!("expected binary guard");
        };
        assert_eq!(*op, BinOp::And);
        assert!(matches!(left.node, ExprNode::Binary { op: BinOp::Ge, .. }));
        assert!(matches!(right.node, ExprNode::Binary { op: BinOp::Lt, .. }));
    }

    #[test]
    fn parses_class_methods_in_order() {
        let module = parse_ok(
            "class Math {\n\
               fn sign(x: int | x < 0) -> int { return 0 - 1; }\n\
               fn sign(x: int) -> int { return 1; }\n\
             }\n",
        );
        let Item::Class(class) = &module.items[0] else {
            panic!("expected class");
        };
        assert_eq!(class.name, "Math");
        assert_eq!(class.methods.len(), 2);
        assert_eq!(class.methods[0].name, "sign");
    }

    #[test]
    fn guard_may_reference_calls_and_disjunction() {
        let module = parse_ok("fn f(x | valid(x) or x > 10) { return x; }");
        let decl = first_function(&module);
        let guard = decl.params[0].guard.as_ref().expect("guard");
        assert!(matches!(guard.node, ExprNode::Binary { op: BinOp::Or, .. }));
    }

    #[test]
    fn reports_missing_semicolon() {
        let err = parse_module("fn f() { return 1 }").expect_err("missing semicolon");
        assert!(
            err.diagnostics()
                .iter()
                .any(|diag| diag.message.contains("expected `;`")),
            "got: {:?}",
            err.diagnostics()
        );
    }

    #[test]
    fn recovers_after_bad_item_and_parses_rest() {
        let err = parse_module("garbage tokens here\nfn ok() { return 1; }")
            .expect_err("leading garbage is an error");
        assert!(
            err.diagnostics()
                .iter()
                .any(|diag| diag.message.contains("expected `fn` or `class`")),
        );
        // Only the one boundary error: the trailing function still parses.
        assert_eq!(
            err.diagnostics()
                .iter()
                .filter(|diag| diag.severity.is_error())
                .count(),
            1
        );
    }

    #[test]
    fn rejects_chained_comparisons() {
        let err = parse_module("fn f(x | 0 < x < 10) { return x; }").expect_err("chained");
        assert!(
            err.diagnostics()
                .iter()
                .any(|diag| diag.message.contains("cannot be chained"))
        );
    }

    #[test]
    fn precedence_binds_and_tighter_than_or() {
        let module = parse_ok("fn f(x | x < 0 or x > 1 and x < 9) { return x; }");
        let guard = first_function(&module).params[0]
            .guard
            .as_ref()
            .expect("guard");
        let ExprNode::Binary { op, right, .. } = &guard.node else {
            panic!("expected or at root");
        };
        assert_eq!(*op, BinOp::Or);
        assert!(matches!(right.node, ExprNode::Binary { op: BinOp::And, .. }));
    }

    #[test]
    fn parenthesized_true_guard_survives_as_paren_node() {
        let module = parse_ok("fn f(x | (true)) { return x; }");
        let guard = first_function(&module).params[0]
            .guard
            .as_ref()
            .expect("guard");
        assert!(matches!(guard.node, ExprNode::Paren(_)));
        assert!(matches!(
            guard.unwrap_parens().node,
            ExprNode::Literal(Literal::Bool(true))
        ));
    }

    #[test]
    fn spans_carry_file_id() {
        let mut files = FileCache::default();
        let source = "fn f(x | x > 0) { return x; }";
        let file_id = files.add_file("spanned.ql", source);
        let output = parse_module_in_file(source, file_id).expect("parses");
        let decl = first_function(&output.module);
        assert_eq!(decl.span.file_id, file_id);
        let guard = decl.params[0].guard.as_ref().expect("guard");
        assert_eq!(guard.span.file_id, file_id);
        assert_eq!(&source[guard.span.start..guard.span.end], "x > 0");
    }
}
