use crate::diagnostics::{Diagnostic, DiagnosticSink, FileId, Span};

pub use keyword::Keyword;
pub use token::{Token, TokenKind};

mod keyword {
    use super::TokenKind;

    /// Reserved keywords recognised by the lexer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Keyword {
        Fn,
        Class,
        Let,
        Return,
        True,
        False,
        And,
        Or,
        Not,
    }

    impl Keyword {
        #[must_use]
        pub fn from_ident(ident: &str) -> Option<Self> {
            KEYWORDS
                .iter()
                .find_map(|(name, keyword)| (*name == ident).then_some(*keyword))
        }

        #[must_use]
        pub fn token_kind(self) -> TokenKind {
            TokenKind::Keyword(self)
        }
    }

    const KEYWORDS: &[(&str, Keyword)] = &[
        ("fn", Keyword::Fn),
        ("class", Keyword::Class),
        ("let", Keyword::Let),
        ("return", Keyword::Return),
        ("true", Keyword::True),
        ("false", Keyword::False),
        ("and", Keyword::And),
        ("or", Keyword::Or),
        ("not", Keyword::Not),
    ];
}

mod token {
    use super::keyword::Keyword;

    /// Token emitted by the lexer.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Token {
        pub kind: TokenKind,
        pub lexeme: String,
        pub span: super::Span,
    }

    /// Token categories understood by the parser.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum TokenKind {
        Identifier,
        /// Numeric literal; `float` records whether a fraction or exponent
        /// was present. The value is parsed from the lexeme later.
        Number {
            float: bool,
        },
        /// String literal carrying its unescaped value.
        Str(String),
        Keyword(Keyword),
        Punctuation(char),
        Operator(&'static str),
        Comment,
        Whitespace,
        Unknown(char),
    }

    impl TokenKind {
        /// Trivia tokens are dropped before parsing.
        #[must_use]
        pub fn is_trivia(&self) -> bool {
            matches!(self, TokenKind::Comment | TokenKind::Whitespace)
        }
    }
}

/// Result of lexing a source string.
#[derive(Debug, Default)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
    pub file_id: FileId,
}

/// Lex an entire source string.
#[must_use]
pub fn lex(source: &str) -> LexOutput {
    lex_with_file(source, FileId::UNKNOWN)
}

/// Lex an entire source string with a known file id.
#[must_use]
pub fn lex_with_file(source: &str, file_id: FileId) -> LexOutput {
    let mut lexer = Lexer::new(source, file_id);
    lexer.lex_all();
    lexer.finish()
}

struct Lexer<'a> {
    source: &'a str,
    iter: core::str::CharIndices<'a>,
    lookahead: Option<(usize, char)>,
    tokens: Vec<Token>,
    diagnostics: DiagnosticSink,
    file_id: FileId,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, file_id: FileId) -> Self {
        let mut iter = source.char_indices();
        let lookahead = iter.next();
        Self {
            source,
            iter,
            lookahead,
            tokens: Vec::new(),
            diagnostics: DiagnosticSink::new("syntax"),
            file_id,
        }
    }

    fn finish(self) -> LexOutput {
        let Lexer {
            tokens,
            diagnostics,
            file_id,
            ..
        } = self;
        LexOutput {
            tokens,
            diagnostics: diagnostics.into_vec(),
            file_id,
        }
    }

    fn lex_all(&mut self) {
        while let Some((start, ch)) = self.lookahead {
            match ch {
                c if c.is_ascii_whitespace() => self.consume_whitespace(start),
                c if is_identifier_start(c) => self.consume_identifier(start),
                c if c.is_ascii_digit() => self.consume_number(start),
                '"' => self.consume_string(start),
                '/' => self.consume_slash(start),
                '(' | ')' | '{' | '}' | ',' | ';' | ':' | '|' => {
                    self.bump();
                    self.emit(start, self.offset(), TokenKind::Punctuation(ch));
                }
                '-' => {
                    self.bump();
                    if self.eat('>') {
                        self.emit(start, self.offset(), TokenKind::Operator("->"));
                    } else {
                        self.emit(start, self.offset(), TokenKind::Operator("-"));
                    }
                }
                '=' => {
                    self.bump();
                    if self.eat('=') {
                        self.emit(start, self.offset(), TokenKind::Operator("=="));
                    } else {
                        self.emit(start, self.offset(), TokenKind::Operator("="));
                    }
                }
                '<' => {
                    self.bump();
                    if self.eat('=') {
                        self.emit(start, self.offset(), TokenKind::Operator("<="));
                    } else {
                        self.emit(start, self.offset(), TokenKind::Operator("<"));
                    }
                }
                '>' => {
                    self.bump();
                    if self.eat('=') {
                        self.emit(start, self.offset(), TokenKind::Operator(">="));
                    } else {
                        self.emit(start, self.offset(), TokenKind::Operator(">"));
                    }
                }
                '!' => {
                    self.bump();
                    if self.eat('=') {
                        self.emit(start, self.offset(), TokenKind::Operator("!="));
                    } else {
                        self.diagnostics.push_error(
                            "unexpected `!`; negation is spelled `not`",
                            self.span(start, self.offset()),
                        );
                        self.emit(start, self.offset(), TokenKind::Unknown('!'));
                    }
                }
                '+' | '*' | '%' => {
                    self.bump();
                    let symbol = match ch {
                        '+' => "+",
                        '*' => "*",
                        _ => "%",
                    };
                    self.emit(start, self.offset(), TokenKind::Operator(symbol));
                }
                other => {
                    self.bump();
                    self.diagnostics.push_error(
                        format!("unexpected character `{other}`"),
                        self.span(start, self.offset()),
                    );
                    self.emit(start, self.offset(), TokenKind::Unknown(other));
                }
            }
        }
    }

    fn consume_whitespace(&mut self, start: usize) {
        while matches!(self.lookahead, Some((_, c)) if c.is_ascii_whitespace()) {
            self.bump();
        }
        self.emit(start, self.offset(), TokenKind::Whitespace);
    }

    fn consume_identifier(&mut self, start: usize) {
        while matches!(self.lookahead, Some((_, c)) if is_identifier_continue(c)) {
            self.bump();
        }
        let end = self.offset();
        let text = &self.source[start..end];
        let kind = Keyword::from_ident(text).map_or(TokenKind::Identifier, Keyword::token_kind);
        self.emit(start, end, kind);
    }

    fn consume_number(&mut self, start: usize) {
        let mut float = false;
        self.eat_digits();
        // A fraction needs a digit after the dot; a bare trailing dot is left
        // for the main loop to reject.
        if matches!(self.lookahead, Some((_, '.'))) && self.peek_second_is_digit() {
            float = true;
            self.bump();
            self.eat_digits();
        }
        if matches!(self.lookahead, Some((_, 'e' | 'E'))) {
            let exponent_ok = match self.peek_second() {
                Some('+' | '-') => self.peek_third().is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_ok {
                float = true;
                self.bump();
                if matches!(self.lookahead, Some((_, '+' | '-'))) {
                    self.bump();
                }
                self.eat_digits();
            }
        }
        self.emit(start, self.offset(), TokenKind::Number { float });
    }

    fn consume_string(&mut self, start: usize) {
        self.bump();
        let mut value = String::new();
        loop {
            match self.lookahead {
                None => {
                    self.diagnostics
                        .push_error("unterminated string literal", self.span(start, self.offset()));
                    break;
                }
                Some((_, '\n')) => {
                    self.diagnostics
                        .push_error("unterminated string literal", self.span(start, self.offset()));
                    break;
                }
                Some((_, '"')) => {
                    self.bump();
                    break;
                }
                Some((escape_start, '\\')) => {
                    self.bump();
                    match self.lookahead {
                        Some((_, 'n')) => value.push('\n'),
                        Some((_, 't')) => value.push('\t'),
                        Some((_, 'r')) => value.push('\r'),
                        Some((_, '0')) => value.push('\0'),
                        Some((_, '\\')) => value.push('\\'),
                        Some((_, '"')) => value.push('"'),
                        Some((_, other)) => {
                            self.diagnostics.push_error(
                                format!("unknown escape `\\{other}`"),
                                self.span(escape_start, escape_start + 1 + other.len_utf8()),
                            );
                            value.push(other);
                        }
                        None => continue,
                    }
                    self.bump();
                }
                Some((_, c)) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
        self.emit(start, self.offset(), TokenKind::Str(value));
    }

    fn consume_slash(&mut self, start: usize) {
        self.bump();
        match self.lookahead {
            Some((_, '/')) => {
                while !matches!(self.lookahead, None | Some((_, '\n'))) {
                    self.bump();
                }
                self.emit(start, self.offset(), TokenKind::Comment);
            }
            Some((_, '*')) => {
                self.bump();
                let mut closed = false;
                while let Some((_, c)) = self.lookahead {
                    self.bump();
                    if c == '*' && matches!(self.lookahead, Some((_, '/'))) {
                        self.bump();
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    self.diagnostics
                        .push_error("unterminated block comment", self.span(start, self.offset()));
                }
                self.emit(start, self.offset(), TokenKind::Comment);
            }
            _ => self.emit(start, self.offset(), TokenKind::Operator("/")),
        }
    }

    fn eat_digits(&mut self) {
        while matches!(self.lookahead, Some((_, c)) if c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn bump(&mut self) {
        self.lookahead = self.iter.next();
    }

    fn eat(&mut self, expected: char) -> bool {
        if matches!(self.lookahead, Some((_, c)) if c == expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Byte offset just past the most recently consumed character.
    fn offset(&self) -> usize {
        self.lookahead
            .map_or(self.source.len(), |(idx, _)| idx)
    }

    fn peek_second(&self) -> Option<char> {
        self.iter.clone().next().map(|(_, c)| c)
    }

    fn peek_second_is_digit(&self) -> bool {
        self.peek_second().is_some_and(|c| c.is_ascii_digit())
    }

    fn peek_third(&self) -> Option<char> {
        self.iter.clone().nth(1).map(|(_, c)| c)
    }

    fn span(&self, start: usize, end: usize) -> Option<Span> {
        Some(Span::in_file(self.file_id, start, end))
    }

    fn emit(&mut self, start: usize, end: usize, kind: TokenKind) {
        self.tokens.push(Token {
            kind,
            lexeme: self.source[start..end].to_string(),
            span: Span::in_file(self.file_id, start, end),
        });
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_identifier_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}
