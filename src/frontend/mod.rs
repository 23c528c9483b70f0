//! Front-end stages for quill sources: lexing, the syntax tree, and parsing.

pub mod ast;
pub mod lexer;
pub mod parser;
