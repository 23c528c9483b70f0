#![deny(warnings)]
#![deny(clippy::all, clippy::pedantic, clippy::perf, clippy::suspicious)] // Catch correctness + perf + suspicious patterns early.
#![deny(clippy::unwrap_used, clippy::expect_used)]

//! Core library for the quill compiler front-end and language server.

pub mod cli;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod frontend;
pub mod guards;
pub mod logging;
pub mod lsp;
pub mod version;

pub use driver::{CheckReport, Driver};
pub use error::{Error, Result};
pub use guards::{GuardConfig, validate};
